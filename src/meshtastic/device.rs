//! Serial connection to a Meshtastic node.
use super::framer::{encode_frame, StreamFramer};
use super::proto::{self, to_radio::PayloadVariant as TRPayload, ToRadio};
use super::{decode_from_radio, encode_text_packet, parse_node_id, RadioEvent};
use crate::logutil::{escape_log, hex_snippet, preview};
use crate::packet::InboundPacket;
use crate::responder::MessageSink;
use anyhow::{anyhow, Context, Result};
use log::{debug, info, trace, warn};
use prost::Message;
use serialport::SerialPort;
use std::io::{Read, Write};
use std::time::{Duration, Instant};

/// Resend `want_config` if the node has not finished its config dump by then.
const WANT_CONFIG_RETRY: Duration = Duration::from_secs(7);

/// Represents a connection to a Meshtastic device
pub struct MeshtasticDevice {
    port_name: String,
    port: Box<dyn SerialPort>,
    framer: StreamFramer,
    channel: u32,
    our_node_id: Option<u32>,
    config_request_id: Option<u32>,
    config_complete: bool,
    last_want_config_sent: Option<Instant>,
}

impl MeshtasticDevice {
    /// Open the serial port and wake the node.
    pub async fn open(port_name: &str, baud_rate: u32, channel: u32) -> Result<Self> {
        info!(
            "Initializing Meshtastic device on {} at {} baud",
            port_name, baud_rate
        );
        let mut builder =
            serialport::new(port_name, baud_rate).timeout(Duration::from_millis(50));
        #[cfg(unix)]
        {
            builder = builder
                .data_bits(serialport::DataBits::Eight)
                .stop_bits(serialport::StopBits::One)
                .parity(serialport::Parity::None);
        }
        let mut port = builder
            .open()
            .with_context(|| format!("Failed to open serial port {}", port_name))?;
        // Toggle DTR/RTS to ensure ESP32 based boards wake up
        let _ = port.write_data_terminal_ready(true);
        let _ = port.write_request_to_send(true);
        tokio::time::sleep(Duration::from_millis(150)).await;
        // Drop buffered boot text
        let _ = port.clear(serialport::ClearBuffer::Input);
        debug!("Serial port {} initialized", port_name);

        Ok(Self {
            port_name: port_name.to_string(),
            port,
            framer: StreamFramer::new(),
            channel,
            our_node_id: None,
            config_request_id: None,
            config_complete: false,
            last_want_config_sent: None,
        })
    }

    pub fn port_name(&self) -> &str {
        &self.port_name
    }

    /// Ask the node for its config dump; resent periodically until it completes.
    pub fn ensure_want_config(&mut self) -> Result<()> {
        let id = match self.config_request_id {
            Some(id) => {
                if self.config_complete {
                    return Ok(());
                }
                match self.last_want_config_sent {
                    Some(last) if last.elapsed() < WANT_CONFIG_RETRY => return Ok(()),
                    _ => id,
                }
            }
            None => {
                let id = rand::random::<u32>().max(1);
                self.config_request_id = Some(id);
                debug!("Generated config_request_id=0x{:08x}", id);
                id
            }
        };
        self.last_want_config_sent = Some(Instant::now());
        self.send_toradio(ToRadio {
            payload_variant: Some(TRPayload::WantConfigId(id)),
        })
    }

    /// Keep the serial API session alive.
    pub fn send_heartbeat(&mut self) -> Result<()> {
        let nonce = rand::random::<u32>() & 0xffff;
        self.send_toradio(ToRadio {
            payload_variant: Some(TRPayload::Heartbeat(proto::Heartbeat { nonce })),
        })
    }

    /// Read whatever the node has sent and return the decoded packets.
    ///
    /// Read timeouts are normal and yield an empty list.
    pub fn poll_packets(&mut self) -> Result<Vec<InboundPacket>> {
        let mut buffer = [0u8; 1024];
        match self.port.read(&mut buffer) {
            Ok(0) => return Ok(Vec::new()),
            Ok(n) => {
                trace!("RAW {} bytes: {}", n, hex_snippet(&buffer[..n], 64));
                self.framer.push(&buffer[..n]);
            }
            Err(e) if e.kind() == std::io::ErrorKind::TimedOut => return Ok(Vec::new()),
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {
                debug!("Serial read interrupted (EINTR), likely shutdown in progress");
                return Ok(Vec::new());
            }
            Err(e) => return Err(anyhow!("Serial read error: {}", e)),
        }

        let mut packets = Vec::new();
        for frame in self.framer.frames() {
            match decode_from_radio(&frame) {
                Ok(RadioEvent::Packet(p)) => packets.push(p),
                Ok(RadioEvent::MyNodeNum(num)) => {
                    if self.our_node_id.is_none() {
                        info!("Connected node is {}", super::format_node_id(num));
                    }
                    self.our_node_id = Some(num);
                }
                Ok(RadioEvent::NodeDb { num, long_name }) => {
                    debug!(
                        "Node DB entry {} '{}'",
                        super::format_node_id(num),
                        escape_log(&long_name)
                    );
                }
                Ok(RadioEvent::ConfigComplete(id)) => {
                    if self.config_request_id == Some(id) {
                        self.config_complete = true;
                        info!("Connected to Meshtastic device.");
                    }
                }
                Ok(RadioEvent::Rebooted) => {
                    warn!("Node rebooted; requesting config again");
                    self.config_complete = false;
                    self.last_want_config_sent = None;
                }
                Ok(RadioEvent::Ignored) => {}
                Err(e) => debug!("{} (frame {})", e, hex_snippet(&frame, 16)),
            }
        }
        Ok(packets)
    }

    /// Send a text message to `to` (a node number) on the configured channel.
    pub fn send_text_packet(&mut self, to: u32, text: &str) -> Result<()> {
        let id = rand::random::<u32>().max(1);
        let payload = encode_text_packet(self.our_node_id.unwrap_or(0), to, self.channel, id, text);
        self.write_frame(&payload)?;
        debug!(
            "Sent TextPacket to=0x{:08x} channel={} id={} text='{}'",
            to,
            self.channel,
            id,
            preview(text, 80)
        );
        Ok(())
    }

    fn send_toradio(&mut self, msg: ToRadio) -> Result<()> {
        let payload = msg.encode_to_vec();
        self.write_frame(&payload)?;
        debug!("Sent ToRadio frame ({} bytes payload)", payload.len());
        Ok(())
    }

    fn write_frame(&mut self, payload: &[u8]) -> Result<()> {
        let frame = encode_frame(payload)?;
        self.port
            .write_all(&frame)
            .map_err(|e| anyhow!("Failed to write to serial port: {}", e))?;
        self.port
            .flush()
            .map_err(|e| anyhow!("Failed to flush serial port: {}", e))?;
        Ok(())
    }
}

impl MessageSink for MeshtasticDevice {
    fn send(&mut self, destination: &str, text: &str) -> Result<()> {
        let to = parse_node_id(destination)
            .ok_or_else(|| anyhow!("Invalid destination node id '{}'", destination))?;
        self.send_text_packet(to, text)
    }
}
