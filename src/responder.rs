//! Packet router and command responder.
//!
//! [`Responder::handle`] is the single entry point the radio loop calls for every
//! inbound packet. Text messages are parsed with [`crate::command::extract`] and
//! answered through a [`MessageSink`]; all other categories are only logged.
//!
//! | Command              | Reply                                                   |
//! |----------------------|---------------------------------------------------------|
//! | `Distance: lat, lon` | `Distance: 1234 meter`                                  |
//! | `Signal:`            | `Received RSSI: -85.3dBm Received SNR: 4.12dB`          |
//! | `Time:`              | `2024-05-01 13:37` (local time)                         |
//! | anything else        | the received text, unchanged                            |
//!
//! `handle` never fails: problems with a single packet are logged at warn level
//! and the caller moves on to the next packet.
use crate::command::{extract, Command, CommandKind};
use crate::geo::{self, ReferencePoint};
use crate::logutil::{escape_log, preview};
use crate::packet::{InboundPacket, NodeDetails, Payload, PacketCategory, PositionReport, RadioMetrics};
use anyhow::Result;
use chrono::{DateTime, Local};
use log::{debug, info, warn};
use thiserror::Error;

/// Shown in place of a metric or distance that is not available.
pub const PLACEHOLDER: &str = "--.--";

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Outbound text delivery.
pub trait MessageSink {
    fn send(&mut self, destination: &str, text: &str) -> Result<()>;
}

/// A reply addressed to the node that sent the command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub destination: String,
    pub text: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum HandleError {
    #[error("text message from {0} has no text payload")]
    MissingText(String),
}

pub struct Responder {
    reference: ReferencePoint,
    clock: fn() -> DateTime<Local>,
}

impl Responder {
    pub fn new(reference: ReferencePoint) -> Self {
        Self {
            reference,
            clock: Local::now,
        }
    }

    /// Replace the wall clock used for `Time:` replies.
    pub fn with_clock(mut self, clock: fn() -> DateTime<Local>) -> Self {
        self.clock = clock;
        self
    }

    /// Route one packet, sending at most one reply through `sink`.
    pub fn handle(&self, packet: &InboundPacket, sink: &mut dyn MessageSink) {
        let reply = match self.respond(packet) {
            Ok(Some(reply)) => reply,
            Ok(None) => return,
            Err(e) => {
                warn!("Dropping packet from {}: {}", packet.sender, e);
                return;
            }
        };
        info!(
            "Sending message to {}: {}",
            reply.destination,
            escape_log(&reply.text)
        );
        if let Err(e) = sink.send(&reply.destination, &reply.text) {
            warn!("Failed to send reply to {}: {}", reply.destination, e);
        }
    }

    /// Compute the reply for `packet` without sending it.
    pub fn respond(&self, packet: &InboundPacket) -> Result<Option<Reply>, HandleError> {
        match packet.category {
            PacketCategory::TextMessage => {
                let text = packet
                    .text_payload()
                    .ok_or_else(|| HandleError::MissingText(packet.sender.clone()))?;
                info!(
                    "Text from {}: '{}' (rssi={:?} snr={:?})",
                    packet.sender,
                    preview(text, 120),
                    packet.metrics.rssi,
                    packet.metrics.snr
                );
                let command = extract(text);
                if command.is_none() {
                    debug!("No command in message from {}; echoing", packet.sender);
                } else {
                    debug!("Extracted {:?}", command);
                }
                Ok(Some(Reply {
                    destination: packet.sender.clone(),
                    text: self.reply_text(&command, text, &packet.metrics),
                }))
            }
            PacketCategory::Position => {
                match &packet.payload {
                    Some(Payload::Position(pos)) => log_position(&packet.sender, pos),
                    _ => warn!("Position packet from {} without position fields", packet.sender),
                }
                Ok(None)
            }
            PacketCategory::NodeInfo => {
                match &packet.payload {
                    Some(Payload::NodeInfo(node)) => log_node_info(&packet.sender, node),
                    _ => warn!("Node info packet from {} without user fields", packet.sender),
                }
                Ok(None)
            }
            PacketCategory::Telemetry | PacketCategory::Alert | PacketCategory::Other => {
                info!("Unhandled {} packet from {}", packet.category, packet.sender);
                Ok(None)
            }
        }
    }

    fn reply_text(&self, command: &Command, received: &str, metrics: &RadioMetrics) -> String {
        match command.kind() {
            CommandKind::Distance => self.distance_reply(command),
            CommandKind::Signal => signal_reply(metrics),
            CommandKind::Time => (self.clock)().format(TIME_FORMAT).to_string(),
            CommandKind::Echo => received.to_string(),
        }
    }

    fn distance_reply(&self, command: &Command) -> String {
        let Some(point) = command.coordinates else {
            warn!("Distance requested without coordinates");
            return format!("Distance: {} meter", PLACEHOLDER);
        };
        match geo::distance(&self.reference, point) {
            Ok(meters) => format!("Distance: {} meter", meters.round() as i64),
            Err(e) => {
                warn!(
                    "Distance calculation failed for {:.6},{:.6}: {}",
                    point.latitude, point.longitude, e
                );
                format!("Distance: {} meter", PLACEHOLDER)
            }
        }
    }
}

/// `Received RSSI: {rssi}dBm Received SNR: {snr}dB`, with each value rounded to
/// two decimals and missing values shown as `--.-- `.
pub fn signal_reply(metrics: &RadioMetrics) -> String {
    format!(
        "Received RSSI: {}dBm Received SNR: {}dB",
        metric_field(metrics.rssi),
        metric_field(metrics.snr)
    )
}

fn metric_field(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => round2(v).to_string(),
        _ => format!("{} ", PLACEHOLDER),
    }
}

fn round2(v: f64) -> f64 {
    let r = (v * 100.0).round() / 100.0;
    // avoid rendering "-0"
    if r == 0.0 {
        0.0
    } else {
        r
    }
}

fn log_position(sender: &str, pos: &PositionReport) {
    info!(
        "Position from {}: lat={} lon={} alt={} speed={} track={}",
        sender,
        opt(pos.latitude.map(|v| format!("{:.7}", v))),
        opt(pos.longitude.map(|v| format!("{:.7}", v))),
        opt(pos.altitude),
        opt(pos.ground_speed),
        opt(pos.ground_track)
    );
}

fn log_node_info(sender: &str, node: &NodeDetails) {
    info!(
        "Node info from {}: long_name='{}' short_name='{}' hw_model={}",
        sender,
        escape_log(&node.long_name),
        escape_log(&node.short_name),
        node.hardware_model
    );
}

fn opt<T: ToString>(v: Option<T>) -> String {
    v.map(|x| x.to_string()).unwrap_or_else(|| "na".to_string())
}
