//! # Meshtastic Device Communication Module
//!
//! Talks to a Meshtastic node over its wired serial API and converts what the
//! radio reports into [`InboundPacket`] values for the responder.
//!
//! ## Features
//!
//! - **Serial Communication**: Connect to Meshtastic devices via USB/UART (`serial` feature)
//! - **Framing**: `0x94 0xC3` length-prefixed protobuf frames, see [`framer`]
//! - **Packet Conversion**: `MeshPacket` to [`InboundPacket`] at the boundary, see [`packet_from_mesh`]
//! - **Replies**: [`MeshtasticDevice`] implements [`MessageSink`] by sending text `MeshPacket`s
//!
//! ## Configuration
//!
//! ```toml
//! [meshtastic]
//! port = "/dev/ttyUSB0"
//! baud_rate = 115200
//! channel = 0
//! heartbeat_interval_secs = 300
//! ```

pub mod framer;
pub mod proto;

use crate::packet::{
    InboundPacket, NodeDetails, PacketCategory, Payload, PositionReport, RadioMetrics,
};
use anyhow::{anyhow, Result};
use bytes::Bytes;
use prost::Message;
use proto::from_radio::PayloadVariant as FRPayload;
use proto::mesh_packet::PayloadVariant as MPPayload;
use proto::{FromRadio, HardwareModel, MeshPacket, PortNum};

/// Destination address meaning "every node".
pub const BROADCAST_ADDR: u32 = 0xffff_ffff;

/// Render a node number the way Meshtastic clients do (`!1a2b3c4d`).
pub fn format_node_id(num: u32) -> String {
    format!("!{:08x}", num)
}

/// Parse `!1a2b3c4d`, `0x1a2b3c4d` or a decimal node number.
pub fn parse_node_id(s: &str) -> Option<u32> {
    let s = s.trim();
    if let Some(hex) = s.strip_prefix('!') {
        return u32::from_str_radix(hex, 16).ok();
    }
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        return u32::from_str_radix(hex, 16).ok();
    }
    s.parse::<u32>().ok()
}

/// What one `FromRadio` frame means to the bot.
#[derive(Debug, Clone, PartialEq)]
pub enum RadioEvent {
    Packet(InboundPacket),
    MyNodeNum(u32),
    NodeDb { num: u32, long_name: String },
    ConfigComplete(u32),
    Rebooted,
    Ignored,
}

/// Decode one deframed `FromRadio` message.
pub fn decode_from_radio(frame: &[u8]) -> Result<RadioEvent> {
    let msg = FromRadio::decode(Bytes::copy_from_slice(frame))
        .map_err(|e| anyhow!("FromRadio decode failed: {}", e))?;
    Ok(match msg.payload_variant {
        Some(FRPayload::Packet(pkt)) => RadioEvent::Packet(packet_from_mesh(&pkt)),
        Some(FRPayload::MyInfo(info)) => RadioEvent::MyNodeNum(info.my_node_num),
        Some(FRPayload::NodeInfo(n)) => RadioEvent::NodeDb {
            num: n.num,
            long_name: n.user.map(|u| u.long_name).unwrap_or_default(),
        },
        Some(FRPayload::ConfigCompleteId(id)) => RadioEvent::ConfigComplete(id),
        Some(FRPayload::Rebooted(_)) => RadioEvent::Rebooted,
        None => RadioEvent::Ignored,
    })
}

pub fn category_for_port(port: PortNum) -> PacketCategory {
    match port {
        PortNum::TextMessageApp => PacketCategory::TextMessage,
        PortNum::PositionApp => PacketCategory::Position,
        PortNum::NodeinfoApp => PacketCategory::NodeInfo,
        PortNum::TelemetryApp => PacketCategory::Telemetry,
        PortNum::AlertApp => PacketCategory::Alert,
        _ => PacketCategory::Other,
    }
}

/// Convert a received `MeshPacket` into the responder's packet model.
///
/// Zero `rx_rssi`/`rx_snr` are what the firmware reports when it has no
/// measurement (locally generated or MQTT-bridged packets), so they map to
/// missing metrics. A payload that fails to decode keeps the packet's
/// category but carries no payload.
pub fn packet_from_mesh(pkt: &MeshPacket) -> InboundPacket {
    let metrics = RadioMetrics {
        rssi: (pkt.rx_rssi != 0).then_some(pkt.rx_rssi as f64),
        snr: (pkt.rx_snr != 0.0 && pkt.rx_snr.is_finite()).then_some(pkt.rx_snr as f64),
    };
    let sender = format_node_id(pkt.from);
    let Some(MPPayload::Decoded(data)) = &pkt.payload_variant else {
        return InboundPacket {
            category: PacketCategory::Other,
            sender,
            payload: None,
            metrics,
        };
    };
    let port = PortNum::try_from(data.portnum).unwrap_or(PortNum::UnknownApp);
    let category = category_for_port(port);
    let payload = match category {
        PacketCategory::TextMessage => Some(Payload::Text(
            String::from_utf8_lossy(&data.payload).into_owned(),
        )),
        PacketCategory::Position => proto::Position::decode(data.payload.as_slice())
            .ok()
            .map(|p| Payload::Position(position_report(&p))),
        PacketCategory::NodeInfo => proto::User::decode(data.payload.as_slice())
            .ok()
            .map(|u| Payload::NodeInfo(node_details(&u))),
        PacketCategory::Telemetry | PacketCategory::Alert | PacketCategory::Other => None,
    };
    InboundPacket {
        category,
        sender,
        payload,
        metrics,
    }
}

fn position_report(p: &proto::Position) -> PositionReport {
    PositionReport {
        latitude: p.latitude_i.map(|v| v as f64 * 1e-7),
        longitude: p.longitude_i.map(|v| v as f64 * 1e-7),
        altitude: p.altitude,
        ground_speed: p.ground_speed,
        ground_track: p.ground_track,
    }
}

fn node_details(u: &proto::User) -> NodeDetails {
    let hardware_model = match HardwareModel::try_from(u.hw_model) {
        Ok(model) => format!("{:?}", model),
        Err(_) => u.hw_model.to_string(),
    };
    NodeDetails {
        long_name: u.long_name.trim().to_string(),
        short_name: u.short_name.trim().to_string(),
        hardware_model,
    }
}

/// Build the `ToRadio` bytes (unframed) carrying a text message.
pub fn encode_text_packet(from: u32, to: u32, channel: u32, id: u32, text: &str) -> Vec<u8> {
    use proto::to_radio::PayloadVariant as TRPayload;
    let is_dm = to != BROADCAST_ADDR;
    let pkt = MeshPacket {
        from,
        to,
        channel,
        payload_variant: Some(MPPayload::Decoded(proto::Data {
            portnum: PortNum::TextMessageApp as i32,
            payload: text.as_bytes().to_vec(),
            ..Default::default()
        })),
        id,
        hop_limit: 3,
        want_ack: is_dm,
        // RELIABLE for DMs, DEFAULT otherwise
        priority: if is_dm { 70 } else { 0 },
        ..Default::default()
    };
    proto::ToRadio {
        payload_variant: Some(TRPayload::Packet(pkt)),
    }
    .encode_to_vec()
}

#[cfg(feature = "serial")]
mod device;
#[cfg(feature = "serial")]
pub use device::MeshtasticDevice;
