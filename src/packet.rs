//! Inbound packet model handed from the radio link to the responder.
//!
//! Packets are validated once when converted from the radio's protobuf
//! representation (see [`crate::meshtastic`]); everything downstream works
//! with these plain types.
use std::fmt;

/// Application category of an inbound packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PacketCategory {
    Telemetry,
    TextMessage,
    Position,
    NodeInfo,
    Alert,
    Other,
}

impl PacketCategory {
    pub fn label(&self) -> &'static str {
        match self {
            PacketCategory::Telemetry => "telemetry",
            PacketCategory::TextMessage => "text-message",
            PacketCategory::Position => "position",
            PacketCategory::NodeInfo => "node-info",
            PacketCategory::Alert => "alert",
            PacketCategory::Other => "other",
        }
    }
}

impl fmt::Display for PacketCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Position report fields. Every field is optional on the wire.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PositionReport {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Meters above mean sea level.
    pub altitude: Option<i32>,
    /// Meters per second.
    pub ground_speed: Option<u32>,
    /// Degrees.
    pub ground_track: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeDetails {
    pub long_name: String,
    pub short_name: String,
    pub hardware_model: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Text(String),
    Position(PositionReport),
    NodeInfo(NodeDetails),
}

/// Receive-side link quality. Either value may be missing.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RadioMetrics {
    /// dBm
    pub rssi: Option<f64>,
    /// dB
    pub snr: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InboundPacket {
    pub category: PacketCategory,
    pub sender: String,
    pub payload: Option<Payload>,
    pub metrics: RadioMetrics,
}

impl InboundPacket {
    /// A text-message packet with no radio metrics.
    pub fn text(sender: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            category: PacketCategory::TextMessage,
            sender: sender.into(),
            payload: Some(Payload::Text(text.into())),
            metrics: RadioMetrics::default(),
        }
    }

    pub fn with_metrics(mut self, metrics: RadioMetrics) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn text_payload(&self) -> Option<&str> {
        match &self.payload {
            Some(Payload::Text(t)) => Some(t.as_str()),
            _ => None,
        }
    }
}
