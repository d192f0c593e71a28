//! Test utilities shared by integration tests.

use meshhelper::geo::ReferencePoint;
use meshhelper::responder::{MessageSink, Responder};

/// Records every reply instead of transmitting it.
#[allow(dead_code)]
#[derive(Default)]
pub struct RecordingSink {
    pub sent: Vec<(String, String)>,
}

impl MessageSink for RecordingSink {
    fn send(&mut self, destination: &str, text: &str) -> anyhow::Result<()> {
        self.sent.push((destination.to_string(), text.to_string()));
        Ok(())
    }
}

/// A sink whose transport is always down.
#[allow(dead_code)]
pub struct FailingSink;

impl MessageSink for FailingSink {
    fn send(&mut self, _destination: &str, _text: &str) -> anyhow::Result<()> {
        anyhow::bail!("radio unavailable")
    }
}

/// Paris, used as the base in distance tests.
#[allow(dead_code)]
pub fn paris_responder() -> Responder {
    Responder::new(ReferencePoint::new(48.8566, 2.3522))
}
