//! # Meshhelper - Home Base Responder for Meshtastic Networks
//!
//! Meshhelper turns a PC or Raspberry Pi with a USB-attached Meshtastic node into
//! a home base for testing a mesh: it answers short commands sent to it and logs
//! what it hears.
//!
//! ## Commands
//!
//! - `Distance: <lat>, <lon>` - geodesic distance from the base in meters
//! - `Signal:` - RSSI and SNR of the request as received at the base
//! - `Time:` - the base's local time
//! - anything else is echoed back to the sender
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use meshhelper::bot::HelperBot;
//! use meshhelper::config::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.toml").await?;
//!     let port = config.meshtastic.port.clone();
//!     let mut bot = HelperBot::new(config);
//!     bot.connect_device(&port).await?;
//!     bot.run().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`command`] - command grammar and extraction
//! - [`geo`] - reference point and geodesic distance
//! - [`packet`] - inbound packet model
//! - [`responder`] - packet routing and reply formatting
//! - [`meshtastic`] - serial framing, protobuf messages and the device link
//! - [`bot`] - the event loop tying device and responder together
//! - [`config`] - configuration loading
//! - [`logutil`] - log sanitizing helpers
//!
//! ```text
//! ┌─────────────────┐
//! │   HelperBot     │ ← event loop
//! └─────────────────┘
//!     │         │
//! ┌────────┐ ┌───────────┐
//! │ Device │ │ Responder │ ← command → reply
//! └────────┘ └───────────┘
//! ```

pub mod bot;
pub mod command;
pub mod config;
pub mod geo;
pub mod logutil;
pub mod meshtastic;
pub mod packet;
pub mod responder;
