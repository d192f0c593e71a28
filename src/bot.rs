//! The home-base bot: owns the radio connection and feeds every received packet
//! to the [`Responder`], one at a time, until Ctrl-C.
use crate::config::Config;
use crate::responder::Responder;
use anyhow::Result;
use log::info;
#[cfg(feature = "serial")]
use log::{debug, error, warn};
use tokio::time::{interval, Duration, MissedTickBehavior};

#[cfg(feature = "serial")]
use crate::meshtastic::MeshtasticDevice;

/// How often the serial port is polled for new frames.
const POLL_INTERVAL: Duration = Duration::from_millis(20);

pub struct HelperBot {
    config: Config,
    responder: Responder,
    #[cfg(feature = "serial")]
    device: Option<MeshtasticDevice>,
}

impl HelperBot {
    pub fn new(config: Config) -> Self {
        let reference = config.reference_point();
        info!(
            "Base '{}' at lat={} lon={}",
            config.base.base_id, config.base.base_lat, config.base.base_long
        );
        Self {
            config,
            responder: Responder::new(reference),
            #[cfg(feature = "serial")]
            device: None,
        }
    }

    /// Open the radio on `port` and request its config.
    #[cfg(feature = "serial")]
    pub async fn connect_device(&mut self, port: &str) -> Result<()> {
        let m = &self.config.meshtastic;
        let mut device = MeshtasticDevice::open(port, m.baud_rate, m.channel).await?;
        device.ensure_want_config()?;
        self.device = Some(device);
        Ok(())
    }

    #[cfg(not(feature = "serial"))]
    pub async fn connect_device(&mut self, port: &str) -> Result<()> {
        Err(anyhow::anyhow!(
            "Cannot open {}: serial support not compiled in (enable the 'serial' feature)",
            port
        ))
    }

    /// Main loop. Returns after Ctrl-C.
    pub async fn run(&mut self) -> Result<()> {
        let mut poll = interval(POLL_INTERVAL);
        poll.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let hb_secs = self.config.meshtastic.heartbeat_interval_secs;
        let mut heartbeat = interval(Duration::from_secs(hb_secs.max(1)));
        heartbeat.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // first tick completes immediately
        heartbeat.tick().await;

        info!("Listening for packets (Ctrl-C to stop)");
        loop {
            tokio::select! {
                _ = poll.tick() => self.poll_device(),
                _ = heartbeat.tick(), if hb_secs > 0 => self.keepalive(),
                _ = tokio::signal::ctrl_c() => {
                    info!("Received shutdown signal");
                    break;
                }
            }
        }
        Ok(())
    }

    #[cfg(feature = "serial")]
    fn poll_device(&mut self) {
        let Some(device) = self.device.as_mut() else {
            return;
        };
        let packets = match device.poll_packets() {
            Ok(p) => p,
            Err(e) => {
                error!("Reader error: {} - continuing operation", e);
                return;
            }
        };
        for packet in packets {
            debug!("Received packet: {:?}", packet);
            self.responder.handle(&packet, device);
        }
        if let Err(e) = device.ensure_want_config() {
            warn!("Failed to request device config: {}", e);
        }
    }

    #[cfg(not(feature = "serial"))]
    fn poll_device(&mut self) {}

    #[cfg(feature = "serial")]
    fn keepalive(&mut self) {
        if let Some(device) = self.device.as_mut() {
            match device.send_heartbeat() {
                Ok(()) => debug!("Heartbeat sent to {}", device.port_name()),
                Err(e) => warn!("Failed to send heartbeat: {}", e),
            }
        }
    }

    #[cfg(not(feature = "serial"))]
    fn keepalive(&mut self) {}
}
