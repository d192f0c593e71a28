//! Binary entrypoint for the Meshhelper CLI.
//!
//! Commands:
//! - `start [--port <path>]` - connect to the radio and answer commands
//! - `init` - write a starter `config.toml`
//! - `simulate --text <msg>` - run one message through the responder offline
//! - `distance <lat> <lon>` - print the distance from the configured base
//!
//! See the library crate docs for module-level details: `meshhelper::`.
use anyhow::Result;
use clap::{Parser, Subcommand};
use log::{error, info, warn};

use meshhelper::bot::HelperBot;
use meshhelper::config::Config;
use meshhelper::geo::{self, Coordinates};
use meshhelper::packet::{InboundPacket, RadioMetrics};
use meshhelper::responder::{MessageSink, Responder};

#[derive(Parser)]
#[command(name = "meshhelper")]
#[command(about = "A home base command responder for Meshtastic mesh networks")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path (can be used before or after subcommand)
    #[arg(short, long, default_value = "config.toml", global = true)]
    config: String,

    /// Verbose logging (-v, -vv for more; may appear before or after subcommand)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Connect to the radio and answer commands until Ctrl-C
    Start {
        /// Meshtastic device port (e.g., /dev/ttyUSB0)
        #[arg(short, long)]
        port: Option<String>,
    },
    /// Write a default configuration file
    Init,
    /// Feed one text message through the responder and print the reply
    Simulate {
        /// Message text, e.g. "Distance: 51.5, -0.12"
        #[arg(short, long)]
        text: String,
        /// Sender node id
        #[arg(short, long, default_value = "!00000001")]
        from: String,
        /// RSSI of the simulated packet (dBm)
        #[arg(long, allow_hyphen_values = true)]
        rssi: Option<f64>,
        /// SNR of the simulated packet (dB)
        #[arg(long, allow_hyphen_values = true)]
        snr: Option<f64>,
    },
    /// Print the geodesic distance from the base to a point
    Distance {
        #[arg(allow_hyphen_values = true)]
        lat: f64,
        #[arg(allow_hyphen_values = true)]
        lon: f64,
    },
}

/// Prints replies instead of transmitting them.
struct ConsoleSink;

impl MessageSink for ConsoleSink {
    fn send(&mut self, destination: &str, text: &str) -> Result<()> {
        println!("-> {}: {}", destination, text);
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Commands::Init = cli.command {
        init_logging(&None, cli.verbose);
        Config::create_default(&cli.config).await?;
        info!("Configuration file created at {}", cli.config);
        return Ok(());
    }

    let loaded = Config::load(&cli.config).await;
    let config = match &loaded {
        Ok(cfg) => cfg.clone(),
        Err(_) => Config::default(),
    };
    init_logging(&Some(config.clone()), cli.verbose);
    if let Err(e) = &loaded {
        error!("Failed to load config: {} (using defaults)", e);
    }

    match cli.command {
        Commands::Start { port } => {
            info!("Starting Meshhelper v{}", env!("CARGO_PKG_VERSION"));
            let configured_port = config.meshtastic.port.clone();
            let mut bot = HelperBot::new(config);

            // CLI overrides config
            let chosen_port = port.or_else(|| {
                if configured_port.is_empty() {
                    None
                } else {
                    Some(configured_port)
                }
            });
            match chosen_port {
                Some(port_path) => match bot.connect_device(&port_path).await {
                    Ok(()) => info!("Opened Meshtastic device on {}", port_path),
                    Err(e) => {
                        warn!("Failed to connect to device on {}: {}", port_path, e);
                        return Err(e);
                    }
                },
                None => {
                    warn!("No --port specified and no configured device port set");
                    return Ok(());
                }
            }
            bot.run().await?;
        }
        Commands::Simulate {
            text,
            from,
            rssi,
            snr,
        } => {
            let responder = Responder::new(config.reference_point());
            let packet = InboundPacket::text(from, text).with_metrics(RadioMetrics { rssi, snr });
            responder.handle(&packet, &mut ConsoleSink);
        }
        Commands::Distance { lat, lon } => {
            match geo::distance(&config.reference_point(), Coordinates::new(lat, lon)) {
                Ok(m) => println!("{:.1} m", m),
                Err(e) => {
                    eprintln!("Error: {}", e);
                    std::process::exit(1);
                }
            }
        }
        // handled before config load
        Commands::Init => {}
    }

    Ok(())
}

fn init_logging(config: &Option<Config>, verbosity: u8) {
    use std::io::Write;
    let mut builder = env_logger::Builder::new();
    // CLI verbosity overrides config
    let base_level = match verbosity {
        0 => config
            .as_ref()
            .map(|c| c.logging.level_filter())
            .unwrap_or(log::LevelFilter::Info),
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    builder.filter_level(base_level);

    let log_file = config
        .as_ref()
        .and_then(|c| c.logging.file.clone())
        .and_then(|path| {
            if let Some(parent) = std::path::Path::new(&path).parent() {
                let _ = std::fs::create_dir_all(parent);
            }
            std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .ok()
        });

    match log_file {
        Some(f) => {
            let file = std::sync::Mutex::new(f);
            // Mirror to the console only when someone is watching
            let is_tty = atty::is(atty::Stream::Stdout);
            builder.format(move |fmt, record| {
                let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
                let line = format!("{} [{}] {}", ts, record.level(), record.args());
                if let Ok(mut guard) = file.lock() {
                    let _ = writeln!(guard, "{}", line);
                }
                if is_tty {
                    writeln!(fmt, "{}", line)
                } else {
                    Ok(())
                }
            });
        }
        None => {
            builder.format(|fmt, record| {
                let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
                writeln!(fmt, "{} [{}] {}", ts, record.level(), record.args())
            });
        }
    }
    let _ = builder.try_init();
}
