use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand};

use telemetry_relay::config::{load_config, save_config, Config};
use telemetry_relay::local::{client, producer, relay};
use telemetry_relay::utils::log::init_tracing;

#[derive(Parser, Debug)]
#[command(
    name = "telemetry-relay",
    about = "Six-channel telemetry relay with windowed analysis dispatch",
    long_about = None
)]
struct Cli {
    /// YAML config file; defaults are used when it does not exist.
    #[arg(long, global = true, default_value = "relay.yaml")]
    config: PathBuf,

    #[command(subcommand)]
    mode: Mode,
}

#[derive(Subcommand, Debug)]
enum Mode {
    /// Accept producers and viewers on the WebSocket endpoint.
    Server,
    /// Stream recorded (or simulated) telemetry to a relay.
    Producer {
        #[arg(long)]
        simulate: bool,
    },
    /// Watch a channel and print what the relay broadcasts.
    Viewer {
        /// Channel to watch; -1 joins without a channel.
        #[arg(long, allow_negative_numbers = true)]
        channel: Option<i64>,
    },
    /// Write the default config to a file.
    InitConfig { path: PathBuf },
}

fn read_config(path: &Path) -> Result<Config> {
    if path.exists() {
        Ok(load_config(path)?)
    } else {
        Ok(Config::default())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Mode::InitConfig { path } = &cli.mode {
        save_config(&Config::default(), path)?;
        println!("Default config written to {}", path.display());
        return Ok(());
    }

    let mut config = read_config(&cli.config)?;
    init_tracing(&config.logging);
    if !cli.config.exists() {
        tracing::info!(path = %cli.config.display(), "config file not found, using defaults");
    }

    match cli.mode {
        Mode::Server => relay::run(&config).await,
        Mode::Producer { simulate } => {
            config.producer.simulate |= simulate;
            producer::run(&config.producer).await
        }
        Mode::Viewer { channel } => {
            if let Some(channel) = channel {
                config.viewer.channel = channel;
            }
            client::run(&config.viewer).await
        }
        Mode::InitConfig { .. } => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn viewer_accepts_unsubscribe_channel() {
        let cli = Cli::try_parse_from(["telemetry-relay", "viewer", "--channel", "-1"]).unwrap();
        match cli.mode {
            Mode::Viewer { channel } => assert_eq!(channel, Some(-1)),
            other => panic!("unexpected mode {:?}", other),
        }
    }

    #[test]
    fn viewer_channel_is_optional() {
        let cli = Cli::try_parse_from(["telemetry-relay", "viewer"]).unwrap();
        assert!(matches!(cli.mode, Mode::Viewer { channel: None }));
        assert_eq!(cli.config, PathBuf::from("relay.yaml"));
    }
}
