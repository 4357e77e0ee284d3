use anyhow::Context;
use colored::Colorize;
use futures_util::{SinkExt, StreamExt};
use tokio_tungstenite::{connect_async, tungstenite::Message};

use super::events::{InboundEvent, JoinRoom};
use crate::config::ViewerConfig;
use crate::processing::{OutboundEvent, Sample};

// To ensure |repeat| doesn't blow up the terminal
const MAX_BAR_LEN: usize = 80;

/// Terminal viewer: joins a channel and prints every event the relay pushes.
pub async fn run(config: &ViewerConfig) -> anyhow::Result<()> {
    let (socket, _) = connect_async(config.relay_url.as_str())
        .await
        .with_context(|| format!("failed to connect to relay at {}", config.relay_url))?;
    let (mut sink, mut stream) = socket.split();

    let join = InboundEvent::Join(JoinRoom::Text(config.channel.to_string()));
    sink.send(Message::Text(serde_json::to_string(&join)?)).await?;
    println!("{}", format!("Watching channel {}", config.channel).bold());

    while let Some(message) = stream.next().await {
        let text = match message {
            Ok(Message::Text(text)) => text,
            Ok(Message::Close(_)) => break,
            Ok(_) => continue,
            Err(e) => {
                eprintln!("Failed to receive data: {}", e);
                break;
            }
        };

        match serde_json::from_str::<OutboundEvent>(&text) {
            Ok(event) => println!("{}", render(&event)),
            Err(e) => eprintln!("Unrecognised event: {}", e),
        }
    }

    Ok(())
}

pub fn render(event: &OutboundEvent) -> String {
    match event {
        OutboundEvent::LiveUpdate {
            channel,
            points,
            total_length,
        } => format!(
            "{} ch{} {} {}",
            "live    ".green(),
            channel,
            summary(points),
            format!("(total {})", total_length).dimmed()
        ),
        OutboundEvent::Snapshot { channel, points } => {
            format!("{} ch{} {}", "snapshot".cyan(), channel, summary(points))
        }
        OutboundEvent::Verdict(result) => {
            format!("{} {}", "VERDICT ".red().bold(), result.to_string().red())
        }
    }
}

fn summary(points: &[Sample]) -> String {
    let Some(&last) = points.last() else {
        return "no points".to_string();
    };
    let min = points.iter().copied().fold(f64::INFINITY, f64::min);
    let max = points.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    let bar_len = (last.abs().round() as usize).min(MAX_BAR_LEN);
    let bar = "|".repeat(bar_len);
    let bar = if last < 0.0 { bar.blue() } else { bar.white() };

    format!(
        "{} pts min {:.3} max {:.3} last {:.3} {}",
        points.len(),
        min,
        max,
        last,
        bar
    )
}
