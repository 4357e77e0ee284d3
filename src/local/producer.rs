use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context};
use futures_util::SinkExt;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::time::interval;
use tokio_tungstenite::{connect_async, tungstenite::Message};

use super::events::InboundEvent;
use crate::config::ProducerConfig;
use crate::processing::{Sample, CHANNEL_COUNT};

pub trait BatchSource {
    /// Next `chunk` samples per channel, or `None` once every channel is
    /// exhausted.
    fn next_batch(&mut self, chunk: usize) -> Option<Vec<Vec<Sample>>>;
}

// -----------------------------------------------------------------------------
// SETUP FOR IMPORTING SIGNALS FROM CSV
// -----------------------------------------------------------------------------

/// One recording per channel, replayed in fixed-size chunks.
pub struct CsvSource {
    channels: Vec<Vec<Sample>>,
    cursor: usize,
}

impl CsvSource {
    /// Loads the first `CHANNEL_COUNT` CSV files of `dir`, sorted by name.
    /// Each file has a header row; the last column holds the sample value.
    pub fn from_dir<P: AsRef<Path>>(dir: P) -> anyhow::Result<Self> {
        let dir = dir.as_ref();
        let mut files: Vec<PathBuf> = fs::read_dir(dir)
            .with_context(|| format!("failed to read data directory {}", dir.display()))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.extension().map_or(false, |ext| ext == "csv"))
            .collect();
        files.sort();

        if files.len() < CHANNEL_COUNT {
            bail!(
                "expected {} CSV files in {}, found {}",
                CHANNEL_COUNT,
                dir.display(),
                files.len()
            );
        }

        let channels = files
            .iter()
            .take(CHANNEL_COUNT)
            .map(|path| read_channel(path))
            .collect::<anyhow::Result<Vec<_>>>()?;

        Ok(Self::new(channels))
    }

    pub fn new(channels: Vec<Vec<Sample>>) -> Self {
        Self {
            channels,
            cursor: 0,
        }
    }
}

fn read_channel(path: &Path) -> anyhow::Result<Vec<Sample>> {
    let mut rdr = csv::Reader::from_path(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    let mut samples = Vec::new();

    for (row, result) in rdr.records().enumerate() {
        let record = result?;
        let field = record
            .iter()
            .last()
            .with_context(|| format!("{} row {} is empty", path.display(), row + 1))?;
        let value: Sample = field
            .trim()
            .parse()
            .with_context(|| format!("{} row {}: `{}` is not a number", path.display(), row + 1, field))?;
        samples.push(value);
    }

    tracing::info!(path = %path.display(), samples = samples.len(), "channel recording loaded");
    Ok(samples)
}

impl BatchSource for CsvSource {
    fn next_batch(&mut self, chunk: usize) -> Option<Vec<Vec<Sample>>> {
        if self.channels.iter().all(|c| self.cursor >= c.len()) {
            return None;
        }

        let start = self.cursor;
        self.cursor += chunk.max(1);
        Some(
            self.channels
                .iter()
                .map(|c| {
                    let end = self.cursor.min(c.len());
                    c.get(start..end).map(<[Sample]>::to_vec).unwrap_or_default()
                })
                .collect(),
        )
    }
}

// -----------------------------------------------------------------------------
// SETUP FOR THE SIMULATED SIGNALS
// -----------------------------------------------------------------------------

const BASELINE_AMPLITUDE: f64 = 70.0;
const INCREMENT_TIME: f64 = 0.01;

const BACKGROUND_I_FREQ: f64 = 0.5;
const BACKGROUND_II_FREQ: f64 = 1.0;
const BACKGROUND_III_FREQ: f64 = 2.0;
const QUAKE_FREQ: f64 = 13.0;

#[derive(Debug, Clone)]
struct PulseParams {
    amplitude: f64,
    frequency: f64,
    remaining: usize,
}

/// Noisy background sinusoids with occasional bursts, per channel.
pub struct SimulatedSource {
    rng: StdRng,
    time: f64,
    pulses: Vec<Option<PulseParams>>,
}

impl SimulatedSource {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            rng,
            time: 0.0,
            pulses: vec![None; CHANNEL_COUNT],
        }
    }

    fn sample(&mut self, channel: usize) -> Sample {
        let phase = channel as f64;
        let t = self.time;
        let noise = self.rng.gen_range(-10.0..10.0);
        let mut value = 10.0 * (BACKGROUND_I_FREQ * t + phase).sin()
            + BASELINE_AMPLITUDE / 2.0 * (BACKGROUND_II_FREQ * t + phase).sin()
            + 5.0 * (BACKGROUND_III_FREQ * t).sin()
            + noise;

        // 0.01% chance per sample to start a burst
        if self.pulses[channel].is_none() && self.rng.gen_range(0..10_000) == 0 {
            self.pulses[channel] = Some(PulseParams {
                amplitude: self.rng.gen_range(30.0..60.0),
                frequency: QUAKE_FREQ,
                remaining: self.rng.gen_range(500..3000),
            });
        }

        if let Some(pulse) = self.pulses[channel].as_mut() {
            value += pulse.amplitude * (2.0 * std::f64::consts::PI * pulse.frequency * t).sin();
            pulse.remaining -= 1;
            if pulse.remaining == 0 {
                self.pulses[channel] = None;
            }
        }

        value
    }
}

impl Default for SimulatedSource {
    fn default() -> Self {
        Self::new()
    }
}

impl BatchSource for SimulatedSource {
    fn next_batch(&mut self, chunk: usize) -> Option<Vec<Vec<Sample>>> {
        let mut batch = vec![Vec::with_capacity(chunk); CHANNEL_COUNT];
        for _ in 0..chunk {
            for (channel, samples) in batch.iter_mut().enumerate() {
                let value = self.sample(channel);
                samples.push(value);
            }
            self.time += INCREMENT_TIME;
        }
        Some(batch)
    }
}

// -----------------------------------------------------------------------------
// RUN CODE
// -----------------------------------------------------------------------------

/// Streams batches to the relay every `interval_ms` until the source runs dry.
///
/// No trailing all-empty batch is sent once the recordings are exhausted, so
/// the relay's 4-batch cycle only counts batches that carried data from here.
pub async fn run(config: &ProducerConfig) -> anyhow::Result<()> {
    let mut source: Box<dyn BatchSource + Send> = if config.simulate {
        Box::new(SimulatedSource::new())
    } else {
        Box::new(CsvSource::from_dir(&config.data_dir)?)
    };

    let (mut socket, _) = connect_async(config.relay_url.as_str())
        .await
        .with_context(|| format!("failed to connect to relay at {}", config.relay_url))?;
    tracing::info!(url = %config.relay_url, "connected to relay");

    let mut ticker = interval(Duration::from_millis(config.interval_ms.max(1)));
    let chunk = config.chunk_size.max(1);
    let mut sent = 0usize;

    while let Some(batch) = source.next_batch(chunk) {
        ticker.tick().await;
        let frame = serde_json::to_string(&InboundEvent::Telemetry(serde_json::to_value(&batch)?))?;
        socket.send(Message::Text(frame)).await?;
        sent += 1;
        tracing::debug!(batch = sent, "telemetry emitted");
    }

    tracing::info!(batches = sent, "all channels exhausted");
    socket.close(None).await?;
    Ok(())
}
