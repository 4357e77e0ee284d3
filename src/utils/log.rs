use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;

/// Installs the global `tracing` subscriber.
///
/// `RUST_LOG` wins over the configured directive when it is set. Calling this
/// twice is harmless; the second install is ignored.
pub fn init_tracing(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(config.ansi)
        .with_target(true)
        .try_init();
}

/// Outcome of one analysis request, as recorded in the dispatch journal.
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchRecord {
    Delivered { status: u16 },
    Failed { reason: String },
}

/// Appends one CSV row per completed dispatch.
///
/// The header is only written when the file is first created.
#[derive(Debug, Clone)]
pub struct DispatchJournal {
    path: PathBuf,
}

impl DispatchJournal {
    const HEADERS: [&'static str; 3] = ["timestamp", "outcome", "detail"];

    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn record(&self, record: &DispatchRecord) -> io::Result<()> {
        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() && !dir.exists() {
                fs::create_dir_all(dir)?;
            }
        }
        let file_exists = self.path.exists();

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let mut writer = csv::Writer::from_writer(file);

        if !file_exists {
            writer.write_record(Self::HEADERS)?;
        }

        let timestamp = Utc::now().to_rfc3339();
        let (outcome, detail) = match record {
            DispatchRecord::Delivered { status } => ("ok", status.to_string()),
            DispatchRecord::Failed { reason } => ("error", reason.clone()),
        };
        writer.write_record([timestamp.as_str(), outcome, detail.as_str()])?;
        writer.flush()?;

        Ok(())
    }
}
