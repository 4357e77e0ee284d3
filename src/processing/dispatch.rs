use tokio::runtime::Handle;

use super::triggers::window::AnalysisWindow;
use crate::errors::RelayError;
use crate::utils::log::{DispatchJournal, DispatchRecord};

/// Hands an analysis window to the detection service without blocking the
/// caller.
pub trait Dispatcher: Send + Sync {
    fn dispatch(&self, window: AnalysisWindow);
}

// HTTP DISPATCHER -------------------------------------------------------------

/// POSTs windows to the analysis endpoint from a detached task.
///
/// The HTTP response is only logged. Verdicts reach viewers through the
/// separate inbound `detection` event, never through this response.
#[derive(Debug, Clone)]
pub struct HttpDispatcher {
    client: reqwest::Client,
    endpoint: String,
    journal: Option<DispatchJournal>,
}

impl HttpDispatcher {
    pub fn new<S: Into<String>>(endpoint: S) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            journal: None,
        }
    }

    pub fn with_journal(mut self, journal: DispatchJournal) -> Self {
        self.journal = Some(journal);
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn send(
        client: &reqwest::Client,
        endpoint: &str,
        window: &AnalysisWindow,
    ) -> Result<(u16, String), RelayError> {
        let response = client
            .post(endpoint)
            .json(window)
            .send()
            .await
            .map_err(|e| RelayError::DispatchFailure(e.to_string()))?;

        let status = response.status();
        let body = response.text().await;
        if !status.is_success() {
            return Err(RelayError::DispatchFailure(format!(
                "analysis service answered {}: {}",
                status,
                body.unwrap_or_default()
            )));
        }

        let body = body.map_err(|e| {
            RelayError::DispatchFailure(format!("failed to read response body: {}", e))
        })?;
        Ok((status.as_u16(), body))
    }
}

impl Dispatcher for HttpDispatcher {
    fn dispatch(&self, window: AnalysisWindow) {
        let handle = match Handle::try_current() {
            Ok(handle) => handle,
            Err(e) => {
                tracing::error!(error = %e, "no async runtime, analysis window dropped");
                return;
            }
        };

        let client = self.client.clone();
        let endpoint = self.endpoint.clone();
        let journal = self.journal.clone();

        // Detached: the join handle is dropped and the outcome only reaches the log.
        handle.spawn(async move {
            let record = match Self::send(&client, &endpoint, &window).await {
                Ok((status, body)) => {
                    tracing::info!(status, response = %body, "analysis request accepted");
                    DispatchRecord::Delivered { status }
                }
                Err(err) => {
                    tracing::error!(%err, endpoint = %endpoint, "analysis request lost");
                    DispatchRecord::Failed {
                        reason: err.to_string(),
                    }
                }
            };

            if let Some(journal) = journal {
                if let Err(e) = journal.record(&record) {
                    tracing::warn!(error = %e, path = %journal.path().display(), "failed to write dispatch journal");
                }
            }
        });
    }
}
