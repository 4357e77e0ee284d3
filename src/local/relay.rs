use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::actor::run_event_loop;
use super::events::InboundEvent;
use crate::config::Config;
use crate::processing::{Broadcaster, Dispatcher, HttpDispatcher, RelayContext};
use crate::utils::log::DispatchJournal;

// -----------------------------------------------------------------------------
// RELAY SERVER
// -----------------------------------------------------------------------------

const EVENT_LOOP_DRAIN: Duration = Duration::from_secs(5);

/// Handles shared by every WebSocket connection.
#[derive(Clone)]
pub struct RelayState {
    events: mpsc::Sender<InboundEvent>,
    broadcaster: Broadcaster,
}

/// A running event loop plus the state needed to accept connections.
pub struct Relay {
    state: RelayState,
    event_loop: JoinHandle<()>,
}

impl Relay {
    /// Builds the relay with the HTTP analysis dispatcher from `config`.
    /// Must be called from within a tokio runtime.
    pub fn start(config: &Config) -> Self {
        let mut dispatcher = HttpDispatcher::new(config.analysis.endpoint.clone());
        if let Some(path) = &config.analysis.journal_path {
            dispatcher = dispatcher.with_journal(DispatchJournal::new(path));
        }
        Self::with_dispatcher(config, Arc::new(dispatcher))
    }

    pub fn with_dispatcher(config: &Config, dispatcher: Arc<dyn Dispatcher>) -> Self {
        let broadcaster = Broadcaster::new(config.server.broadcast_capacity);
        let (events, rx) = mpsc::channel(config.server.queue_capacity.max(1));

        let ctx = RelayContext::new(dispatcher, broadcaster.clone());
        let event_loop = tokio::spawn(run_event_loop(ctx, rx));

        Self {
            state: RelayState {
                events,
                broadcaster,
            },
            event_loop,
        }
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route("/ws", get(ws_handler))
            .with_state(self.state.clone())
    }

    /// Serves `/ws` until `shutdown` resolves, then lets the event loop drain.
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let router = self.router();
        let Relay { state, event_loop } = self;
        drop(state);

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown)
            .await?;

        // Upgraded sockets outlive the server and keep their queue senders.
        match tokio::time::timeout(EVENT_LOOP_DRAIN, event_loop).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::error!(error = %e, "event loop task failed"),
            Err(_) => tracing::warn!("event loop still busy at shutdown, abandoning it"),
        }
        Ok(())
    }
}

pub async fn run(config: &Config) -> anyhow::Result<()> {
    let listener = TcpListener::bind(&config.server.bind_addr).await?;
    tracing::info!(
        addr = %config.server.bind_addr,
        endpoint = %config.analysis.endpoint,
        "relay listening"
    );

    Relay::start(config).serve(listener, shutdown_signal()).await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}

// CONNECTION COMPONENT --------------------------------------------------------

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<RelayState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: RelayState) {
    tracing::info!("viewer connected");
    let (mut sink, mut stream) = socket.split();
    let mut outbound = state.broadcaster.subscribe();

    let mut send_task = tokio::spawn(async move {
        loop {
            let event = match outbound.recv().await {
                Ok(event) => event,
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "viewer lagging, events dropped");
                    continue;
                }
                Err(RecvError::Closed) => break,
            };

            let frame = match serde_json::to_string(&event) {
                Ok(frame) => frame,
                Err(e) => {
                    tracing::warn!(event = event.name(), error = %e, "failed to encode event");
                    continue;
                }
            };
            if let Err(e) = sink.send(Message::Text(frame)).await {
                tracing::debug!(event = event.name(), error = %e, "viewer write failed");
                break;
            }
        }
    });

    let events = state.events.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(message)) = stream.next().await {
            let text = match message {
                Message::Text(text) => text,
                Message::Close(_) => break,
                _ => continue,
            };

            match serde_json::from_str::<InboundEvent>(&text) {
                Ok(event) => {
                    if events.send(event).await.is_err() {
                        break;
                    }
                }
                Err(e) => tracing::warn!(error = %e, "ignoring unrecognised frame"),
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }
    tracing::info!("viewer disconnected");
}
