use tokio::sync::mpsc;

use super::events::InboundEvent;
use crate::processing::RelayContext;

/// Drains inbound events one at a time, in arrival order.
///
/// This task owns the relay context; it is the single writer of buffers,
/// cycle counter and subscription. Returns once every sender is dropped.
pub async fn run_event_loop(mut ctx: RelayContext, mut events: mpsc::Receiver<InboundEvent>) {
    tracing::info!("event loop started");
    while let Some(event) = events.recv().await {
        handle_event(&mut ctx, event);
    }
    tracing::info!("event loop stopped");
}

/// Applies one event. Errors are logged here and never leave the loop.
pub fn handle_event(ctx: &mut RelayContext, event: InboundEvent) {
    let name = event.name();
    let result = match event {
        InboundEvent::Join(room) => ctx.on_join(&room.as_selection()).map(|_| ()),
        InboundEvent::Telemetry(payload) => ctx.on_telemetry(&payload).map(|_| ()),
        InboundEvent::Detection(payload) => {
            ctx.on_detection(payload);
            Ok(())
        }
    };

    if let Err(err) = result {
        tracing::warn!(event = name, %err, "event rejected");
    }
}
