use async_trait::async_trait;
use common::{Event, GenericEvent, RoundEvent};
use tracing::{info, warn};

/// Outbound dispatcher for round notifications (e-mail, chat, queue...).
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, event: GenericEvent) -> anyhow::Result<()>;
}

/// Notifier that only logs the event.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

#[async_trait]
impl Notifier for TracingNotifier {
    async fn notify(&self, event: GenericEvent) -> anyhow::Result<()> {
        info!(topic = %event.topic, payload = %event.payload, "Round notification");
        Ok(())
    }
}

/// Best-effort delivery: failures are logged and never reach the caller.
pub async fn dispatch(notifier: &dyn Notifier, event: RoundEvent) {
    let round_id = event.round_id();
    if let Err(e) = notifier.notify(event.to_generic_event()).await {
        warn!(round_id, "Failed to dispatch round notification: {e:#}");
    }
}
