use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use engine::RoundManager;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::ReminderConfig;

/// Spawn the periodic reminder for the active round.
///
/// The first tick fires immediately; later ticks follow `interval_secs`.
pub fn spawn(rounds: Arc<RoundManager>, config: &ReminderConfig) -> Option<JoinHandle<()>> {
    if !config.enabled {
        info!("Round reminders disabled");
        return None;
    }

    let period = Duration::from_secs(config.interval_secs.max(1));
    info!(interval_secs = period.as_secs(), "Starting round reminder task");

    Some(tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        loop {
            ticker.tick().await;
            match rounds.send_reminder(Utc::now()).await {
                Ok(Some(_)) => info!("Round reminder sent"),
                Ok(None) => debug!("No reminder due"),
                Err(e) => warn!("Round reminder failed: {e}"),
            }
        }
    }))
}
