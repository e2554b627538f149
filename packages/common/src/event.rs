use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

/// Core event trait
pub trait Event: Send + Sync + Sized + Serialize + DeserializeOwned {
    /// Get the event topic (e.g. "round_opened", "round_closed")
    fn topic(&self) -> &str;

    /// Convert event to a generic event
    fn to_generic_event(&self) -> GenericEvent {
        GenericEvent {
            topic: self.topic().to_string(),
            payload: serde_json::to_value(self).unwrap_or_default(),
        }
    }

    /// Create an event from a generic event
    fn from_generic_event(e: &GenericEvent) -> Result<Self, anyhow::Error> {
        let payload: Self = serde_json::from_value(e.payload.clone())?;
        Ok(payload)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenericEvent {
    pub topic: String,
    pub payload: serde_json::Value,
}

impl Event for GenericEvent {
    fn topic(&self) -> &str {
        &self.topic
    }

    fn from_generic_event(e: &GenericEvent) -> Result<Self, anyhow::Error> {
        Ok(e.clone())
    }
}

pub const ROUND_OPENED: &str = "round_opened";
pub const ROUND_CLOSED: &str = "round_closed";
pub const ROUND_REMINDER: &str = "round_reminder";

/// Round lifecycle notifications handed to the external dispatcher.
///
/// `recipients` holds the e-mail addresses of every participant at the time
/// the event was raised.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RoundEvent {
    Opened {
        round_id: i32,
        title: String,
        description: String,
        start_date: DateTime<Utc>,
        end_date: DateTime<Utc>,
        recipients: Vec<String>,
    },
    Closed {
        round_id: i32,
        title: String,
        winner_id: Option<i32>,
        winner_points: i32,
        recipients: Vec<String>,
    },
    Reminder {
        round_id: i32,
        title: String,
        /// Formatted as `"{d}d {h}h {m}m"`.
        remaining: String,
        days_left: i64,
        recipients: Vec<String>,
    },
}

impl Event for RoundEvent {
    fn topic(&self) -> &str {
        match self {
            Self::Opened { .. } => ROUND_OPENED,
            Self::Closed { .. } => ROUND_CLOSED,
            Self::Reminder { .. } => ROUND_REMINDER,
        }
    }
}

impl RoundEvent {
    pub fn round_id(&self) -> i32 {
        match self {
            Self::Opened { round_id, .. }
            | Self::Closed { round_id, .. }
            | Self::Reminder { round_id, .. } => *round_id,
        }
    }
}
