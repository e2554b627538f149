use std::sync::Arc;

use engine::{ArenaStore, Notifier, ParticipantRegistry, RoundManager};

use crate::config::AppConfig;

#[derive(Clone)]
pub struct AppState {
    pub rounds: Arc<RoundManager>,
    pub participants: Arc<ParticipantRegistry>,
    pub config: AppConfig,
}

impl AppState {
    pub fn new(store: Arc<dyn ArenaStore>, notifier: Arc<dyn Notifier>, config: AppConfig) -> Self {
        Self {
            rounds: Arc::new(RoundManager::new(store.clone(), notifier)),
            participants: Arc::new(ParticipantRegistry::new(store)),
            config,
        }
    }
}
