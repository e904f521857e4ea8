use std::sync::Arc;

use crate::agent::ConversationAgent;
use crate::config::Settings;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub agent: Arc<ConversationAgent>,
    pub settings: Arc<Settings>,
}

impl AppState {
    pub fn new(agent: ConversationAgent, settings: Settings) -> Self {
        Self {
            agent: Arc::new(agent),
            settings: Arc::new(settings),
        }
    }
}
