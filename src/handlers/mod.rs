//! HTTP request handlers for the Guidepost API

use crate::config::Config;
use crate::knowledge::KnowledgeBase;
use crate::orchestrator::Orchestrator;
use crate::providers::{AnthropicProvider, LocalProvider, OllamaProvider, Provider};
use std::sync::Arc;
use std::time::Duration;

pub mod health;
pub mod respond;

/// Application state shared across all handlers
///
/// Everything in here is read-only after startup and Arc'd for cheap
/// cloning across Axum handlers; per-request mutable state lives in the
/// orchestrator's request tasks.
#[derive(Clone)]
pub struct AppState {
    config: Arc<Config>,
    orchestrator: Arc<Orchestrator>,
}

impl AppState {
    /// Create a new AppState from configuration
    ///
    /// Builds the knowledge table and the provider priority chain
    /// (Anthropic if credentialed, then Ollama, then the local table).
    pub fn new(config: Config) -> Self {
        let stream_timeout = Duration::from_secs(config.limits.stream_timeout_seconds);
        let knowledge = Arc::new(KnowledgeBase::new(config.knowledge.entries.clone()));

        let providers: Vec<Arc<dyn Provider>> = vec![
            Arc::new(AnthropicProvider::new(
                config.providers.anthropic.clone(),
                stream_timeout,
            )),
            Arc::new(OllamaProvider::new(
                config.providers.ollama.clone(),
                stream_timeout,
            )),
            Arc::new(LocalProvider::new(Arc::clone(&knowledge))),
        ];

        let orchestrator = Arc::new(Orchestrator::new(
            providers,
            knowledge,
            config.knowledge.intent_keywords.clone(),
            stream_timeout,
        ));

        Self {
            config: Arc::new(config),
            orchestrator,
        }
    }

    /// Get reference to the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get reference to the orchestrator
    pub fn orchestrator(&self) -> &Arc<Orchestrator> {
        &self.orchestrator
    }
}
