//! Configuration management for Guidepost
//!
//! Parses TOML configuration files and provides typed access to settings.
//! The knowledge table and navigation-intent keyword list are configuration
//! data: the core consumes them read-only after startup.

use crate::error::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Root configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub server: ServerConfig,
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub limits: LimitsConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
    #[serde(default)]
    pub knowledge: KnowledgeConfig,
}

impl Config {
    /// Load and validate configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> AppResult<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            AppError::Config(format!(
                "Failed to read config file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| AppError::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate cross-field invariants not expressible in serde
    pub fn validate(&self) -> AppResult<()> {
        if self.server.host.trim().is_empty() {
            return Err(AppError::Config("server.host cannot be empty".to_string()));
        }
        if let Some(anthropic) = &self.providers.anthropic {
            anthropic.validate()?;
        }
        self.providers.ollama.validate()?;
        for entry in &self.knowledge.entries {
            if entry.key.trim().is_empty() {
                return Err(AppError::Config(
                    "knowledge entry key cannot be empty".to_string(),
                ));
            }
            if entry.answer.trim().is_empty() {
                return Err(AppError::Config(format!(
                    "knowledge entry '{}' has an empty answer",
                    entry.key
                )));
            }
        }
        Ok(())
    }
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Provider backend configuration
///
/// Priority order is fixed: Anthropic (if a credential is configured), then
/// Ollama (if its liveness probe passes), then the always-available local
/// answer table. Absence of a section is a demotion, never an error.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ProvidersConfig {
    /// Remote chat API; only selected when `api_key` is set
    pub anthropic: Option<AnthropicConfig>,
    #[serde(default)]
    pub ollama: OllamaConfig,
}

/// Anthropic-style messages API configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AnthropicConfig {
    api_key: String,
    #[serde(default = "default_anthropic_model")]
    model: String,
    #[serde(default = "default_anthropic_base_url")]
    base_url: String,
    #[serde(default = "default_max_tokens")]
    max_tokens: u32,
}

impl AnthropicConfig {
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn max_tokens(&self) -> u32 {
        self.max_tokens
    }

    fn validate(&self) -> AppResult<()> {
        if self.api_key.trim().is_empty() {
            return Err(AppError::Config(
                "providers.anthropic.api_key cannot be empty; omit the section instead"
                    .to_string(),
            ));
        }
        if self.base_url.trim().is_empty() {
            return Err(AppError::Config(
                "providers.anthropic.base_url cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

fn default_anthropic_model() -> String {
    "claude-3-5-haiku-latest".to_string()
}

fn default_anthropic_base_url() -> String {
    "https://api.anthropic.com".to_string()
}

fn default_max_tokens() -> u32 {
    1024
}

/// Local-network Ollama configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OllamaConfig {
    #[serde(default = "default_ollama_base_url")]
    base_url: String,
    #[serde(default = "default_ollama_model")]
    model: String,
    /// Liveness probe timeout in seconds (short by design - the probe gates
    /// provider selection on the request path)
    #[serde(default = "default_probe_timeout")]
    probe_timeout_seconds: u64,
}

impl OllamaConfig {
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn probe_timeout_seconds(&self) -> u64 {
        self.probe_timeout_seconds
    }

    fn validate(&self) -> AppResult<()> {
        if self.base_url.trim().is_empty() {
            return Err(AppError::Config(
                "providers.ollama.base_url cannot be empty".to_string(),
            ));
        }
        if self.probe_timeout_seconds == 0 || self.probe_timeout_seconds > 30 {
            return Err(AppError::Config(format!(
                "providers.ollama.probe_timeout_seconds must be in 1..=30, got {}",
                self.probe_timeout_seconds
            )));
        }
        Ok(())
    }
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: default_ollama_base_url(),
            model: default_ollama_model(),
            probe_timeout_seconds: default_probe_timeout(),
        }
    }
}

fn default_ollama_base_url() -> String {
    "http://127.0.0.1:11434".to_string()
}

fn default_ollama_model() -> String {
    "qwen2.5-coder:7b".to_string()
}

fn default_probe_timeout() -> u64 {
    2
}

/// Request-shaping limits
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LimitsConfig {
    /// Page-context snippet cap in characters, applied before prompt build
    #[serde(default = "default_context_cap")]
    pub context_cap_chars: usize,
    /// Full provider streaming timeout in seconds
    #[serde(default = "default_stream_timeout")]
    pub stream_timeout_seconds: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            context_cap_chars: default_context_cap(),
            stream_timeout_seconds: default_stream_timeout(),
        }
    }
}

fn default_context_cap() -> usize {
    2500
}

fn default_stream_timeout() -> u64 {
    60
}

/// Observability configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Knowledge table and intent keywords, supplied as data
///
/// Defaults cover the GitHub pull-request flow the extension ships with, so
/// a bare config file still produces a working local provider.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct KnowledgeConfig {
    #[serde(default = "default_intent_keywords")]
    pub intent_keywords: Vec<String>,
    #[serde(default = "default_knowledge_entries")]
    pub entries: Vec<KnowledgeEntryConfig>,
}

impl Default for KnowledgeConfig {
    fn default() -> Self {
        Self {
            intent_keywords: default_intent_keywords(),
            entries: default_knowledge_entries(),
        }
    }
}

/// One canned answer in the knowledge table
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct KnowledgeEntryConfig {
    /// Keyword phrase matched as a substring of the normalized query
    pub key: String,
    /// Multi-line canned answer
    pub answer: String,
    /// Ordered `ACTION:` literals replayed after the answer
    #[serde(default)]
    pub directives: Vec<String>,
}

fn default_intent_keywords() -> Vec<String> {
    crate::inject::DEFAULT_INTENT_KEYWORDS
        .iter()
        .map(|k| k.to_string())
        .collect()
}

fn default_knowledge_entries() -> Vec<KnowledgeEntryConfig> {
    vec![
        KnowledgeEntryConfig {
            key: "create pr".to_string(),
            answer: "To create a Pull Request, first open the Pull Requests tab.\n\
                     Then click the green \"New pull request\" button and pick \
                     the branches to compare."
                .to_string(),
            directives: vec![
                "ACTION:highlight_zone:arc-tl:.UnderlineNav-item[data-tab-item=\"pull-requests-tab\"]:3000"
                    .to_string(),
                "ACTION:highlight_zone:center:a[href*=\"/compare\"]:2500".to_string(),
            ],
        },
        KnowledgeEntryConfig {
            key: "create pull request".to_string(),
            answer: "Open the Pull Requests tab and click \"New pull request\" \
                     to start comparing branches."
                .to_string(),
            directives: vec![
                "ACTION:highlight_zone:arc-tl:.UnderlineNav-item[data-tab-item=\"pull-requests-tab\"]:3000"
                    .to_string(),
                "ACTION:highlight_zone:center:a[href*=\"/compare\"]:2500".to_string(),
            ],
        },
        KnowledgeEntryConfig {
            key: "open issues".to_string(),
            answer: "The Issues tab lists all open issues for this repository."
                .to_string(),
            directives: vec![
                "ACTION:highlight_zone:arc-tl:a[data-tab-item=\"issues-tab\"]:3000".to_string(),
            ],
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_toml() -> &'static str {
        r#"
[server]
host = "127.0.0.1"
port = 8000
"#
    }

    #[test]
    fn minimal_config_parses_with_defaults() {
        let config: Config = toml::from_str(minimal_toml()).expect("should parse");
        config.validate().expect("should validate");

        assert!(config.providers.anthropic.is_none());
        assert_eq!(config.providers.ollama.base_url(), "http://127.0.0.1:11434");
        assert_eq!(config.providers.ollama.probe_timeout_seconds(), 2);
        assert_eq!(config.limits.context_cap_chars, 2500);
        assert_eq!(config.limits.stream_timeout_seconds, 60);
        assert_eq!(config.observability.log_level, "info");
        assert!(!config.knowledge.entries.is_empty());
        assert!(
            config
                .knowledge
                .intent_keywords
                .iter()
                .any(|k| k == "pull request")
        );
    }

    #[test]
    fn anthropic_section_enables_credentialed_provider() {
        let toml = r#"
[server]
host = "127.0.0.1"
port = 8000

[providers.anthropic]
api_key = "sk-test-key"
"#;
        let config: Config = toml::from_str(toml).expect("should parse");
        config.validate().expect("should validate");
        let anthropic = config.providers.anthropic.expect("section present");
        assert_eq!(anthropic.api_key(), "sk-test-key");
        assert_eq!(anthropic.base_url(), "https://api.anthropic.com");
        assert_eq!(anthropic.max_tokens(), 1024);
    }

    #[test]
    fn empty_api_key_is_rejected() {
        let toml = r#"
[server]
host = "127.0.0.1"
port = 8000

[providers.anthropic]
api_key = ""
"#;
        let config: Config = toml::from_str(toml).expect("should parse");
        let err = config.validate().expect_err("should reject empty api_key");
        assert!(err.to_string().contains("api_key"));
    }

    #[test]
    fn probe_timeout_bounds_are_enforced() {
        let toml = r#"
[server]
host = "127.0.0.1"
port = 8000

[providers.ollama]
probe_timeout_seconds = 0
"#;
        let config: Config = toml::from_str(toml).expect("should parse");
        assert!(config.validate().is_err());
    }

    #[test]
    fn custom_knowledge_entries_replace_defaults() {
        let toml = r#"
[server]
host = "127.0.0.1"
port = 8000

[[knowledge.entries]]
key = "merge branch"
answer = "Use the merge button."
directives = ["ACTION:highlight_zone:center:.merge-btn:2000"]
"#;
        let config: Config = toml::from_str(toml).expect("should parse");
        config.validate().expect("should validate");
        assert_eq!(config.knowledge.entries.len(), 1);
        assert_eq!(config.knowledge.entries[0].key, "merge branch");
        // Keyword list still defaults when only entries are overridden.
        assert!(config.knowledge.intent_keywords.contains(&"how".to_string()));
    }

    #[test]
    fn empty_knowledge_key_is_rejected() {
        let toml = r#"
[server]
host = "127.0.0.1"
port = 8000

[[knowledge.entries]]
key = "  "
answer = "answer"
"#;
        let config: Config = toml::from_str(toml).expect("should parse");
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_file_is_a_config_error() {
        let err = Config::from_file("/nonexistent/guidepost.toml").expect_err("should fail");
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
