//! Command-line interface for Guidepost
//!
//! Provides argument parsing and subcommand handling for the Guidepost
//! binary.

use clap::{Parser, Subcommand};

/// Streaming guidance server for browser extensions
#[derive(Parser)]
#[command(name = "guidepost")]
#[command(version)]
#[command(about = "Streaming guidance server: answers with inline UI highlight directives")]
#[command(
    long_about = "Guidepost streams model answers to a browser extension while extracting \
    embedded ACTION highlight directives, failing over between a remote chat API, a \
    local-network model server, and a built-in answer table."
)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml", global = true)]
    pub config: String,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Generate a template configuration file
    Config {
        /// Output file path (prints to stdout if not specified)
        #[arg(short, long)]
        output: Option<String>,
    },
}

/// Generate template configuration content
pub fn generate_config_template() -> &'static str {
    r#"# Guidepost Configuration
# =======================
#
# This file configures the HTTP server, provider backends, request limits,
# observability, and the local knowledge table.

[server]
# IP address to bind to (0.0.0.0 for all interfaces, 127.0.0.1 for localhost only)
host = "127.0.0.1"

# Port to listen on
port = 8000

# ─────────────────────────────────────────────────────────────────────────────
# PROVIDERS
# ─────────────────────────────────────────────────────────────────────────────
#
# Providers are tried in fixed priority order:
#   1. anthropic - only when an api_key is configured
#   2. ollama    - only when its liveness probe passes
#   3. the local knowledge table - always available
#
# A missing [providers.anthropic] section simply demotes to the next provider.

# [providers.anthropic]
# api_key = "sk-..."
# model = "claude-3-5-haiku-latest"
# base_url = "https://api.anthropic.com"
# max_tokens = 1024

[providers.ollama]
base_url = "http://127.0.0.1:11434"
model = "qwen2.5-coder:7b"
# Liveness probe timeout in seconds (1-30)
probe_timeout_seconds = 2

# ─────────────────────────────────────────────────────────────────────────────
# LIMITS
# ─────────────────────────────────────────────────────────────────────────────

[limits]
# Page-context snippet cap in characters
context_cap_chars = 2500
# Full provider streaming timeout in seconds
stream_timeout_seconds = 60

# ─────────────────────────────────────────────────────────────────────────────
# OBSERVABILITY
# ─────────────────────────────────────────────────────────────────────────────

[observability]
# Log level: "trace", "debug", "info", "warn", "error"
log_level = "info"

# ─────────────────────────────────────────────────────────────────────────────
# KNOWLEDGE TABLE
# ─────────────────────────────────────────────────────────────────────────────
#
# Canned answers with pre-built highlight directives. Keys are matched as
# substrings of the normalized query; the longest matching key wins. Listing
# any entry replaces the built-in defaults.
#
# Directive literals have the form:
#   ACTION:<type>:<zone>:<css-selector>:<duration-ms>
# where <zone> is one of center, arc-tl, arc-tr, arc-bl, arc-br.

# [knowledge]
# intent_keywords = ["how", "where", "create", "open", "navigate", "find", "pull request"]

# [[knowledge.entries]]
# key = "create pr"
# answer = "Open the Pull Requests tab, then click New pull request."
# directives = [
#     "ACTION:highlight_zone:arc-tl:.UnderlineNav-item[data-tab-item=\"pull-requests-tab\"]:3000",
#     "ACTION:highlight_zone:center:a[href*=\"/compare\"]:2500",
# ]
"#
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        // Clap's built-in verification for the CLI structure
        Cli::command().debug_assert();
    }

    #[test]
    fn default_config_path() {
        let cli = Cli::parse_from(["guidepost"]);
        assert_eq!(cli.config, "config.toml");
        assert!(cli.command.is_none());
    }

    #[test]
    fn custom_config_path() {
        let cli = Cli::parse_from(["guidepost", "--config", "custom.toml"]);
        assert_eq!(cli.config, "custom.toml");
    }

    #[test]
    fn config_subcommand() {
        let cli = Cli::parse_from(["guidepost", "config"]);
        assert!(matches!(cli.command, Some(Command::Config { output: None })));
    }

    #[test]
    fn config_subcommand_with_output() {
        let cli = Cli::parse_from(["guidepost", "config", "-o", "my-config.toml"]);
        assert!(matches!(
            cli.command,
            Some(Command::Config { output: Some(ref path) }) if path == "my-config.toml"
        ));
    }

    #[test]
    fn template_is_valid_toml() {
        let template = generate_config_template();
        let result: Result<toml::Value, _> = toml::from_str(template);
        assert!(
            result.is_ok(),
            "Template should be valid TOML: {:?}",
            result.err()
        );
    }

    #[test]
    fn template_parses_as_full_config() {
        let template = generate_config_template();
        let config: crate::config::Config =
            toml::from_str(template).expect("template should parse as Config");
        config.validate().expect("template should validate");
    }

    #[test]
    fn template_has_all_sections() {
        let template = generate_config_template();
        assert!(template.contains("[server]"));
        assert!(template.contains("[providers.ollama]"));
        assert!(template.contains("[limits]"));
        assert!(template.contains("[observability]"));
        assert!(template.contains("knowledge.entries"));
    }
}
