//! Ollama chat adapter (remote LLM B)
//!
//! Local-network chat service gated by a short-timeout liveness probe made
//! immediately before use. Streams NDJSON from `/api/chat`; each line is one
//! JSON envelope carrying `message.content` and a `done` flag.

use super::{GuidanceQuery, LineOutcome, Provider, TokenStream, stream_lines};
use crate::config::OllamaConfig;
use crate::error::ProviderError;
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

pub struct OllamaProvider {
    config: OllamaConfig,
    /// Probe client with the short liveness timeout
    probe_client: reqwest::Client,
    /// Streaming client with the long request timeout
    client: reqwest::Client,
}

impl OllamaProvider {
    pub fn new(config: OllamaConfig, stream_timeout: Duration) -> Self {
        let probe_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.probe_timeout_seconds()))
            .build()
            .unwrap_or_default();
        let client = reqwest::Client::builder()
            .timeout(stream_timeout)
            .build()
            .unwrap_or_default();
        Self {
            config,
            probe_client,
            client,
        }
    }
}

#[async_trait]
impl Provider for OllamaProvider {
    fn name(&self) -> &'static str {
        "ollama"
    }

    /// Short-timeout GET against the service root
    ///
    /// Runs on every selection so a service that just went down is demoted
    /// before any streaming request is attempted.
    async fn available(&self) -> bool {
        match self.probe_client.get(self.config.base_url()).send().await {
            Ok(response) => {
                let alive = response.status().is_success();
                if !alive {
                    tracing::debug!(
                        status = %response.status(),
                        "Ollama liveness probe returned non-success"
                    );
                }
                alive
            }
            Err(e) => {
                tracing::debug!(error = %e, "Ollama liveness probe failed");
                false
            }
        }
    }

    async fn open(&self, query: &GuidanceQuery) -> Result<TokenStream, ProviderError> {
        let body = serde_json::json!({
            "model": self.config.model(),
            "messages": [
                {"role": "system", "content": query.system_prompt()},
                {"role": "user", "content": query.query()}
            ],
            "stream": true,
        });

        let response = self
            .client
            .post(format!("{}/api/chat", self.config.base_url()))
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::Connect(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ProviderError::Connect(format!(
                "chat endpoint returned {}",
                response.status()
            )));
        }

        Ok(stream_lines(response, decode_chat_line))
    }
}

/// Decode one NDJSON envelope line from `/api/chat`
///
/// `done: true` ends the stream; lines that fail to decode are skipped so a
/// single malformed envelope never kills the request.
fn decode_chat_line(line: &str) -> LineOutcome {
    if line.trim().is_empty() {
        return LineOutcome::Skip;
    }

    let Ok(value) = serde_json::from_str::<Value>(line) else {
        tracing::debug!("Skipping undecodable chat envelope line");
        return LineOutcome::Skip;
    };

    if value.get("done").and_then(Value::as_bool) == Some(true) {
        return LineOutcome::End;
    }

    match value
        .pointer("/message/content")
        .and_then(Value::as_str)
        .filter(|text| !text.is_empty())
    {
        Some(text) => LineOutcome::Text(text.to_string()),
        None => LineOutcome::Skip,
    }
}
