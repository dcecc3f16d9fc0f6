//! Anthropic messages adapter (remote LLM A)
//!
//! Chat-style, turn-based backend selected only when an API key is
//! configured. Streams SSE from the messages endpoint and normalizes
//! `content_block_delta` text into `TokenChunk`s. Any failure opening or
//! driving the stream is surfaced to the orchestrator; the adapter never
//! retries internally.

use super::{GuidanceQuery, LineOutcome, Provider, TokenStream, stream_lines};
use crate::config::AnthropicConfig;
use crate::error::ProviderError;
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

/// Wire version header required by the messages API
const ANTHROPIC_VERSION: &str = "2023-06-01";

pub struct AnthropicProvider {
    config: Option<AnthropicConfig>,
    client: reqwest::Client,
}

impl AnthropicProvider {
    /// Build the adapter; `config` is `None` when no credential is set
    pub fn new(config: Option<AnthropicConfig>, stream_timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(stream_timeout)
            .build()
            .unwrap_or_default();
        Self { config, client }
    }
}

#[async_trait]
impl Provider for AnthropicProvider {
    fn name(&self) -> &'static str {
        "anthropic"
    }

    /// Credential presence is the whole precondition; no probe is made
    async fn available(&self) -> bool {
        self.config.is_some()
    }

    async fn open(&self, query: &GuidanceQuery) -> Result<TokenStream, ProviderError> {
        let config = self
            .config
            .as_ref()
            .ok_or_else(|| ProviderError::Connect("no API key configured".to_string()))?;

        let body = serde_json::json!({
            "model": config.model(),
            "max_tokens": config.max_tokens(),
            "system": query.system_prompt(),
            "messages": [
                {"role": "user", "content": query.query()}
            ],
            "stream": true,
        });

        let response = self
            .client
            .post(format!("{}/v1/messages", config.base_url()))
            .header("x-api-key", config.api_key())
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::Connect(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ProviderError::Connect(format!(
                "messages endpoint returned {}",
                response.status()
            )));
        }

        Ok(stream_lines(response, decode_sse_line))
    }
}

/// Decode one SSE line from the messages stream
///
/// Only `content_block_delta` text deltas carry tokens; `message_stop` ends
/// the stream; everything else (event names, pings, keep-alives, malformed
/// JSON) is skipped.
fn decode_sse_line(line: &str) -> LineOutcome {
    let Some(data) = line.strip_prefix("data:") else {
        return LineOutcome::Skip;
    };
    let data = data.trim();
    if data.is_empty() {
        return LineOutcome::Skip;
    }

    let Ok(value) = serde_json::from_str::<Value>(data) else {
        tracing::debug!("Skipping undecodable SSE data line");
        return LineOutcome::Skip;
    };

    match value.get("type").and_then(Value::as_str) {
        Some("content_block_delta") => {
            match value
                .pointer("/delta/text")
                .and_then(Value::as_str)
                .filter(|text| !text.is_empty())
            {
                Some(text) => LineOutcome::Text(text.to_string()),
                None => LineOutcome::Skip,
            }
        }
        Some("message_stop") => LineOutcome::End,
        _ => LineOutcome::Skip,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_delta_yields_token() {
        let line = r#"data: {"type":"content_block_delta","index":0,"delta":{"type":"text_delta","text":"Hello"}}"#;
        assert_eq!(decode_sse_line(line), LineOutcome::Text("Hello".to_string()));
    }

    #[test]
    fn message_stop_ends_stream() {
        assert_eq!(
            decode_sse_line(r#"data: {"type":"message_stop"}"#),
            LineOutcome::End
        );
    }

    #[test]
    fn event_name_lines_are_skipped() {
        assert_eq!(
            decode_sse_line("event: content_block_delta"),
            LineOutcome::Skip
        );
        assert_eq!(decode_sse_line(""), LineOutcome::Skip);
    }

    #[test]
    fn malformed_data_line_is_skipped_not_fatal() {
        assert_eq!(decode_sse_line("data: {not json"), LineOutcome::Skip);
        assert_eq!(decode_sse_line("data: "), LineOutcome::Skip);
    }

    #[test]
    fn other_event_types_are_skipped() {
        assert_eq!(
            decode_sse_line(r#"data: {"type":"message_start","message":{}}"#),
            LineOutcome::Skip
        );
        assert_eq!(
            decode_sse_line(r#"data: {"type":"ping"}"#),
            LineOutcome::Skip
        );
    }

    #[test]
    fn empty_delta_text_is_skipped() {
        let line = r#"data: {"type":"content_block_delta","delta":{"type":"text_delta","text":""}}"#;
        assert_eq!(decode_sse_line(line), LineOutcome::Skip);
    }

    #[tokio::test]
    async fn unconfigured_provider_is_unavailable() {
        let provider = AnthropicProvider::new(None, Duration::from_secs(30));
        assert!(!provider.available().await);

        let query = GuidanceQuery::new("q".to_string(), None, String::new(), 2500);
        let err = provider.open(&query).await.err().expect("open should fail");
        assert!(matches!(err, ProviderError::Connect(_)));
    }
}
