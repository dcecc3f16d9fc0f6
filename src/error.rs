//! Error types for Guidepost
//!
//! `AppError` covers startup and stream-level failures and implements
//! `IntoResponse` for Axum handlers. `ProviderError` is the adapter-level
//! taxonomy the orchestrator uses to decide between fallback and terminal
//! failure.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Main error type for the application
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("All providers exhausted without producing output")]
    ProvidersExhausted,

    #[error(
        "Stream interrupted from {provider} after forwarding {events_forwarded} events: {reason}"
    )]
    StreamInterrupted {
        provider: String,
        events_forwarded: usize,
        reason: String,
    },
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::Config(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
            Self::ProvidersExhausted | Self::StreamInterrupted { .. } => {
                (StatusCode::BAD_GATEWAY, self.to_string())
            }
        };

        let body = Json(serde_json::json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}

/// Convenience type alias for Results
pub type AppResult<T> = Result<T, AppError>;

/// Adapter-level failure taxonomy
///
/// `Connect` means no usable bytes were ever received (precondition failed,
/// probe failed, or the connection never opened) - the orchestrator may fall
/// back to the next provider. `Stream` means the connection was lost after
/// partial output - whether fallback is still safe depends on how much the
/// orchestrator already forwarded to the caller.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Provider unavailable: {0}")]
    Connect(String),

    #[error("Stream failure: {0}")]
    Stream(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_message() {
        let err = AppError::Config("missing section".to_string());
        assert_eq!(err.to_string(), "Configuration error: missing section");
    }

    #[test]
    fn stream_interrupted_message_carries_progress() {
        let err = AppError::StreamInterrupted {
            provider: "ollama".to_string(),
            events_forwarded: 3,
            reason: "connection reset".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("ollama"));
        assert!(msg.contains("3 events"));
        assert!(msg.contains("connection reset"));
    }

    #[test]
    fn providers_exhausted_response_status() {
        let err = AppError::ProvidersExhausted;
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn stream_interrupted_response_status() {
        let err = AppError::StreamInterrupted {
            provider: "anthropic".to_string(),
            events_forwarded: 1,
            reason: "connection reset".to_string(),
        };
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn provider_error_messages() {
        let connect = ProviderError::Connect("probe timed out".to_string());
        assert_eq!(connect.to_string(), "Provider unavailable: probe timed out");

        let stream = ProviderError::Stream("body dropped".to_string());
        assert_eq!(stream.to_string(), "Stream failure: body dropped");
    }
}
