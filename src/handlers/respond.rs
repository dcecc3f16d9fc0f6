//! Respond endpoint handler
//!
//! Handles `POST /respond`: one user query in, a chunked NDJSON body out,
//! one serialized `StreamEvent` per line.

use crate::directive::StreamEvent;
use crate::error::AppError;
use crate::handlers::AppState;
use crate::middleware::RequestId;
use crate::providers::GuidanceQuery;
use axum::{
    Extension, Json,
    body::Body,
    extract::State,
    http::header,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Deserializer, Serialize};

/// Maximum allowed query length in characters
const MAX_QUERY_LENGTH: usize = 10_000;

/// Respond request from the extension
///
/// Validation is enforced during deserialization - invalid instances cannot
/// exist. The context snippet is accepted at any length here and capped when
/// the `GuidanceQuery` is built.
#[derive(Debug, Clone, Serialize)]
pub struct RespondRequest {
    query: String,
    tool_name: Option<String>,
    context: String,
}

impl RespondRequest {
    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn tool_name(&self) -> Option<&str> {
        self.tool_name.as_deref()
    }

    pub fn context(&self) -> &str {
        &self.context
    }
}

/// Custom Deserialize implementation that validates during deserialization
impl<'de> Deserialize<'de> for RespondRequest {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct RawRespondRequest {
            query: String,
            #[serde(default)]
            tool_name: Option<String>,
            #[serde(default)]
            context: String,
        }

        let raw = RawRespondRequest::deserialize(deserializer)?;

        if raw.query.trim().is_empty() {
            return Err(serde::de::Error::custom(
                "query cannot be empty or contain only whitespace",
            ));
        }

        let char_count = raw.query.chars().count();
        if char_count > MAX_QUERY_LENGTH {
            return Err(serde::de::Error::custom(format!(
                "query exceeds maximum length of {} characters (got {})",
                MAX_QUERY_LENGTH, char_count
            )));
        }

        Ok(RespondRequest {
            query: raw.query,
            tool_name: raw.tool_name,
            context: raw.context,
        })
    }
}

/// POST /respond handler
///
/// Spawns the per-request orchestration task and hands its event channel to
/// the caller as a line-delimited stream. Events that somehow fail to
/// serialize are dropped rather than corrupting the line protocol; the
/// terminal `done`/`error` line always comes from the orchestrator itself.
pub async fn handler(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Json(request): Json<RespondRequest>,
) -> Result<Response, AppError> {
    tracing::debug!(
        request_id = %request_id,
        query_length = request.query().len(),
        tool_name = ?request.tool_name(),
        context_length = request.context().len(),
        "Received respond request"
    );

    let query = GuidanceQuery::new(
        request.query().to_string(),
        request.tool_name().map(|t| t.to_string()),
        request.context().to_string(),
        state.config().limits.context_cap_chars,
    );

    let rx = state.orchestrator().respond(query);

    let lines = futures::stream::unfold(rx, |mut rx| async move {
        let event = rx.recv().await?;
        Some((encode_line(&event), rx))
    });

    let body = Body::from_stream(
        futures::StreamExt::filter_map(lines, |line| async move {
            line.map(Ok::<_, std::convert::Infallible>)
        }),
    );

    Ok((
        [(header::CONTENT_TYPE, "application/x-ndjson")],
        body,
    )
        .into_response())
}

/// Serialize one event as an NDJSON line
fn encode_line(event: &StreamEvent) -> Option<String> {
    match serde_json::to_string(event) {
        Ok(json) => Some(format!("{}\n", json)),
        Err(e) => {
            tracing::error!(error = %e, "Failed to serialize stream event, dropping line");
            None
        }
    }
}
