//! Provider adapters
//!
//! A provider is one backend capable of producing a token stream for a
//! query. All transport differences (SSE deltas, NDJSON envelopes, canned
//! replay) stay behind the `Provider` trait: the orchestrator only ever sees
//! normalized `TokenChunk`s.

pub mod anthropic;
pub mod local;
pub mod ollama;

pub use anthropic::AnthropicProvider;
pub use local::LocalProvider;
pub use ollama::OllamaProvider;

use crate::error::ProviderError;
use async_trait::async_trait;
use futures::Stream;
use std::pin::Pin;

/// An opaque text fragment delivered by a provider
///
/// Chunks are ordered; concatenating them forms the per-request transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenChunk(pub String);

impl TokenChunk {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for TokenChunk {
    fn from(text: String) -> Self {
        Self(text)
    }
}

impl From<&str> for TokenChunk {
    fn from(text: &str) -> Self {
        Self(text.to_string())
    }
}

/// Normalized token stream produced by an adapter
pub type TokenStream = Pin<Box<dyn Stream<Item = Result<TokenChunk, ProviderError>> + Send>>;

/// Uniform interface over the three backends
///
/// `available` is the selection precondition (credential present, liveness
/// probe passes, or always-true for the local table); `open` drives the
/// actual stream. Adapters never retry internally - retry and fallback
/// boundaries belong to the orchestrator.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Short name for logs and error messages
    fn name(&self) -> &'static str;

    /// Whether this provider's selection precondition currently holds
    async fn available(&self) -> bool;

    /// Open a token stream for the query
    ///
    /// A `ProviderError::Connect` here means no output was ever produced and
    /// the orchestrator is free to fall back.
    async fn open(&self, query: &GuidanceQuery) -> Result<TokenStream, ProviderError>;
}

/// Outcome of decoding one line of a provider's wire envelope
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum LineOutcome {
    /// The line carried token text
    Text(String),
    /// The line was empty, keep-alive, or malformed - skip it
    Skip,
    /// The provider signalled end of stream
    End,
}

/// Convert a chunked HTTP response body into a normalized token stream
///
/// Splits the body on newlines, feeds each complete line through the
/// adapter's `decode` function, and skips anything it cannot make sense of
/// so one malformed envelope line never kills the stream. A transport error
/// mid-body surfaces as `ProviderError::Stream`.
pub(crate) fn stream_lines<F>(response: reqwest::Response, decode: F) -> TokenStream
where
    F: Fn(&str) -> LineOutcome + Send + 'static,
{
    use futures::StreamExt;

    struct State<S, F> {
        body: Pin<Box<S>>,
        buffer: Vec<u8>,
        pending: std::collections::VecDeque<String>,
        decode: F,
        finished: bool,
    }

    let state = State {
        body: Box::pin(response.bytes_stream()),
        buffer: Vec::new(),
        pending: std::collections::VecDeque::new(),
        decode,
        finished: false,
    };

    Box::pin(futures::stream::unfold(state, |mut state| async move {
        loop {
            if let Some(text) = state.pending.pop_front() {
                return Some((Ok(TokenChunk(text)), state));
            }
            if state.finished {
                return None;
            }

            match state.body.next().await {
                Some(Ok(bytes)) => {
                    // Buffer raw bytes and decode per complete line: a
                    // multi-byte code point split across body chunks must
                    // never be decoded in halves.
                    state.buffer.extend_from_slice(&bytes);
                    while let Some(newline) = state.buffer.iter().position(|&b| b == b'\n') {
                        let line: Vec<u8> = state.buffer.drain(..=newline).collect();
                        let line = String::from_utf8_lossy(&line);
                        match (state.decode)(line.trim_end()) {
                            LineOutcome::Text(text) => state.pending.push_back(text),
                            LineOutcome::Skip => {}
                            LineOutcome::End => {
                                state.finished = true;
                                break;
                            }
                        }
                    }
                }
                Some(Err(e)) => {
                    state.finished = true;
                    return Some((Err(ProviderError::Stream(e.to_string())), state));
                }
                None => {
                    state.finished = true;
                    // Flush a final unterminated line, if any
                    if !state.buffer.is_empty() {
                        let line = std::mem::take(&mut state.buffer);
                        let line = String::from_utf8_lossy(&line);
                        if let LineOutcome::Text(text) = (state.decode)(line.trim_end()) {
                            state.pending.push_back(text);
                        }
                    }
                }
            }
        }
    }))
}

/// One user query with its page context
///
/// Immutable once received. The context snippet is capped before any prompt
/// is built from it.
#[derive(Debug, Clone)]
pub struct GuidanceQuery {
    query: String,
    tool_name: Option<String>,
    context: String,
}

impl GuidanceQuery {
    /// Build a query, capping the context snippet at `context_cap` chars
    pub fn new(query: String, tool_name: Option<String>, context: String, context_cap: usize) -> Self {
        let context = match context.char_indices().nth(context_cap) {
            Some((byte_idx, _)) => context[..byte_idx].to_string(),
            None => context,
        };
        Self {
            query,
            tool_name,
            context,
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn tool_name(&self) -> Option<&str> {
        self.tool_name.as_deref()
    }

    pub fn context(&self) -> &str {
        &self.context
    }

    /// System prompt shared by the remote adapters
    ///
    /// Instructs the model to ground answers in the page context and to emit
    /// `ACTION:` directives for navigable answers.
    pub fn system_prompt(&self) -> String {
        let mut prompt = String::from(
            "You are a contextual assistant that helps users navigate web tools.\n\
             Ground answers in the provided page context. Be concise and actionable.\n\
             When pointing at a UI element, append a directive line of the form\n\
             ACTION:highlight_zone:<zone>:<css-selector>:<duration-ms>\n\
             where <zone> is one of center, arc-tl, arc-tr, arc-bl, arc-br.\n",
        );
        if let Some(tool) = &self.tool_name {
            prompt.push_str(&format!("\nThe user is currently working in {}.\n", tool));
        }
        if !self.context.is_empty() {
            prompt.push_str(&format!("\nCurrent page context:\n{}\n", self.context));
        }
        prompt
    }
}
