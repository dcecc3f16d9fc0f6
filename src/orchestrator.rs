//! Failover orchestrator
//!
//! Drives one request through an explicit state machine:
//!
//! ```text
//! SELECT -> STREAMING -> FALLBACK -> DONE
//!              |    \________/ (only while nothing was forwarded)
//!              v
//!            DONE (success, or terminal error after partial output)
//! ```
//!
//! SELECT walks the providers in fixed priority order and picks the first
//! whose precondition holds. STREAMING accumulates the provider's token
//! chunks into a task-local transcript; the text before the first `ACTION:`
//! marker is forwarded the moment the marker appears, everything else is
//! parsed once the provider completes (a marker can be split across chunk
//! boundaries, so only the completed transcript is unambiguous). A provider
//! failure before anything was forwarded demotes to the next provider; a
//! failure after partial output is terminal, because the caller must never
//! receive duplicated or contradicting content. Exactly one `done` (or
//! `error`) event ends every request.

use crate::directive::{self, ACTION_MARKER, StreamEvent};
use crate::error::{AppError, ProviderError};
use crate::inject;
use crate::knowledge::KnowledgeBase;
use crate::providers::{GuidanceQuery, Provider};
use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Per-request orchestration over a fixed provider priority chain
///
/// Shared read-only across requests; each `respond` call spawns its own
/// task, and all mutable state lives inside that task.
pub struct Orchestrator {
    providers: Vec<Arc<dyn Provider>>,
    knowledge: Arc<KnowledgeBase>,
    intent_keywords: Vec<String>,
    stream_timeout: Duration,
}

/// What became of driving a single provider to completion
enum DriveOutcome {
    /// Stream completed; transcript is final
    Success,
    /// Failed before any event was forwarded; fallback is safe
    Unavailable(ProviderError),
    /// Failed after partial output reached the caller; terminal
    MidStreamFailure {
        error: ProviderError,
        events_forwarded: usize,
    },
}

impl Orchestrator {
    pub fn new(
        providers: Vec<Arc<dyn Provider>>,
        knowledge: Arc<KnowledgeBase>,
        intent_keywords: Vec<String>,
        stream_timeout: Duration,
    ) -> Self {
        Self {
            providers,
            knowledge,
            intent_keywords,
            stream_timeout,
        }
    }

    /// Answer one query as an ordered stream of events
    ///
    /// Events arrive in strict production order and always end with exactly
    /// one `done` or `error`. The returned receiver is backed by a dedicated
    /// task; dropping it aborts that task at its next send.
    pub fn respond(self: &Arc<Self>, query: GuidanceQuery) -> mpsc::Receiver<StreamEvent> {
        let (tx, rx) = mpsc::channel(32);
        let orchestrator = Arc::clone(self);
        tokio::spawn(async move {
            orchestrator.run(query, tx).await;
        });
        rx
    }

    /// The state machine proper; one invocation per request
    async fn run(&self, query: GuidanceQuery, tx: mpsc::Sender<StreamEvent>) {
        // SELECT: fixed priority order, first passing precondition wins.
        // FALLBACK re-enters this loop at the next provider.
        for provider in &self.providers {
            if !provider.available().await {
                tracing::debug!(provider = provider.name(), "Provider precondition failed, demoting");
                continue;
            }

            tracing::info!(provider = provider.name(), "Provider selected");

            match self.drive(provider.as_ref(), &query, &tx).await {
                DriveOutcome::Success => return,
                DriveOutcome::Unavailable(e) => {
                    tracing::warn!(
                        provider = provider.name(),
                        error = %e,
                        "Provider failed before any output, falling back"
                    );
                    // Buffered partial transcript was owned by drive() and is
                    // discarded with it; the next provider restarts clean.
                    continue;
                }
                DriveOutcome::MidStreamFailure {
                    error,
                    events_forwarded,
                } => {
                    tracing::error!(
                        provider = provider.name(),
                        error = %error,
                        events_forwarded,
                        "Stream failed after partial output, terminating without fallback"
                    );
                    let terminal = AppError::StreamInterrupted {
                        provider: provider.name().to_string(),
                        events_forwarded,
                        reason: error.to_string(),
                    };
                    let _ = tx
                        .send(StreamEvent::Error {
                            message: terminal.to_string(),
                        })
                        .await;
                    return;
                }
            }
        }

        // All providers exhausted with zero output forwarded.
        tracing::error!("All providers exhausted without producing output");
        let _ = tx
            .send(StreamEvent::Error {
                message: AppError::ProvidersExhausted.to_string(),
            })
            .await;
    }

    /// STREAMING: drive one provider to completion or failure
    async fn drive(
        &self,
        provider: &dyn Provider,
        query: &GuidanceQuery,
        tx: &mpsc::Sender<StreamEvent>,
    ) -> DriveOutcome {
        let mut stream = match provider.open(query).await {
            Ok(stream) => stream,
            Err(e) => return DriveOutcome::Unavailable(e),
        };

        // Task-local per-request state; nothing here outlives the request.
        let mut transcript = String::new();
        let mut events_forwarded = 0usize;
        // Byte offset into `transcript` up to which events were already
        // forwarded (0 or the position of the first marker).
        let mut forwarded_up_to = 0usize;
        let mut marker_seen = false;

        let deadline = tokio::time::sleep(self.stream_timeout);
        tokio::pin!(deadline);

        loop {
            let item = tokio::select! {
                item = stream.next() => item,
                _ = &mut deadline => {
                    let timeout = ProviderError::Stream(format!(
                        "no completion within {:?}",
                        self.stream_timeout
                    ));
                    return if events_forwarded == 0 {
                        DriveOutcome::Unavailable(timeout)
                    } else {
                        DriveOutcome::MidStreamFailure {
                            error: timeout,
                            events_forwarded,
                        }
                    };
                }
            };

            match item {
                Some(Ok(chunk)) => {
                    transcript.push_str(chunk.as_str());

                    // Latency optimization: once the first marker shows up,
                    // the prose before it is complete and safe to forward.
                    if !marker_seen {
                        if let Some(pos) = transcript.find(ACTION_MARKER) {
                            marker_seen = true;
                            forwarded_up_to = pos;
                            if let Some(event) = StreamEvent::message(&transcript[..pos]) {
                                if tx.send(event).await.is_err() {
                                    tracing::debug!("Caller disconnected, aborting request task");
                                    return DriveOutcome::Success;
                                }
                                events_forwarded += 1;
                            }
                        }
                    }
                }
                Some(Err(e)) => {
                    return if events_forwarded == 0 {
                        DriveOutcome::Unavailable(e)
                    } else {
                        DriveOutcome::MidStreamFailure {
                            error: e,
                            events_forwarded,
                        }
                    };
                }
                None => break,
            }
        }

        // Transcript complete: parse everything not yet forwarded. When a
        // marker was seen the remainder starts at the marker itself so the
        // directive fields are parsed in full.
        let mut events = directive::parse(&transcript[forwarded_up_to..]);
        let directive_count = events
            .iter()
            .filter(|e| matches!(e, StreamEvent::Action(_)))
            .count();

        // Injection heuristic: only when the model produced no directive.
        if directive_count == 0 {
            let injected =
                inject::inject_directives(query.query(), &self.intent_keywords, &self.knowledge);
            events.extend(injected.into_iter().map(StreamEvent::Action));
        }

        tracing::info!(
            provider = provider.name(),
            transcript_chars = transcript.chars().count(),
            events = events.len(),
            directives = directive_count,
            "Stream complete"
        );

        for event in events {
            if tx.send(event).await.is_err() {
                tracing::debug!("Caller disconnected, aborting request task");
                return DriveOutcome::Success;
            }
            events_forwarded += 1;
        }

        tracing::debug!(
            provider = provider.name(),
            events_forwarded,
            "All events delivered"
        );
        let _ = tx.send(StreamEvent::Done).await;
        DriveOutcome::Success
    }
}
