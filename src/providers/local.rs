//! Local answer provider (terminal fallback)
//!
//! Always available. Synthesizes its stream from the knowledge table,
//! replaying the canned answer word by word with a fixed inter-chunk delay
//! so the client sees the same pacing contract as a live provider, then
//! appends the entry's directive literals. The directives travel as ordinary
//! `ACTION:` text and are extracted by the same parser that handles live
//! model output.

use super::{GuidanceQuery, Provider, TokenStream};
use crate::error::ProviderError;
use crate::knowledge::KnowledgeBase;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Pacing delay between word chunks
const WORD_DELAY: Duration = Duration::from_millis(20);

/// Answer used when nothing in the table matches
const FALLBACK_ANSWER: &str =
    "I don't have a stored answer for that yet. Try rephrasing, or ask about \
     a specific button or tab on this page.";

pub struct LocalProvider {
    knowledge: Arc<KnowledgeBase>,
}

impl LocalProvider {
    pub fn new(knowledge: Arc<KnowledgeBase>) -> Self {
        Self { knowledge }
    }
}

#[async_trait]
impl Provider for LocalProvider {
    fn name(&self) -> &'static str {
        "local"
    }

    /// The local table is process memory; it is never unavailable
    async fn available(&self) -> bool {
        true
    }

    async fn open(&self, query: &GuidanceQuery) -> Result<TokenStream, ProviderError> {
        let (answer, directives) = match self.knowledge.lookup(query.query()) {
            Some(entry) => {
                tracing::debug!(key = entry.key(), "Local provider matched knowledge entry");
                (entry.answer().to_string(), entry.directives().to_vec())
            }
            None => {
                tracing::debug!("Local provider using fallback answer");
                (FALLBACK_ANSWER.to_string(), Vec::new())
            }
        };

        // Word-granularity chunks, each carrying its trailing space, so the
        // concatenated transcript reads naturally.
        let mut chunks: Vec<String> = answer
            .split_whitespace()
            .map(|word| format!("{} ", word))
            .collect();
        for literal in &directives {
            chunks.push(format!("{} ", literal));
        }

        let stream = futures::stream::unfold(chunks.into_iter(), |mut chunks| async move {
            let chunk = chunks.next()?;
            tokio::time::sleep(WORD_DELAY).await;
            Some((Ok(chunk.into()), chunks))
        });

        Ok(Box::pin(stream))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::KnowledgeEntryConfig;
    use futures::StreamExt;

    fn knowledge() -> Arc<KnowledgeBase> {
        Arc::new(KnowledgeBase::new(vec![KnowledgeEntryConfig {
            key: "create pr".to_string(),
            answer: "Open the Pull Requests tab.".to_string(),
            directives: vec![
                "ACTION:highlight_zone:arc-tl:.UnderlineNav-item:3000".to_string(),
            ],
        }]))
    }

    async fn collect_transcript(provider: &LocalProvider, query: &str) -> String {
        let query = GuidanceQuery::new(query.to_string(), None, String::new(), 2500);
        let mut stream = provider.open(&query).await.expect("local always opens");
        let mut transcript = String::new();
        while let Some(chunk) = stream.next().await {
            transcript.push_str(chunk.expect("local never errors").as_str());
        }
        transcript
    }

    #[tokio::test]
    async fn matched_query_replays_answer_and_directives() {
        let provider = LocalProvider::new(knowledge());
        let transcript = collect_transcript(&provider, "how do I create a pr").await;

        assert!(transcript.contains("Open the Pull Requests tab."));
        assert!(transcript.contains("ACTION:highlight_zone:arc-tl:.UnderlineNav-item:3000"));
        // Answer text precedes the directive literal.
        let answer_pos = transcript.find("Pull Requests").unwrap();
        let action_pos = transcript.find("ACTION:").unwrap();
        assert!(answer_pos < action_pos);
    }

    #[tokio::test]
    async fn unmatched_query_gets_fallback_without_directives() {
        let provider = LocalProvider::new(knowledge());
        let transcript = collect_transcript(&provider, "what is rust").await;

        assert!(transcript.contains("stored answer"));
        assert!(!transcript.contains("ACTION:"));
    }

    #[tokio::test]
    async fn chunks_are_word_granular() {
        let provider = LocalProvider::new(knowledge());
        let query = GuidanceQuery::new(
            "how do I create a pr".to_string(),
            None,
            String::new(),
            2500,
        );
        let mut stream = provider.open(&query).await.expect("local always opens");
        let first = stream.next().await.expect("has chunks").expect("ok");
        assert_eq!(first.as_str(), "Open ");
    }

    #[tokio::test]
    async fn local_is_always_available() {
        let provider = LocalProvider::new(knowledge());
        assert!(provider.available().await);
    }
}
