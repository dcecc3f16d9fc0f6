//! Local knowledge matcher
//!
//! A fixed, read-only mapping from lowercase keyword phrases to canned
//! answers with pre-built directive literals. Used both as the terminal
//! fallback provider's answer source and as the injection heuristic's
//! directive source. Built once at startup from configuration and shared
//! read-only across requests, so no synchronization is needed.

use crate::config::KnowledgeEntryConfig;

/// Delimiter that separates a caller-prepended prompt wrapper from the
/// actual user question. Only text after the delimiter is matched.
const WRAPPER_DELIMITER: &str = "user question:";

/// One canned answer with its pre-built directive literals
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnowledgeEntry {
    /// Lowercase keyword phrase this entry matches on
    key: String,
    /// Multi-line canned answer replayed by the local provider
    answer: String,
    /// Ordered directive literals (`ACTION:...` strings)
    directives: Vec<String>,
}

impl KnowledgeEntry {
    pub fn new(key: String, answer: String, directives: Vec<String>) -> Self {
        Self {
            key: strip_articles(&key.to_lowercase()),
            answer,
            directives,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn answer(&self) -> &str {
        &self.answer
    }

    pub fn directives(&self) -> &[String] {
        &self.directives
    }
}

/// The read-only keyword-to-answer table
///
/// Lookup selects the longest key that is a substring of the normalized
/// query, with ties broken by key text, so results are deterministic for any
/// entry ordering in the config file.
#[derive(Debug, Clone)]
pub struct KnowledgeBase {
    entries: Vec<KnowledgeEntry>,
}

impl KnowledgeBase {
    /// Build the table from configuration entries
    ///
    /// Entries are sorted by descending key length, then by key text, so
    /// `lookup` can return the first substring hit.
    pub fn new(entries: impl IntoIterator<Item = KnowledgeEntryConfig>) -> Self {
        let mut entries: Vec<KnowledgeEntry> = entries
            .into_iter()
            .map(|e| KnowledgeEntry::new(e.key, e.answer, e.directives))
            .collect();
        entries.sort_by(|a, b| {
            b.key
                .len()
                .cmp(&a.key.len())
                .then_with(|| a.key.cmp(&b.key))
        });
        Self { entries }
    }

    /// Number of entries in the table
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Find the best canned answer for a query
    ///
    /// Pure and total: normalizes the query (lowercase, wrapper stripped) and
    /// returns the longest-key substring match, or `None` when nothing
    /// matches. Never a default answer, never an error.
    pub fn lookup(&self, query: &str) -> Option<&KnowledgeEntry> {
        let normalized = normalize_query(query);
        self.entries
            .iter()
            .find(|entry| normalized.contains(entry.key()))
    }
}

/// Lowercase the query, strip any prompt wrapper the caller prepended, and
/// drop English articles
///
/// A wrapper looks like `...system preamble... User question: <question>`;
/// only the text after the delimiter participates in matching so that
/// preamble phrasing can never trigger an entry. Articles are removed on
/// both sides of the match ("create a pr" and "create pr" are the same
/// phrase), and whitespace is collapsed to single spaces.
pub fn normalize_query(query: &str) -> String {
    let lowered = query.to_lowercase();
    let unwrapped = match lowered.rfind(WRAPPER_DELIMITER) {
        Some(idx) => &lowered[idx + WRAPPER_DELIMITER.len()..],
        None => &lowered,
    };
    strip_articles(unwrapped)
}

/// Remove standalone articles and collapse whitespace
fn strip_articles(text: &str) -> String {
    text.split_whitespace()
        .filter(|word| !matches!(*word, "a" | "an" | "the"))
        .collect::<Vec<_>>()
        .join(" ")
}
