//! Action-injection heuristic
//!
//! A best-effort safety net that runs once per request, after the provider's
//! transcript has been fully parsed, and only when parsing produced zero
//! directives. If the query shows navigation intent and the knowledge table
//! has a matching entry, that entry's pre-built directives are appended so
//! the extension still gets something to highlight.
//!
//! False negatives are acceptable; the heuristic must never point at
//! unrelated UI, so it never fabricates a directive without both a keyword
//! hit and a matcher hit.

use crate::directive::{self, Directive};
use crate::knowledge::{KnowledgeBase, normalize_query};

/// Default navigation-intent keywords used when the config lists none
pub const DEFAULT_INTENT_KEYWORDS: &[&str] = &[
    "how",
    "where",
    "create",
    "open",
    "navigate",
    "find",
    "pull request",
];

/// Decide which directives, if any, to synthesize for a query
///
/// `query` is the original user query, not the model's answer: matching
/// against the response text proved fragile in practice, so intent is judged
/// from the query alone.
///
/// Returns an empty vector unless the normalized query contains at least one
/// intent keyword *and* the knowledge table has a matching entry. Malformed
/// directive literals in the matched entry are dropped, consistent with the
/// parser's leniency policy.
pub fn inject_directives(
    query: &str,
    intent_keywords: &[String],
    knowledge: &KnowledgeBase,
) -> Vec<Directive> {
    let normalized = normalize_query(query);

    let has_intent = intent_keywords
        .iter()
        .any(|keyword| normalized.contains(keyword.to_lowercase().as_str()));
    if !has_intent {
        tracing::debug!("No navigation intent in query, skipping injection");
        return Vec::new();
    }

    let Some(entry) = knowledge.lookup(query) else {
        tracing::debug!("Navigation intent but no knowledge match, skipping injection");
        return Vec::new();
    };

    let directives: Vec<Directive> = entry
        .directives()
        .iter()
        .filter_map(|literal| directive::parse_literal(literal))
        .collect();

    tracing::info!(
        key = entry.key(),
        count = directives.len(),
        "Injecting directives from knowledge entry"
    );
    directives
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::KnowledgeEntryConfig;
    use crate::directive::Zone;

    fn keywords() -> Vec<String> {
        DEFAULT_INTENT_KEYWORDS
            .iter()
            .map(|k| k.to_string())
            .collect()
    }

    fn base_with_pr_entry() -> KnowledgeBase {
        KnowledgeBase::new(vec![KnowledgeEntryConfig {
            key: "create pr".to_string(),
            answer: "Open the Pull Requests tab, then click New pull request.".to_string(),
            directives: vec![
                "ACTION:highlight_zone:arc-tl:.UnderlineNav-item:3000".to_string(),
                "ACTION:highlight_zone:center:a[href*=\"/compare\"]:2500".to_string(),
            ],
        }])
    }

    #[test]
    fn fires_on_intent_keyword_with_matching_entry() {
        let directives = inject_directives("how do I create a pr", &keywords(), &base_with_pr_entry());
        assert_eq!(directives.len(), 2);
        assert_eq!(directives[0].zone, Zone::TopLeft);
        assert_eq!(directives[1].zone, Zone::Center);
    }

    #[test]
    fn no_intent_keyword_means_no_injection() {
        // Query carries neither an intent keyword nor the table key.
        let base = base_with_pr_entry();
        let directives = inject_directives("pr status is green", &keywords(), &base);
        assert!(directives.is_empty());
    }

    #[test]
    fn intent_without_knowledge_match_means_no_injection() {
        let base = base_with_pr_entry();
        let directives = inject_directives("how do I deploy to production", &keywords(), &base);
        assert!(directives.is_empty());
    }

    #[test]
    fn malformed_literal_in_entry_is_dropped() {
        let base = KnowledgeBase::new(vec![KnowledgeEntryConfig {
            key: "open settings".to_string(),
            answer: "Click the gear icon.".to_string(),
            directives: vec![
                "ACTION:highlight_zone:center".to_string(), // too few fields
                "ACTION:highlight_zone:arc-tr:.gear:2000".to_string(),
            ],
        }]);
        let directives = inject_directives("where do I open settings", &keywords(), &base);
        assert_eq!(directives.len(), 1);
        assert_eq!(directives[0].selector, ".gear");
    }

    #[test]
    fn multi_word_keyword_matches() {
        let base = base_with_pr_entry();
        // "pull request" is itself an intent keyword even without how/where.
        let directives = inject_directives(
            "pull request time, let's create pr",
            &keywords(),
            &base,
        );
        assert_eq!(directives.len(), 2);
    }
}
