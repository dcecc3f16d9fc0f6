//! Property-based tests for the directive parser
//!
//! For any transcript assembled from prose fragments and well-formed
//! markers, the parser must yield exactly one action per marker, reconstruct
//! the surrounding prose in order, and behave identically on repeated runs.

use guidepost::directive::{StreamEvent, Zone, parse};
use proptest::prelude::*;

/// Prose fragments: no colons and no digits, so they can never be mistaken
/// for marker fields or extend a duration.
fn prose() -> impl Strategy<Value = String> {
    "[a-zA-Z ,.!?]{1,40}".prop_filter("prose must survive trimming", |s| !s.trim().is_empty())
}

fn zone() -> impl Strategy<Value = &'static str> {
    prop_oneof![
        Just("center"),
        Just("arc-tl"),
        Just("arc-tr"),
        Just("arc-bl"),
        Just("arc-br"),
    ]
}

#[derive(Debug, Clone)]
struct MarkerSpec {
    action_type: String,
    zone: &'static str,
    selector: String,
    duration: u64,
    trailing: String,
}

fn marker() -> impl Strategy<Value = MarkerSpec> {
    (
        "[a-z_]{3,16}",
        zone(),
        r#"[a-zA-Z.#\[\]="_-]{1,24}"#.prop_filter("selector must survive trimming", |s| {
            !s.trim().is_empty()
        })
        // A selector embedding the marker word would fabricate an extra
        // marker occurrence once the structural colon follows it.
        .prop_filter("selector must not embed the marker", |s| {
            !s.contains("ACTION")
        }),
        1u64..=600_000,
        prose(),
    )
        .prop_map(|(action_type, zone, selector, duration, trailing)| MarkerSpec {
            action_type,
            zone,
            selector,
            duration,
            trailing,
        })
}

fn assemble(leading: &str, markers: &[MarkerSpec]) -> String {
    let mut transcript = leading.to_string();
    for spec in markers {
        transcript.push_str(&format!(
            "ACTION:{}:{}:{}:{} {}",
            spec.action_type, spec.zone, spec.selector, spec.duration, spec.trailing
        ));
    }
    transcript
}

proptest! {
    #[test]
    fn marker_count_equals_action_count(
        leading in prose(),
        markers in prop::collection::vec(marker(), 0..5),
    ) {
        let transcript = assemble(&leading, &markers);
        let events = parse(&transcript);
        let actions = events
            .iter()
            .filter(|e| matches!(e, StreamEvent::Action(_)))
            .count();
        prop_assert_eq!(actions, markers.len());
    }

    #[test]
    fn prose_is_reconstructed_in_order(
        leading in prose(),
        markers in prop::collection::vec(marker(), 1..5),
    ) {
        let transcript = assemble(&leading, &markers);
        let events = parse(&transcript);

        let mut expected = vec![leading.trim().to_string()];
        expected.extend(markers.iter().map(|m| m.trailing.trim().to_string()));

        let messages: Vec<String> = events
            .iter()
            .filter_map(|e| match e {
                StreamEvent::Message { content } => Some(content.clone()),
                _ => None,
            })
            .collect();
        prop_assert_eq!(messages, expected);
    }

    #[test]
    fn directive_fields_roundtrip(
        leading in prose(),
        markers in prop::collection::vec(marker(), 1..5),
    ) {
        let transcript = assemble(&leading, &markers);
        let events = parse(&transcript);

        let directives: Vec<_> = events
            .iter()
            .filter_map(|e| match e {
                StreamEvent::Action(d) => Some(d.clone()),
                _ => None,
            })
            .collect();

        for (spec, directive) in markers.iter().zip(&directives) {
            prop_assert_eq!(&directive.action_type, &spec.action_type);
            prop_assert_eq!(directive.zone, spec.zone.parse::<Zone>().unwrap());
            prop_assert_eq!(&directive.selector, spec.selector.trim());
            prop_assert_eq!(directive.duration, spec.duration);
        }
    }

    #[test]
    fn parsing_is_deterministic(
        leading in prose(),
        markers in prop::collection::vec(marker(), 0..5),
    ) {
        let transcript = assemble(&leading, &markers);
        prop_assert_eq!(parse(&transcript), parse(&transcript));
    }

    #[test]
    fn arbitrary_text_never_panics(transcript in ".{0,400}") {
        let events = parse(&transcript);
        // Terminal events are never produced by the parser itself.
        let has_terminal = events
            .iter()
            .any(|e| matches!(e, StreamEvent::Done | StreamEvent::Error { .. }));
        prop_assert!(!has_terminal, "parser produced a terminal event");
    }
}
