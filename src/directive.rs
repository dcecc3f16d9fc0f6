//! Directive grammar and transcript parser
//!
//! Model output is a flat text stream that may carry inline highlight
//! directives of the form:
//!
//! ```text
//! ACTION:<type>:<zone>:<selector>:<duration><optional trailing text>
//! ```
//!
//! The selector is a CSS-like locator and may itself contain colons
//! (attribute selectors, pseudo-classes), so only the first three colons
//! after the marker are structural. `parse` turns a complete transcript into
//! an ordered sequence of message and action events.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Literal marker that introduces a directive in the text stream
pub const ACTION_MARKER: &str = "ACTION:";

/// Symbolic screen region targeted by a directive
///
/// Wire names match what the extension's overlay understands: `center` plus
/// the four `arc-*` corner regions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Zone {
    #[serde(rename = "center")]
    Center,
    #[serde(rename = "arc-tl")]
    TopLeft,
    #[serde(rename = "arc-tr")]
    TopRight,
    #[serde(rename = "arc-bl")]
    BottomLeft,
    #[serde(rename = "arc-br")]
    BottomRight,
}

impl Zone {
    /// Wire-format name for this zone
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Center => "center",
            Self::TopLeft => "arc-tl",
            Self::TopRight => "arc-tr",
            Self::BottomLeft => "arc-bl",
            Self::BottomRight => "arc-br",
        }
    }
}

impl FromStr for Zone {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "center" => Ok(Self::Center),
            "arc-tl" => Ok(Self::TopLeft),
            "arc-tr" => Ok(Self::TopRight),
            "arc-bl" => Ok(Self::BottomLeft),
            "arc-br" => Ok(Self::BottomRight),
            _ => Err(()),
        }
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A structured instruction telling the client UI to highlight an element
///
/// Immutable once parsed; the orchestrator only ever moves or clones it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Directive {
    /// Directive kind, e.g. `highlight_zone`
    pub action_type: String,
    /// Screen region the highlight belongs to
    pub zone: Zone,
    /// CSS-like locator for the target element (may contain colons)
    pub selector: String,
    /// Highlight duration in milliseconds (always > 0)
    pub duration: u64,
}

/// One event on the wire to the extension
///
/// This is the only artifact exposed to callers; provider envelopes never
/// leak past the adapters. Serialized as one JSON object per NDJSON line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    /// A run of prose from the model
    Message { content: String },
    /// A parsed highlight directive
    Action(Directive),
    /// Terminal success signal; exactly one per request
    Done,
    /// Terminal failure signal; replaces `Done` when the stream breaks
    Error { message: String },
}

impl StreamEvent {
    /// Build a message event, returning `None` for whitespace-only text
    pub fn message(text: &str) -> Option<Self> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self::Message {
                content: trimmed.to_string(),
            })
        }
    }
}

/// Parse a complete transcript into ordered message and action events
///
/// Pure and deterministic: the same transcript always yields the same event
/// sequence, and the returned sequence never contains `Done` or `Error`.
///
/// The marker segmentation follows a leniency policy: a malformed marker
/// (fewer than 4 structural fields, missing leading digits in the duration
/// field, zero duration, or an unrecognized zone) is dropped silently rather
/// than surfaced as an error. A malformed directive degrades to a missing
/// directive, never to a hard failure.
pub fn parse(transcript: &str) -> Vec<StreamEvent> {
    let mut events = Vec::new();

    if !transcript.contains(ACTION_MARKER) {
        events.extend(StreamEvent::message(transcript));
        return events;
    }

    let mut parts = transcript.split(ACTION_MARKER);

    // Text before the first marker, if any
    if let Some(leading) = parts.next() {
        events.extend(StreamEvent::message(leading));
    }

    for segment in parts {
        match parse_marker_segment(segment) {
            Some((directive, trailing)) => {
                events.push(StreamEvent::Action(directive));
                events.extend(StreamEvent::message(trailing));
            }
            None => {
                tracing::debug!(
                    segment_len = segment.len(),
                    "Dropping malformed ACTION marker"
                );
            }
        }
    }

    events
}

/// Parse the text following one `ACTION:` marker
///
/// Returns the directive plus whatever trailing text followed the duration
/// digits, or `None` when the segment is malformed. The first three colons
/// are structural; everything after the third belongs to the
/// duration-and-trailing-text field, so colon-bearing selectors survive.
fn parse_marker_segment(segment: &str) -> Option<(Directive, &str)> {
    let mut fields = segment.splitn(4, ':');

    let action_type = fields.next()?.trim();
    let zone_field = fields.next()?.trim();
    let selector = fields.next()?.trim();
    let tail = fields.next()?;

    if action_type.is_empty() || selector.is_empty() {
        return None;
    }

    let zone = Zone::from_str(zone_field).ok()?;

    // Leading decimal run is the duration; the rest is trailing prose
    let tail = tail.trim_start();
    let digits_end = tail
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map(|(i, _)| i)
        .unwrap_or(tail.len());
    if digits_end == 0 {
        return None;
    }
    let duration: u64 = tail[..digits_end].parse().ok()?;
    if duration == 0 {
        return None;
    }

    Some((
        Directive {
            action_type: action_type.to_string(),
            zone,
            selector: selector.to_string(),
            duration,
        },
        &tail[digits_end..],
    ))
}

/// Parse a standalone directive literal such as those stored in the
/// knowledge table (`ACTION:highlight_zone:center:.btn:2500`)
///
/// Trailing text after the duration is ignored; malformed literals yield
/// `None` under the same leniency policy as `parse`.
pub fn parse_literal(literal: &str) -> Option<Directive> {
    let rest = literal.trim().strip_prefix(ACTION_MARKER)?;
    parse_marker_segment(rest).map(|(directive, _)| directive)
}
