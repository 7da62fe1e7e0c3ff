//! Speaker classification for incoming segments.
//!
//! Attribution metadata from the transport is unreliable under overlapping
//! speech, so three signals are computed and OR-combined: any strong
//! positive is trusted. The content signal runs over the whole turn text,
//! not the single fragment.

use convo_room_interface::stream::is_agent_identity;

use crate::types::Role;

/// Lexical fingerprints of the agent's self-introduction and sales pitch.
/// Tuned against the deployed agent persona; matched case-folded over the
/// accumulated turn text.
const AGENT_PHRASES: &[&str] = &[
    "i'm ana",
    "sales professional",
    "help you find",
    "barcode scanner",
    "handheld computer",
    "ruggedized",
    "optimize your",
    "workflow",
    "data capture",
    "operations",
    "pain point",
];

const PITCH_OPENERS: &[&str] = &["ready to help", "what's the main"];
const HELP_TERMS: &[&str] = &["assist", "help", "support"];

const PITCH_OPENER_MIN_CHARS: usize = 15;
const HELP_TERM_MIN_CHARS: usize = 30;

/// An active-speaker hint alone is not enough for a brief interjection:
/// the agent's track may still be marked active while the human interrupts.
pub(crate) const ACTIVE_SPEAKER_MIN_CHARS: usize = 10;

/// Decide whether a segment was spoken by the agent or the user.
///
/// `segment_text` is the raw fragment, `turn_text` the accumulated text of
/// the current turn, `identity` the transport's participant identity hint,
/// and `agent_track_active` whether the room currently reports the agent
/// among its active speakers.
pub fn classify(
    segment_text: &str,
    turn_text: &str,
    identity: Option<&str>,
    agent_track_active: bool,
) -> Role {
    let identity_signal = identity.is_some_and(is_agent_identity);
    let content_signal = turn_sounds_like_agent(turn_text);
    let active_speaker_signal =
        agent_track_active && segment_text.chars().count() > ACTIVE_SPEAKER_MIN_CHARS;

    if identity_signal || content_signal || active_speaker_signal {
        Role::Agent
    } else {
        Role::User
    }
}

/// Content signal over the accumulated turn text, case-folded.
pub fn turn_sounds_like_agent(turn_text: &str) -> bool {
    let text = turn_text.to_lowercase();
    let len = text.chars().count();

    if AGENT_PHRASES.iter().any(|p| text.contains(p)) {
        return true;
    }
    if len > PITCH_OPENER_MIN_CHARS && PITCH_OPENERS.iter().any(|p| text.contains(p)) {
        return true;
    }
    len > HELP_TERM_MIN_CHARS && HELP_TERMS.iter().any(|t| text.contains(t))
}

/// Guard on the user display path: text that is unmistakably the agent
/// talking must never render as a user bubble, whatever the classifier
/// said about the turn.
pub fn looks_like_agent_aside(text: &str) -> bool {
    let lower = text.to_lowercase();
    lower.contains("i'm ana")
        || lower.contains("sales professional")
        || (lower.contains("assist you") && lower.chars().count() > HELP_TERM_MIN_CHARS)
}
