//! Retroactive cleanup of misclassified user bubbles.
//!
//! When classification flips mid-turn from user to agent, earlier fragments
//! of the agent's sentence have already rendered as user bubbles. Once the
//! true text is known these are erased by prefix overlap; on the flip
//! itself, stray short fragments ("uh", "yes", echo pieces) are purged
//! wholesale.
//!
//! The thresholds below are tuning constants carried over from the deployed
//! system; changing them changes observable behavior. All lengths are in
//! chars. Both operations are idempotent.

use crate::board::TranscriptBoard;
use crate::registry::normalize_key;

/// A user entry must be longer than this to count as a prefix of an agent
/// message.
const MIN_PREFIX_OVERLAP_CHARS: usize = 5;

/// How much of the agent message head to match continuations against.
const AGENT_HEAD_CHARS: usize = 10;

/// User entries shorter than this are presumed stray fragments when the
/// speaker flips to the agent.
const SHORT_FRAGMENT_CHARS: usize = 15;

/// Remove every user entry that overlaps the head of `agent_text`: either
/// the entry is a prefix of the agent text, or the entry begins with the
/// agent text's first [`AGENT_HEAD_CHARS`] chars (a continuation rendered
/// before the classification flipped). Returns the number of entries
/// removed.
pub fn cleanup_misclassified(board: &mut TranscriptBoard, agent_text: &str) -> usize {
    let agent_key = normalize_key(agent_text);
    let agent_len = agent_key.chars().count();
    let agent_head = char_prefix(&agent_key, AGENT_HEAD_CHARS);

    let matches: Vec<String> = board
        .user_keys()
        .into_iter()
        .filter(|key| {
            let key_len = key.chars().count();
            (agent_key.starts_with(key.as_str()) && key_len > MIN_PREFIX_OVERLAP_CHARS)
                || (key.starts_with(agent_head) && agent_len > AGENT_HEAD_CHARS)
        })
        .collect();

    for key in &matches {
        board.purge_user_entry(key);
    }
    matches.len()
}

/// Remove every user entry shorter than [`SHORT_FRAGMENT_CHARS`]. Invoked
/// when the running classification transitions to the agent. Returns the
/// number of entries removed.
pub fn cleanup_short_user_fragments(board: &mut TranscriptBoard) -> usize {
    let matches: Vec<String> = board
        .user_keys()
        .into_iter()
        .filter(|key| key.chars().count() < SHORT_FRAGMENT_CHARS)
        .collect();

    for key in &matches {
        board.purge_user_entry(key);
    }
    matches.len()
}

fn char_prefix(s: &str, n: usize) -> &str {
    match s.char_indices().nth(n) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::id::SequentialIdGen;
    use crate::sink::test_support::RecordingSink;
    use crate::types::Role;

    fn board_with_user_entries(entries: &[&str]) -> (TranscriptBoard, Arc<RecordingSink>) {
        let sink = Arc::new(RecordingSink::default());
        let mut board = TranscriptBoard::new(sink.clone(), SequentialIdGen::new());
        for text in entries {
            board.upsert(Role::User, text, false);
        }
        (board, sink)
    }

    #[test]
    fn prefix_entries_of_agent_text_are_removed() {
        let (mut board, _sink) = board_with_user_entries(&[
            "i think the",
            "i think the barcode scanner works well",
        ]);

        let removed = cleanup_misclassified(
            &mut board,
            "I think the barcode scanner works well for your workflow",
        );

        assert_eq!(removed, 2);
        assert_eq!(board.registry_len(Role::User), 0);
        assert!(board.frame().bubbles.is_empty());
    }

    #[test]
    fn continuation_of_agent_head_is_removed() {
        // longer than the agent text, but shares its first ten chars
        let (mut board, _sink) =
            board_with_user_entries(&["let me walk you through the setup steps"]);

        let removed = cleanup_misclassified(&mut board, "let me walk you through");

        assert_eq!(removed, 1);
        assert_eq!(board.registry_len(Role::User), 0);
    }

    #[test]
    fn short_prefixes_survive() {
        // "yes" is a prefix of the agent text but too short to count
        let (mut board, _sink) = board_with_user_entries(&["yes"]);

        let removed = cleanup_misclassified(&mut board, "yes, that model ships this week");

        assert_eq!(removed, 0);
        assert_eq!(board.registry_len(Role::User), 1);
    }

    #[test]
    fn head_match_requires_agent_text_beyond_head() {
        // agent text is exactly ten chars, so the continuation rule is off
        let (mut board, _sink) = board_with_user_entries(&["here we go again with it"]);

        let removed = cleanup_misclassified(&mut board, "here we go");

        assert_eq!(removed, 0);
    }

    #[test]
    fn unrelated_entries_survive() {
        let (mut board, _sink) =
            board_with_user_entries(&["can you tell me about pricing", "what about warranty"]);

        let removed = cleanup_misclassified(&mut board, "I think the barcode scanner works well");

        assert_eq!(removed, 0);
        assert_eq!(board.registry_len(Role::User), 2);
    }

    #[test]
    fn short_fragments_purged_long_entries_survive() {
        let (mut board, _sink) = board_with_user_entries(&[
            "ok",
            "yes",
            "go ahead",
            "can you tell me about pricing for the ruggedized scanner",
        ]);

        let removed = cleanup_short_user_fragments(&mut board);

        assert_eq!(removed, 3);
        assert_eq!(board.registry_len(Role::User), 1);
        let frame = board.frame();
        assert_eq!(frame.bubbles.len(), 1);
        assert_eq!(
            frame.bubbles[0].key,
            "can you tell me about pricing for the ruggedized scanner"
        );
    }

    #[test]
    fn cleanups_are_idempotent() {
        let (mut board, _sink) = board_with_user_entries(&["ok", "i think the scanner is"]);

        assert_eq!(
            cleanup_misclassified(&mut board, "i think the scanner is right for you"),
            1
        );
        assert_eq!(
            cleanup_misclassified(&mut board, "i think the scanner is right for you"),
            0
        );

        assert_eq!(cleanup_short_user_fragments(&mut board), 1);
        assert_eq!(cleanup_short_user_fragments(&mut board), 0);
    }
}
