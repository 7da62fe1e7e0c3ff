use std::sync::Arc;

use crate::id::IdGenerator;
use crate::registry::{ContentRegistry, normalize_key};
use crate::sink::TranscriptSink;
use crate::types::{Bubble, Role, TranscriptEvent, TranscriptFrame};

/// Owner of the live transcript state: bubbles in creation order plus one
/// content registry per role. Every mutation is pushed to the sink.
///
/// Bubbles are referenced by id everywhere else; a registry entry whose
/// bubble has been detached resolves as a miss, which is what gives the
/// registries their weak-reference semantics.
pub struct TranscriptBoard {
    bubbles: Vec<Bubble>,
    agent_registry: ContentRegistry,
    user_registry: ContentRegistry,
    id_gen: Box<dyn IdGenerator>,
    sink: Arc<dyn TranscriptSink>,
}

impl TranscriptBoard {
    pub fn new(sink: Arc<dyn TranscriptSink>, id_gen: impl IdGenerator + 'static) -> Self {
        Self {
            bubbles: Vec::new(),
            agent_registry: ContentRegistry::new(),
            user_registry: ContentRegistry::new(),
            id_gen: Box::new(id_gen),
            sink,
        }
    }

    fn registry(&self, role: Role) -> &ContentRegistry {
        match role {
            Role::Agent => &self.agent_registry,
            Role::User => &self.user_registry,
        }
    }

    fn registry_mut(&mut self, role: Role) -> &mut ContentRegistry {
        match role {
            Role::Agent => &mut self.agent_registry,
            Role::User => &mut self.user_registry,
        }
    }

    /// Create or update the bubble for this text. On a dedup hit against a
    /// live bubble the display text is revised in place and `is_new` is
    /// false; a hit against a detached bubble counts as a miss.
    ///
    /// `transcribing` marks a not-yet-final user transcription; the first
    /// final upsert for the same key clears the mark, and a final upsert
    /// never re-sets it.
    pub fn upsert(&mut self, role: Role, text: &str, transcribing: bool) -> (String, bool) {
        let key = normalize_key(text);

        if let Some(id) = self.registry(role).get(&key).map(str::to_string) {
            if let Some(bubble) = self.bubbles.iter_mut().find(|b| b.id == id) {
                bubble.text = text.to_string();
                if !transcribing {
                    bubble.transcribing = false;
                }
                self.sink.emit(TranscriptEvent::BubbleUpdated {
                    id: id.clone(),
                    text: text.to_string(),
                });
                return (id, false);
            }
        }

        let id = self.id_gen.next_id();
        let bubble = Bubble {
            id: id.clone(),
            role,
            key: key.clone(),
            text: text.to_string(),
            streaming: false,
            transcribing,
        };
        self.bubbles.push(bubble.clone());
        self.registry_mut(role).insert(key, id.clone());
        self.sink.emit(TranscriptEvent::BubbleCreated { bubble });
        (id, true)
    }

    /// Detach a bubble from the display and drop its registry entry (if it
    /// still points at this bubble). Missing ids are a no-op.
    pub fn remove(&mut self, id: &str) -> bool {
        let Some(pos) = self.bubbles.iter().position(|b| b.id == id) else {
            return false;
        };
        let bubble = self.bubbles.remove(pos);
        if self.registry(bubble.role).get(&bubble.key) == Some(id) {
            self.registry_mut(bubble.role).evict(&bubble.key);
        }
        self.sink.emit(TranscriptEvent::BubbleRemoved { id: bubble.id });
        true
    }

    /// Drop a user registry entry and detach its bubble if it is still
    /// live. Dangling entries are evicted silently.
    pub fn purge_user_entry(&mut self, key: &str) {
        if let Some(id) = self.user_registry.evict(key) {
            if let Some(pos) = self.bubbles.iter().position(|b| b.id == id) {
                let bubble = self.bubbles.remove(pos);
                self.sink.emit(TranscriptEvent::BubbleRemoved { id: bubble.id });
            }
        }
    }

    pub fn is_live(&self, id: &str) -> bool {
        self.bubbles.iter().any(|b| b.id == id)
    }

    pub fn bubble(&self, id: &str) -> Option<&Bubble> {
        self.bubbles.iter().find(|b| b.id == id)
    }

    pub fn mark_streaming(&mut self, id: &str) {
        if let Some(bubble) = self.bubbles.iter_mut().find(|b| b.id == id) {
            bubble.streaming = true;
        }
    }

    /// Clear the transient reveal presentation marker once the reveal chain
    /// completes or is abandoned.
    pub fn clear_streaming(&mut self, id: &str) {
        if let Some(bubble) = self.bubbles.iter_mut().find(|b| b.id == id) {
            bubble.streaming = false;
        }
    }

    pub fn user_keys(&self) -> Vec<String> {
        self.user_registry.keys().map(str::to_string).collect()
    }

    pub fn registry_len(&self, role: Role) -> usize {
        self.registry(role).len()
    }

    pub fn frame(&self) -> TranscriptFrame {
        TranscriptFrame {
            bubbles: self.bubbles.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::SequentialIdGen;
    use crate::sink::test_support::RecordingSink;

    fn board() -> (TranscriptBoard, Arc<RecordingSink>) {
        let sink = Arc::new(RecordingSink::default());
        let board = TranscriptBoard::new(sink.clone(), SequentialIdGen::new());
        (board, sink)
    }

    #[test]
    fn upsert_identical_text_yields_one_bubble() {
        let (mut board, _sink) = board();

        let (id_a, new_a) = board.upsert(Role::User, "I think the scanner works", false);
        let (id_b, new_b) = board.upsert(Role::User, "I think the scanner works", false);

        assert!(new_a);
        assert!(!new_b);
        assert_eq!(id_a, id_b);
        assert_eq!(board.frame().bubbles.len(), 1);
    }

    #[test]
    fn dedup_key_ignores_case_and_whitespace() {
        let (mut board, _sink) = board();

        board.upsert(Role::User, "Hello there", false);
        let (_, is_new) = board.upsert(Role::User, "  hello THERE ", false);

        assert!(!is_new);
        assert_eq!(board.frame().bubbles.len(), 1);
    }

    #[test]
    fn dedup_is_per_role() {
        let (mut board, _sink) = board();

        let (_, new_user) = board.upsert(Role::User, "okay", false);
        let (_, new_agent) = board.upsert(Role::Agent, "okay", false);

        assert!(new_user);
        assert!(new_agent);
        assert_eq!(board.frame().bubbles.len(), 2);
    }

    #[test]
    fn update_revises_text_in_place() {
        let (mut board, sink) = board();

        let (id, _) = board.upsert(Role::User, "hello world", true);
        board.upsert(Role::User, "Hello world", true);

        assert_eq!(board.bubble(&id).unwrap().text, "Hello world");
        assert!(
            sink.events()
                .iter()
                .any(|e| matches!(e, TranscriptEvent::BubbleUpdated { .. }))
        );
    }

    #[test]
    fn final_update_clears_transcribing_marker() {
        let (mut board, _sink) = board();

        let (id, _) = board.upsert(Role::User, "how much is it", true);
        assert!(board.bubble(&id).unwrap().transcribing);

        board.upsert(Role::User, "how much is it", false);
        assert!(!board.bubble(&id).unwrap().transcribing);

        // a later partial for the same key must not re-mark it
        board.upsert(Role::User, "how much is it", true);
        assert!(!board.bubble(&id).unwrap().transcribing);
    }

    #[test]
    fn stale_registry_entry_is_treated_as_create() {
        let (mut board, _sink) = board();

        let (id, _) = board.upsert(Role::User, "hello", false);
        // simulate the display detaching the bubble without going through
        // the registry-aware removal path
        board.bubbles.retain(|b| b.id != id);
        assert_eq!(board.registry_len(Role::User), 1);

        let (id2, is_new) = board.upsert(Role::User, "hello", false);
        assert!(is_new);
        assert_ne!(id, id2);
    }

    #[test]
    fn remove_detaches_and_evicts() {
        let (mut board, sink) = board();

        let (id, _) = board.upsert(Role::User, "yes", false);
        assert!(board.remove(&id));

        assert!(!board.is_live(&id));
        assert_eq!(board.registry_len(Role::User), 0);
        assert_eq!(sink.removed_ids(), vec![id]);
        assert!(!board.remove("missing"));
    }

    #[test]
    fn purge_user_entry_handles_dangling_mapping() {
        let (mut board, sink) = board();

        let (id, _) = board.upsert(Role::User, "uh", false);
        board.bubbles.retain(|b| b.id != id);

        board.purge_user_entry("uh");
        assert_eq!(board.registry_len(Role::User), 0);
        assert!(sink.removed_ids().is_empty());
    }
}
