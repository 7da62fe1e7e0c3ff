//! The reconciliation state machine.
//!
//! One session owns all conversation-scoped state: the board, the turn
//! context, the running classification, the cached active-speaker set, and
//! the reveal scheduler. It is constructed at session start and discarded
//! at session end; a restarted room gets a fresh session.
//!
//! Nothing in here is fatal. Attribution is inherently noisy, so the
//! contract is best-effort transcript: misclassifications are corrected
//! retroactively, malformed inputs are dropped, and lookup misses fall
//! back to creation.

use std::sync::Arc;
use std::time::Duration;

use convo_room_interface::stream::is_agent_identity;
use convo_room_interface::{DataMessage, RoomEvent, TranscriptionSegment, directive};

use crate::board::TranscriptBoard;
use crate::classifier;
use crate::context::ConversationContext;
use crate::corrector;
use crate::id::{IdGenerator, UuidIdGen};
use crate::reveal::{JitterSource, RevealHandle, RevealScheduler, RevealStep, UniformJitter};
use crate::sink::TranscriptSink;
use crate::types::{Role, TranscriptEvent, TranscriptFrame};

/// Raw fragments this short are suppressed right after an agent turn until
/// a final arrives, to avoid flashing a misclassified user line.
const SHORT_AFTER_AGENT_CHARS: usize = 10;

/// Non-final agent fragments longer than this are worth an early
/// correction pass even though they are never displayed.
const EARLY_CLEANUP_MIN_CHARS: usize = 20;

/// Counters for tooling and the replay debug panel. Not part of the
/// rendering contract.
#[derive(Debug, Clone, Default)]
pub struct SessionDebug {
    pub agent_entries: usize,
    pub user_entries: usize,
    pub active_reveals: usize,
    pub last_classification: Option<Role>,
}

pub struct ReconciliationSession {
    board: TranscriptBoard,
    context: ConversationContext,
    reveal: RevealScheduler,
    sink: Arc<dyn TranscriptSink>,
    last_classification: Option<Role>,
    active_speakers: Vec<String>,
}

impl ReconciliationSession {
    pub fn new(sink: Arc<dyn TranscriptSink>) -> Self {
        Self::with_config(sink, UuidIdGen, UniformJitter)
    }

    pub fn with_config(
        sink: Arc<dyn TranscriptSink>,
        id_gen: impl IdGenerator + 'static,
        jitter: impl JitterSource + 'static,
    ) -> Self {
        Self {
            board: TranscriptBoard::new(sink.clone(), id_gen),
            context: ConversationContext::new(),
            reveal: RevealScheduler::with_jitter(jitter),
            sink,
            last_classification: None,
            active_speakers: Vec::new(),
        }
    }

    /// Feed one room event. Returned handles are reveals the caller must
    /// drive via [`Self::reveal_tick`].
    pub fn handle_event(&mut self, event: &RoomEvent) -> Vec<RevealHandle> {
        match event {
            RoomEvent::Transcription { segments } => segments
                .iter()
                .filter_map(|segment| self.handle_segment(segment))
                .collect(),
            RoomEvent::ActiveSpeakers { identities } => {
                self.active_speakers = identities.clone();
                Vec::new()
            }
            RoomEvent::Chat { identity, text } => self
                .handle_direct_text(identity.as_deref(), text)
                .into_iter()
                .collect(),
            RoomEvent::Data { identity, payload } => {
                match DataMessage::from_payload(payload) {
                    Ok(message) => self
                        .handle_direct_text(identity.as_deref(), &message.text)
                        .into_iter()
                        .collect(),
                    Err(error) => {
                        tracing::warn!(%error, "data_payload_dropped");
                        Vec::new()
                    }
                }
            }
            RoomEvent::Disconnected => Vec::new(),
        }
    }

    /// Process one transcription segment through context, classifier,
    /// corrector, and registry.
    pub fn handle_segment(&mut self, segment: &TranscriptionSegment) -> Option<RevealHandle> {
        if segment.text.trim().is_empty() {
            return None;
        }

        let turn_text = self.context.ingest(segment.speaker_key(), &segment.text);
        let agent_track_active = self
            .active_speakers
            .iter()
            .any(|identity| is_agent_identity(identity));

        let role = classifier::classify(
            &segment.text,
            &turn_text,
            segment.sender_identity.as_deref(),
            agent_track_active,
        );

        let previous = self.last_classification;
        if previous != Some(role) {
            self.last_classification = Some(role);
            tracing::debug!(?role, "classification_changed");
            if role == Role::Agent {
                let removed = corrector::cleanup_short_user_fragments(&mut self.board);
                if removed > 0 {
                    tracing::debug!(removed, "short_user_fragments_purged");
                }
            }
        }

        match role {
            Role::Agent => {
                if !segment.is_final {
                    // never displayed, but long partials already tell us
                    // which user bubbles were really the agent
                    if segment.text.chars().count() > EARLY_CLEANUP_MIN_CHARS {
                        corrector::cleanup_misclassified(&mut self.board, &segment.text);
                    }
                    return None;
                }

                let removed = corrector::cleanup_misclassified(&mut self.board, &segment.text);
                if removed > 0 {
                    tracing::debug!(removed, "misclassified_user_bubbles_removed");
                }
                self.accept_agent_final(&segment.text)
            }
            Role::User => {
                if !segment.is_final
                    && previous == Some(Role::Agent)
                    && segment.text.chars().count() < SHORT_AFTER_AGENT_CHARS
                {
                    tracing::debug!("short_fragment_after_agent_held_back");
                    return None;
                }
                if classifier::looks_like_agent_aside(&segment.text) {
                    tracing::debug!("agent_aside_suppressed_on_user_path");
                    return None;
                }
                self.board
                    .upsert(Role::User, segment.text.trim(), !segment.is_final);
                None
            }
        }
    }

    /// Direct text-channel fallback. Only agent-attributed messages are
    /// accepted, and silent directives are consumed before they reach any
    /// reconciliation state.
    pub fn handle_direct_text(
        &mut self,
        identity: Option<&str>,
        text: &str,
    ) -> Option<RevealHandle> {
        if !identity.is_some_and(is_agent_identity) {
            tracing::debug!("direct_message_ignored_non_agent");
            return None;
        }
        if directive::is_directive(text) {
            tracing::debug!("directive_consumed");
            return None;
        }
        if text.trim().is_empty() {
            return None;
        }
        self.accept_agent_final(text)
    }

    fn accept_agent_final(&mut self, text: &str) -> Option<RevealHandle> {
        let (id, is_new) = self.board.upsert(Role::Agent, text.trim(), false);
        if !is_new {
            // revised in place; no re-reveal
            return None;
        }
        self.board.mark_streaming(&id);
        Some(self.reveal.begin(&id, text.trim()))
    }

    /// Advance one reveal step. Returns the pause before the next step, or
    /// `None` when the chain is over: finished, preempted, or the bubble
    /// was detached in the meantime.
    pub fn reveal_tick(&mut self, handle: &RevealHandle) -> Option<Duration> {
        if !self.board.is_live(handle.bubble_id()) {
            self.reveal.cancel(handle.bubble_id());
            return None;
        }

        match self.reveal.step(handle)? {
            RevealStep::Emit { shown, next_in } => {
                self.sink.emit(TranscriptEvent::RevealStep {
                    id: handle.bubble_id().to_string(),
                    shown,
                });
                Some(next_in)
            }
            RevealStep::Finished => {
                self.board.clear_streaming(handle.bubble_id());
                self.sink.emit(TranscriptEvent::RevealFinished {
                    id: handle.bubble_id().to_string(),
                });
                None
            }
        }
    }

    pub fn frame(&self) -> TranscriptFrame {
        self.board.frame()
    }

    pub fn last_classification(&self) -> Option<Role> {
        self.last_classification
    }

    pub fn debug_stats(&self) -> SessionDebug {
        SessionDebug {
            agent_entries: self.board.registry_len(Role::Agent),
            user_entries: self.board.registry_len(Role::User),
            active_reveals: self.reveal.active_count(),
            last_classification: self.last_classification,
        }
    }
}
