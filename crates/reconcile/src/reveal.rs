//! Character-by-character reveal of finalized agent messages.
//!
//! The full text is already committed to the data model before a reveal
//! starts; this is purely a presentation-layer animation. The scheduler is
//! a cancellable step machine keyed by bubble id — it owns no timers. Each
//! step reports the delay before the next one, and the driver does the
//! sleeping, which keeps cancellation and liveness checks explicit and
//! testable without a clock.

use std::collections::HashMap;
use std::time::Duration;

const BASE_DELAY_MS: u64 = 20;
const BASE_JITTER_MS: u64 = 20;
const CLAUSE_DELAY_MS: u64 = 100;
const CLAUSE_JITTER_MS: u64 = 50;
const SENTENCE_DELAY_MS: u64 = 200;
const SENTENCE_JITTER_MS: u64 = 100;

fn is_sentence_end(c: char) -> bool {
    matches!(c, '.' | '!' | '?')
}

fn is_clause_break(c: char) -> bool {
    matches!(c, ',' | ';' | ':' | ')' | '(')
}

/// Source of the per-character pacing jitter.
pub trait JitterSource: Send {
    /// Uniform sample in `[0, max_ms)`.
    fn sample_ms(&mut self, max_ms: u64) -> u64;
}

pub struct UniformJitter;

impl JitterSource for UniformJitter {
    fn sample_ms(&mut self, max_ms: u64) -> u64 {
        if max_ms == 0 {
            return 0;
        }
        rand::random::<u64>() % max_ms
    }
}

/// No jitter: every delay is the base value. For tests and deterministic
/// replays.
pub struct ZeroJitter;

impl JitterSource for ZeroJitter {
    fn sample_ms(&mut self, _max_ms: u64) -> u64 {
        0
    }
}

/// Handle to one reveal run. A new reveal for the same bubble invalidates
/// older handles, so a stale timer chain dies on its next step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevealHandle {
    id: String,
    epoch: u64,
}

impl RevealHandle {
    pub fn bubble_id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RevealStep {
    /// One more character became visible. `next_in` is the pause before
    /// the following step, paced by the character just emitted.
    Emit { shown: String, next_in: Duration },
    /// The full text is visible; transient presentation markers can be
    /// cleared.
    Finished,
}

struct RevealState {
    chars: Vec<char>,
    shown: usize,
    epoch: u64,
}

/// At most one reveal runs per bubble; starting another preempts it.
pub struct RevealScheduler {
    jitter: Box<dyn JitterSource>,
    epochs: u64,
    active: HashMap<String, RevealState>,
}

impl RevealScheduler {
    pub fn new() -> Self {
        Self::with_jitter(UniformJitter)
    }

    pub fn with_jitter(jitter: impl JitterSource + 'static) -> Self {
        Self {
            jitter: Box::new(jitter),
            epochs: 0,
            active: HashMap::new(),
        }
    }

    /// Start revealing `text` for the bubble, cancelling any reveal already
    /// running for it.
    pub fn begin(&mut self, bubble_id: &str, text: &str) -> RevealHandle {
        self.epochs += 1;
        self.active.insert(
            bubble_id.to_string(),
            RevealState {
                chars: text.chars().collect(),
                shown: 0,
                epoch: self.epochs,
            },
        );
        RevealHandle {
            id: bubble_id.to_string(),
            epoch: self.epochs,
        }
    }

    pub fn cancel(&mut self, bubble_id: &str) {
        self.active.remove(bubble_id);
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// Advance one step. Returns `None` for cancelled or preempted handles.
    pub fn step(&mut self, handle: &RevealHandle) -> Option<RevealStep> {
        let state = self.active.get_mut(&handle.id)?;
        if state.epoch != handle.epoch {
            return None;
        }

        if state.shown >= state.chars.len() {
            self.active.remove(&handle.id);
            return Some(RevealStep::Finished);
        }

        state.shown += 1;
        let emitted = state.chars[state.shown - 1];
        let shown: String = state.chars[..state.shown].iter().collect();
        let next_in = self.delay_after(emitted);
        Some(RevealStep::Emit { shown, next_in })
    }

    fn delay_after(&mut self, c: char) -> Duration {
        let (base, jitter) = if is_sentence_end(c) {
            (SENTENCE_DELAY_MS, SENTENCE_JITTER_MS)
        } else if is_clause_break(c) {
            (CLAUSE_DELAY_MS, CLAUSE_JITTER_MS)
        } else {
            (BASE_DELAY_MS, BASE_JITTER_MS)
        };
        Duration::from_millis(base + self.jitter.sample_ms(jitter))
    }
}

impl Default for RevealScheduler {
    fn default() -> Self {
        Self::new()
    }
}
