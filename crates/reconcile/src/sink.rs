use crate::types::TranscriptEvent;

/// Presentation boundary. The core calls this for every bubble mutation and
/// reveal step; a concrete implementation binds the events to its UI layer.
///
/// Emission happens synchronously on the session's thread, so
/// implementations should hand off quickly rather than render inline.
pub trait TranscriptSink: Send + Sync {
    fn emit(&self, event: TranscriptEvent);
}

/// Sink for tools that only read frames and ignore the event stream.
pub struct NullSink;

impl TranscriptSink for NullSink {
    fn emit(&self, _event: TranscriptEvent) {}
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Mutex;

    use super::*;

    /// Records every emitted event for assertion.
    #[derive(Default)]
    pub(crate) struct RecordingSink {
        events: Mutex<Vec<TranscriptEvent>>,
    }

    impl RecordingSink {
        pub(crate) fn events(&self) -> Vec<TranscriptEvent> {
            self.events.lock().unwrap().clone()
        }

        pub(crate) fn removed_ids(&self) -> Vec<String> {
            self.events()
                .into_iter()
                .filter_map(|e| match e {
                    TranscriptEvent::BubbleRemoved { id } => Some(id),
                    _ => None,
                })
                .collect()
        }

        pub(crate) fn reveal_steps(&self) -> Vec<String> {
            self.events()
                .into_iter()
                .filter_map(|e| match e {
                    TranscriptEvent::RevealStep { shown, .. } => Some(shown),
                    _ => None,
                })
                .collect()
        }
    }

    impl TranscriptSink for RecordingSink {
        fn emit(&self, event: TranscriptEvent) {
            self.events.lock().unwrap().push(event);
        }
    }
}
