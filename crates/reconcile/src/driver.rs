//! Single-task event loop tying the session to a room event stream.
//!
//! All session state is mutated here, in strict arrival order — there is no
//! parallel mutation and no locking. Reveal chains interleave with event
//! handling through a deadline set owned by the loop: each tick asks the
//! session for the next pause, and a detached bubble or a preempting reveal
//! simply stops producing deadlines.

use std::collections::BTreeMap;

use convo_room_interface::RoomEvent;
use tokio::time::{Instant, sleep_until};
use tokio_stream::{Stream, StreamExt};
use tokio_util::sync::CancellationToken;

use crate::reveal::RevealHandle;
use crate::session::ReconciliationSession;

/// Consume room events until the stream ends, the room disconnects, or
/// `shutdown` fires.
pub async fn drive_session<S>(
    session: &mut ReconciliationSession,
    mut events: S,
    shutdown: CancellationToken,
) where
    S: Stream<Item = RoomEvent> + Unpin,
{
    let mut timers: BTreeMap<(Instant, u64), RevealHandle> = BTreeMap::new();
    let mut seq: u64 = 0;

    loop {
        let next_deadline = timers.keys().next().map(|(at, _)| *at);
        let deadline = next_deadline.unwrap_or_else(Instant::now);

        tokio::select! {
            _ = shutdown.cancelled() => {
                tracing::info!("session_shutdown_requested");
                break;
            }
            _ = sleep_until(deadline), if next_deadline.is_some() => {
                if let Some((_, handle)) = timers.pop_first() {
                    if let Some(delay) = session.reveal_tick(&handle) {
                        seq += 1;
                        timers.insert((Instant::now() + delay, seq), handle);
                    }
                }
            }
            event = events.next() => {
                match event {
                    Some(RoomEvent::Disconnected) => {
                        tracing::info!("room_disconnected");
                        break;
                    }
                    Some(event) => {
                        for handle in session.handle_event(&event) {
                            seq += 1;
                            timers.insert((Instant::now(), seq), handle);
                        }
                    }
                    None => {
                        tracing::info!("event_stream_ended");
                        break;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use convo_room_interface::TranscriptionSegment;
    use tokio_stream::wrappers::ReceiverStream;

    use super::*;
    use crate::id::SequentialIdGen;
    use crate::reveal::ZeroJitter;
    use crate::sink::test_support::RecordingSink;
    use crate::types::Role;

    fn session_pair() -> (ReconciliationSession, Arc<RecordingSink>) {
        let sink = Arc::new(RecordingSink::default());
        let session =
            ReconciliationSession::with_config(sink.clone(), SequentialIdGen::new(), ZeroJitter);
        (session, sink)
    }

    fn agent_final(text: &str) -> RoomEvent {
        RoomEvent::Transcription {
            segments: vec![TranscriptionSegment {
                text: text.into(),
                is_final: true,
                sender_identity: Some("agent-caila".into()),
                participant_id: Some("PA_agent".into()),
                language: None,
            }],
        }
    }

    #[tokio::test(start_paused = true)]
    async fn reveal_runs_to_completion_after_stream_close() {
        let (mut session, _sink) = session_pair();
        let (tx, rx) = tokio::sync::mpsc::channel(8);

        tx.send(agent_final("Hi there.")).await.unwrap();
        drop(tx);

        drive_session(&mut session, ReceiverStream::new(rx), CancellationToken::new()).await;

        // the bubble is committed regardless of how far the reveal got
        let frame = session.frame();
        assert_eq!(frame.by_role(Role::Agent).count(), 1);
        assert_eq!(frame.bubbles[0].text, "Hi there.");
    }

    #[tokio::test(start_paused = true)]
    async fn reveal_steps_are_emitted_while_the_stream_is_open() {
        let (mut session, sink) = session_pair();
        let (tx, rx) = tokio::sync::mpsc::channel(8);

        let driver = async {
            drive_session(&mut session, ReceiverStream::new(rx), CancellationToken::new()).await;
        };

        let feeder = async {
            tx.send(agent_final("Hi there.")).await.unwrap();
            // paused clock: sleeps auto-advance, so this outlasts the
            // whole reveal chain (9 steps, worst case < 3s)
            tokio::time::sleep(std::time::Duration::from_secs(5)).await;
            drop(tx);
        };

        tokio::join!(driver, feeder);

        let steps = sink.reveal_steps();
        assert_eq!(steps.len(), 9);
        assert_eq!(steps.last().map(String::as_str), Some("Hi there."));
        assert!(!session.frame().bubbles[0].streaming);
    }

    #[tokio::test(start_paused = true)]
    async fn disconnect_event_ends_the_loop() {
        let (mut session, _sink) = session_pair();
        let (tx, rx) = tokio::sync::mpsc::channel(8);

        tx.send(RoomEvent::Disconnected).await.unwrap();
        // never delivered: the loop stops at the disconnect
        tx.send(agent_final("late message")).await.unwrap();

        drive_session(&mut session, ReceiverStream::new(rx), CancellationToken::new()).await;

        assert!(session.frame().bubbles.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_token_ends_the_loop() {
        let (mut session, _sink) = session_pair();
        let (_tx, rx) = tokio::sync::mpsc::channel::<RoomEvent>(8);

        let shutdown = CancellationToken::new();
        shutdown.cancel();

        drive_session(&mut session, ReceiverStream::new(rx), shutdown).await;
        assert!(session.frame().bubbles.is_empty());
    }
}
