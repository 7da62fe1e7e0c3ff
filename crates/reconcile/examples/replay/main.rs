mod fixture;
mod renderer;

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use convo_room_interface::RoomEvent;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use fixture::Fixture;
use ratatui::DefaultTerminal;
use reconcile::reveal::{RevealHandle, ZeroJitter};
use reconcile::{ReconciliationSession, SequentialIdGen, TranscriptEvent, TranscriptSink};

#[derive(clap::Parser)]
#[command(name = "replay", about = "Replay a room event fixture in the terminal")]
struct Args {
    #[arg(short, long, default_value_t = Fixture::Sales)]
    fixture: Fixture,

    #[arg(short, long, default_value_t = 400)]
    speed: u64,
}

/// Remembers how far each bubble's reveal has progressed, so the renderer
/// can draw the partial text instead of the committed full text.
#[derive(Default)]
struct RevealTracker {
    shown: Mutex<HashMap<String, String>>,
}

impl RevealTracker {
    fn shown_for(&self, bubble_id: &str) -> Option<String> {
        self.shown.lock().unwrap().get(bubble_id).cloned()
    }
}

impl TranscriptSink for RevealTracker {
    fn emit(&self, event: TranscriptEvent) {
        let mut shown = self.shown.lock().unwrap();
        match event {
            TranscriptEvent::RevealStep { id, shown: text } => {
                shown.insert(id, text);
            }
            TranscriptEvent::RevealFinished { id } | TranscriptEvent::BubbleRemoved { id } => {
                shown.remove(&id);
            }
            _ => {}
        }
    }
}

struct App {
    events: Vec<RoomEvent>,
    position: usize,
    paused: bool,
    speed_ms: u64,
    session: ReconciliationSession,
    tracker: Arc<RevealTracker>,
    pending: Vec<RevealHandle>,
    fixture_name: String,
}

impl App {
    fn new(events: Vec<RoomEvent>, speed_ms: u64, fixture_name: String) -> Self {
        let tracker = Arc::new(RevealTracker::default());
        Self {
            events,
            position: 0,
            paused: false,
            speed_ms,
            session: fresh_session(tracker.clone()),
            tracker,
            pending: Vec::new(),
            fixture_name,
        }
    }

    fn total(&self) -> usize {
        self.events.len()
    }

    fn seek_to(&mut self, target: usize) {
        let target = target.min(self.total());
        self.tracker = Arc::new(RevealTracker::default());
        self.session = fresh_session(self.tracker.clone());
        self.pending.clear();
        for i in 0..target {
            for handle in self.session.handle_event(&self.events[i]) {
                // settle reveals instantly when seeking
                while self.session.reveal_tick(&handle).is_some() {}
            }
        }
        self.position = target;
    }

    fn advance(&mut self) -> bool {
        if self.position >= self.total() {
            return false;
        }
        let handles = self.session.handle_event(&self.events[self.position]);
        self.pending.extend(handles);
        self.position += 1;
        true
    }

    /// Advance every in-flight reveal by one character per UI tick. Replay
    /// paces reveals by frame rather than by the scheduler's delays.
    fn tick_reveals(&mut self) {
        let handles = std::mem::take(&mut self.pending);
        let session = &mut self.session;
        self.pending = handles
            .into_iter()
            .filter(|h| session.reveal_tick(h).is_some())
            .collect();
    }

    fn is_done(&self) -> bool {
        self.position >= self.total() && self.pending.is_empty()
    }
}

fn fresh_session(tracker: Arc<RevealTracker>) -> ReconciliationSession {
    ReconciliationSession::with_config(tracker, SequentialIdGen::new(), ZeroJitter)
}

fn main() {
    use clap::Parser;
    let args = Args::parse();
    let fixture = args.fixture;
    let speed_ms = args.speed;
    let fixture_name = fixture.to_string();

    let events: Vec<RoomEvent> =
        serde_json::from_str(fixture.json()).expect("fixture must parse as RoomEvent[]");

    let mut terminal = ratatui::init();
    let result = run(&mut terminal, events, speed_ms, fixture_name.clone());
    ratatui::restore();

    match result {
        Ok(app) => {
            println!(
                "Done. {} bubbles from {} events ({} fixture).",
                app.session.frame().bubbles.len(),
                app.total(),
                fixture_name,
            );
        }
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}

fn run(
    terminal: &mut DefaultTerminal,
    events: Vec<RoomEvent>,
    speed_ms: u64,
    fixture_name: String,
) -> std::io::Result<App> {
    let mut app = App::new(events, speed_ms, fixture_name);
    let mut last_tick = Instant::now();

    loop {
        terminal.draw(|frame| renderer::render(frame, &app))?;

        let tick_duration = Duration::from_millis(app.speed_ms.min(40));
        let elapsed = last_tick.elapsed();
        let timeout = tick_duration.saturating_sub(elapsed);

        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                match key.code {
                    KeyCode::Char('q') | KeyCode::Esc => break,
                    KeyCode::Char(' ') => {
                        app.paused = !app.paused;
                        last_tick = Instant::now();
                    }
                    KeyCode::Right => {
                        let target = app.position + 1;
                        app.seek_to(target);
                    }
                    KeyCode::Left => {
                        let target = app.position.saturating_sub(1);
                        app.seek_to(target);
                    }
                    KeyCode::Up => {
                        app.speed_ms = app.speed_ms.saturating_sub(50).max(40);
                    }
                    KeyCode::Down => {
                        app.speed_ms += 50;
                    }
                    KeyCode::Home => {
                        app.seek_to(0);
                    }
                    KeyCode::End => {
                        let total = app.total();
                        app.seek_to(total);
                    }
                    _ => {}
                }
            }
        } else if !app.paused {
            app.tick_reveals();

            if last_tick.elapsed() >= Duration::from_millis(app.speed_ms) {
                app.advance();
                last_tick = Instant::now();

                if app.is_done() {
                    terminal.draw(|frame| renderer::render(frame, &app))?;
                    app.paused = true;
                }
            }
        }
    }

    Ok(app)
}
