use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph, Wrap},
};
use reconcile::Role;

use crate::App;

const DEBUG_PANEL_WIDTH: u16 = 32;

pub fn render(frame: &mut Frame, app: &App) {
    let [header_area, body_area, timeline_area, hint_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Fill(1),
        Constraint::Length(1),
        Constraint::Length(1),
    ])
    .areas(frame.area());

    let [transcript_area, debug_area] =
        Layout::horizontal([Constraint::Fill(1), Constraint::Length(DEBUG_PANEL_WIDTH)])
            .areas(body_area);

    render_header(frame, app, header_area);
    render_transcript(frame, app, transcript_area);
    render_debug(frame, app, debug_area);
    render_timeline(frame, app, timeline_area);
    render_hints(frame, hint_area);
}

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let status = if app.paused {
        "⏸ PAUSED"
    } else {
        "▶ PLAYING"
    };
    let text = format!(
        " {} | {} | {}ms/event ",
        app.fixture_name, status, app.speed_ms
    );
    frame.render_widget(
        Paragraph::new(text).style(Style::default().fg(Color::DarkGray)),
        area,
    );
}

fn render_transcript(frame: &mut Frame, app: &App, area: Rect) {
    let transcript = app.session.frame();
    let mut lines: Vec<Line> = Vec::new();

    for bubble in &transcript.bubbles {
        let (label, label_color) = match bubble.role {
            Role::Agent => ("caila", Color::Cyan),
            Role::User => ("you", Color::Green),
        };

        let mut spans = vec![Span::styled(
            format!("{label:>5} "),
            Style::default().fg(label_color),
        )];

        if bubble.streaming {
            let shown = app.tracker.shown_for(&bubble.id).unwrap_or_default();
            spans.push(Span::raw(shown));
            spans.push(Span::styled("▏", Style::default().fg(Color::DarkGray)));
        } else {
            spans.push(Span::raw(bubble.text.clone()));
        }

        if bubble.transcribing {
            spans.push(Span::styled(
                " …",
                Style::default()
                    .fg(Color::DarkGray)
                    .add_modifier(Modifier::ITALIC),
            ));
        }

        lines.push(Line::from(spans));
    }

    frame.render_widget(
        Paragraph::new(lines)
            .block(Block::default())
            .wrap(Wrap { trim: false }),
        area,
    );
}

fn render_debug(frame: &mut Frame, app: &App, area: Rect) {
    let stats = app.session.debug_stats();

    let block = Block::default()
        .borders(Borders::LEFT)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(
            " session ",
            Style::default().fg(Color::DarkGray),
        ));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let classification = match stats.last_classification {
        Some(Role::Agent) => "agent",
        Some(Role::User) => "user",
        None => "none",
    };

    let lines = vec![
        Line::from(vec![
            Span::styled("agent entries ", Style::default().fg(Color::DarkGray)),
            Span::raw(stats.agent_entries.to_string()),
        ]),
        Line::from(vec![
            Span::styled("user entries  ", Style::default().fg(Color::DarkGray)),
            Span::raw(stats.user_entries.to_string()),
        ]),
        Line::from(vec![
            Span::styled("classified    ", Style::default().fg(Color::DarkGray)),
            Span::raw(classification),
        ]),
        Line::from(vec![
            Span::styled("reveals       ", Style::default().fg(Color::DarkGray)),
            Span::styled(
                stats.active_reveals.to_string(),
                Style::default().fg(if stats.active_reveals > 0 {
                    Color::Yellow
                } else {
                    Color::DarkGray
                }),
            ),
        ]),
    ];

    frame.render_widget(Paragraph::new(lines), inner);
}

fn render_timeline(frame: &mut Frame, app: &App, area: Rect) {
    let total = app.total();
    let ratio = if total == 0 {
        0.0
    } else {
        app.position as f64 / total as f64
    };
    let label = format!("{}/{}", app.position, total);
    let gauge = Gauge::default()
        .gauge_style(Style::default().fg(Color::White).bg(Color::DarkGray))
        .ratio(ratio)
        .label(label);
    frame.render_widget(gauge, area);
}

fn render_hints(frame: &mut Frame, area: Rect) {
    frame.render_widget(
        Paragraph::new(
            " [Space] pause/resume  [←/→] seek  [↑/↓] speed  [Home/End] jump  [q] quit ",
        )
        .style(Style::default().fg(Color::DarkGray)),
        area,
    );
}
