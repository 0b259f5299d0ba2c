use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget, Wrap},
};
use unicode_width::UnicodeWidthStr;

use crate::{App, StartMode, TIMER_PRESETS};
use capquiz::run::{Mode, Outcome, Phase};

const HORIZONTAL_MARGIN: u16 = 5;

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        match self.engine.state.phase {
            Phase::Idle => render_idle(self, area, buf),
            Phase::Running => render_running(self, area, buf),
            Phase::Summary => render_summary(self, area, buf),
        }
    }
}

/// Vertically center a block of `height` rows inside `area`.
fn centered(area: Rect, height: u16) -> Rect {
    let top = area.height.saturating_sub(height) / 2;
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .constraints([
            Constraint::Length(top),
            Constraint::Length(height),
            Constraint::Min(0),
        ])
        .split(area);
    chunks[1]
}

fn dim() -> Style {
    Style::default().add_modifier(Modifier::DIM)
}

fn bold() -> Style {
    Style::default().add_modifier(Modifier::BOLD)
}

fn hint_style() -> Style {
    Style::default()
        .add_modifier(Modifier::DIM)
        .add_modifier(Modifier::ITALIC)
}

fn render_idle(app: &App, area: Rect, buf: &mut Buffer) {
    let title_style = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);
    let picked = bold().fg(Color::Green);

    let deck_selected = app.settings.start_mode == StartMode::Deck;

    let mut lines = vec![
        Line::styled("capquiz", title_style).alignment(Alignment::Center),
        Line::raw(""),
        Line::from(vec![
            Span::styled("[d] deck run", if deck_selected { picked } else { dim() }),
            Span::raw("    "),
            Span::styled("[t] timed run", if deck_selected { dim() } else { picked }),
        ])
        .alignment(Alignment::Center),
    ];

    if deck_selected {
        lines.push(Line::raw(""));
        lines.push(
            Line::styled("one pass through the shuffled deck, then the summary", dim())
                .alignment(Alignment::Center),
        );
    } else {
        let presets = TIMER_PRESETS
            .iter()
            .enumerate()
            .flat_map(|(i, &secs)| {
                let key_hint = format!("[{}] {}s", i + 1, secs);
                let style = if app.settings.seconds == secs {
                    picked
                } else {
                    dim()
                };
                [Span::styled(key_hint, style), Span::raw("   ")]
            })
            .collect::<Vec<Span>>();
        lines.push(Line::from(presets).alignment(Alignment::Center));
        lines.push(Line::raw(""));
        lines.push(
            Line::styled(
                "the deck reshuffles underneath until the clock runs out",
                dim(),
            )
            .alignment(Alignment::Center),
        );
    }

    lines.push(Line::raw(""));
    let start_label = if deck_selected {
        "press enter to start a deck run".to_string()
    } else {
        format!(
            "press enter to start a timed run ({}s)",
            app.settings.seconds
        )
    };
    lines.push(Line::styled(start_label, bold()).alignment(Alignment::Center));
    lines.push(Line::raw(""));
    lines.push(
        Line::styled(
            format!("{} countries loaded", app.engine.dataset_size()),
            dim(),
        )
        .alignment(Alignment::Center),
    );

    let height = lines.len() as u16;
    Paragraph::new(lines)
        .wrap(Wrap { trim: true })
        .render(centered(area, height), buf);
}

fn render_running(app: &App, area: Rect, buf: &mut Buffer) {
    let engine = &app.engine;
    let sep = Span::styled(" · ", dim());

    // HUD row: time (timed only), deck position, score, streak
    let mut hud: Vec<Span> = Vec::new();
    if let Some(secs) = engine.seconds_left() {
        hud.push(Span::styled(format!("time {secs}s"), bold()));
        hud.push(sep.clone());
    }
    let position_label = match engine.state.mode {
        Mode::Deck => "card",
        Mode::Timed => "deck",
    };
    hud.push(Span::raw(format!(
        "{} {} / {}",
        position_label,
        engine.progress(),
        engine.total()
    )));
    hud.push(sep.clone());
    hud.push(Span::raw(format!(
        "correct {} / {}",
        engine.state.score, engine.state.attempts
    )));
    hud.push(sep);
    hud.push(Span::raw(format!(
        "streak {} (best {})",
        engine.state.current_streak, engine.state.best_streak
    )));

    let question = engine
        .current()
        .map(|record| {
            Line::from(vec![
                Span::raw("What is the capital of "),
                Span::styled(record.country.clone(), bold()),
                Span::raw("?"),
            ])
        })
        .unwrap_or_else(|| Line::raw(""));

    let mut input: Vec<Span> = vec![
        Span::styled("> ", dim()),
        Span::raw(engine.state.answer.clone()),
        Span::styled("█", dim()),
    ];
    match engine.state.flash.map(|f| f.outcome) {
        Some(Outcome::Correct) => input.push(Span::styled("  ✓", bold().fg(Color::Green))),
        Some(Outcome::Incorrect) => input.push(Span::styled("  ✗", bold().fg(Color::Red))),
        None => {}
    }

    // Small prompts read best centered; long country names fall back left.
    let question_width: usize = engine
        .current()
        .map(|r| r.country.width() + "What is the capital of ?".width())
        .unwrap_or(0);
    let alignment = if question_width + (HORIZONTAL_MARGIN as usize * 2) < area.width as usize {
        Alignment::Center
    } else {
        Alignment::Left
    };

    let lines = vec![
        Line::from(hud).alignment(Alignment::Center),
        Line::raw(""),
        question.alignment(alignment),
        Line::raw(""),
        Line::from(input).alignment(alignment),
        Line::raw(""),
        Line::styled("enter to check · esc to end the run", hint_style()).alignment(Alignment::Center),
    ];

    let height = lines.len() as u16;
    Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .render(centered(area, height), buf);
}

fn render_summary(app: &App, area: Rect, buf: &mut Buffer) {
    let engine = &app.engine;
    let title_style = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);

    let mode_line = match engine.state.mode {
        Mode::Timed => format!(
            "mode: {} · {}s",
            engine.state.mode.label(),
            app.settings.seconds
        ),
        Mode::Deck => format!("mode: {}", engine.state.mode.label()),
    };

    let lines = vec![
        Line::styled("run summary", title_style).alignment(Alignment::Center),
        Line::raw(""),
        Line::styled(mode_line, dim()).alignment(Alignment::Center),
        Line::raw(""),
        Line::from(vec![
            Span::raw("correct "),
            Span::styled(engine.state.score.to_string(), bold().fg(Color::Green)),
            Span::raw(" / "),
            Span::styled(engine.state.attempts.to_string(), bold()),
            Span::styled(format!("  (accuracy {}%)", engine.accuracy()), dim()),
        ])
        .alignment(Alignment::Center),
        Line::from(vec![
            Span::raw("best streak "),
            Span::styled(engine.state.best_streak.to_string(), bold().fg(Color::Magenta)),
        ])
        .alignment(Alignment::Center),
        Line::raw(""),
        Line::styled(
            "(enter) play again · (b) back to start · (t) share · (esc) quit",
            hint_style(),
        )
        .alignment(Alignment::Center),
    ];

    let height = lines.len() as u16;
    Paragraph::new(lines)
        .wrap(Wrap { trim: true })
        .render(centered(area, height), buf);
}
