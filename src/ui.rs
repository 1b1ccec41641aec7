use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget, Wrap},
};
use unicode_width::UnicodeWidthStr;

use crate::{
    app::App,
    session::{Judgment, Phase, Snapshot, TypingSession},
    timer::Clock,
};

const HORIZONTAL_MARGIN: u16 = 5;

/// Zero-pads a counter to three digits: `7` -> `007`.
pub fn format_counter(n: usize) -> String {
    format!("{n:03}")
}

/// Seconds with a unit, padded to three characters: `9` -> `09s`.
pub fn format_timer(secs: u32) -> String {
    format!("{:0>3}", format!("{secs}s"))
}

/// Rounds a rate to the nearest whole number and pads it like a counter.
pub fn format_rate(rate: f64) -> String {
    format_counter(rate.round().max(0.0) as usize)
}

fn styles() -> (Style, Style, Style, Style) {
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let correct = bold.fg(Color::Green);
    let incorrect = bold.fg(Color::Red);
    let pending = bold.add_modifier(Modifier::DIM);
    (bold, correct, incorrect, pending)
}

/// Styled characters of the passage: what was typed right, what was typed
/// wrong, the cursor and what is still to come.
pub fn passage_spans(session: &TypingSession, snapshot: &Snapshot) -> Vec<Span<'static>> {
    let (_, correct, incorrect, pending) = styles();
    let cursor_style = pending.add_modifier(Modifier::UNDERLINED);

    let mut spans = Vec::with_capacity(snapshot.judgments.len());
    for (idx, (expected, judgment)) in session
        .chars()
        .iter()
        .zip(snapshot.judgments.iter())
        .enumerate()
    {
        let span = match judgment {
            Judgment::Correct => Span::styled(expected.to_string(), correct),
            Judgment::Incorrect => {
                let typed = session.input()[idx].char;
                let shown = if typed.is_whitespace() {
                    "·".to_owned()
                } else {
                    typed.to_string()
                };
                Span::styled(shown, incorrect)
            }
            Judgment::Unvisited if idx == snapshot.cursor && !snapshot.finished => {
                Span::styled(expected.to_string(), cursor_style)
            }
            Judgment::Unvisited => Span::styled(expected.to_string(), pending),
        };
        spans.push(span);
    }
    spans
}

/// `time  mistakes  wpm  cpm` line.
pub fn counters_line(snapshot: &Snapshot) -> Line<'static> {
    let (bold, ..) = styles();
    let label = Style::default().add_modifier(Modifier::DIM);
    let cell = |name: &'static str, value: String| {
        [
            Span::styled(format!("{name} "), label),
            Span::styled(value, bold),
            Span::raw("   "),
        ]
    };

    let mut spans = Vec::new();
    spans.extend(cell("time", format_timer(snapshot.remaining_secs)));
    spans.extend(cell("mistakes", format_counter(snapshot.mistakes)));
    spans.extend(cell("wpm", format_rate(snapshot.metrics.words_per_minute)));
    spans.extend(cell("cpm", format_rate(snapshot.metrics.chars_per_minute)));
    spans.pop();
    Line::from(spans)
}

fn hint_line(snapshot: &Snapshot) -> Line<'static> {
    let dim_italic = Style::default().add_modifier(Modifier::DIM | Modifier::ITALIC);
    let text = match snapshot.phase {
        Phase::NotStarted => "start typing to begin   tab new text   esc quit".to_string(),
        Phase::Running => "tab new text   ← restart   esc quit".to_string(),
        Phase::Finished => format!(
            "finished · {}% acc   tab try again   ← restart   esc quit",
            snapshot.metrics.accuracy
        ),
    };
    Line::from(Span::styled(text, dim_italic))
}

impl<C: Clock> Widget for &App<C> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let session = self.session();
        let snapshot = session.snapshot();

        let max_chars_per_line = area.width.saturating_sub(HORIZONTAL_MARGIN * 2).max(1);
        let text_width = session.text().width();
        let prompt_lines = if text_width <= max_chars_per_line as usize {
            1
        } else {
            ((text_width as f64 / max_chars_per_line as f64).ceil() + 1.0) as u16
        };
        let padding = area.height.saturating_sub(prompt_lines + 4) / 2;

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .constraints(
                [
                    Constraint::Length(padding),
                    Constraint::Length(prompt_lines),
                    Constraint::Length(1),
                    Constraint::Length(1),
                    Constraint::Length(1),
                    Constraint::Length(1),
                    Constraint::Min(0),
                ]
                .as_ref(),
            )
            .split(area);

        Paragraph::new(Line::from(passage_spans(session, &snapshot)))
            .alignment(if prompt_lines == 1 {
                Alignment::Center
            } else {
                Alignment::Left
            })
            .wrap(Wrap { trim: false })
            .render(chunks[1], buf);

        Paragraph::new(counters_line(&snapshot))
            .alignment(Alignment::Center)
            .render(chunks[3], buf);

        Paragraph::new(hint_line(&snapshot))
            .alignment(Alignment::Center)
            .render(chunks[5], buf);
    }
}
