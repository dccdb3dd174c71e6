use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Gauge, Paragraph, Widget},
};
use unicode_width::UnicodeWidthChar;

use crate::{
    app::{format_clock, App, Notice},
    config::ConfigStore,
    engine::EngineState,
    phase::PhaseKind,
};

const HORIZONTAL_MARGIN: u16 = 4;
const GAUGE_WIDTH: u16 = 50;

const FG_COLOR: Color = Color::Rgb(210, 218, 226);
const ACCENT_COLOR: Color = Color::Rgb(52, 172, 224);
const WORK_COLOR: Color = Color::Rgb(51, 217, 178);
const BREAK_COLOR: Color = Color::Rgb(112, 111, 211);
const LONG_BREAK_COLOR: Color = Color::Rgb(255, 177, 66);
const PAUSE_COLOR: Color = Color::Rgb(255, 82, 82);

pub fn phase_color(kind: PhaseKind) -> Color {
    match kind {
        PhaseKind::Work => WORK_COLOR,
        PhaseKind::ShortBreak => BREAK_COLOR,
        PhaseKind::LongBreak => LONG_BREAK_COLOR,
    }
}

/// Keeps the tail of `text` that fits in `width` columns.
fn fit_tail(text: &str, width: usize) -> String {
    let mut used = 0;
    let mut kept: Vec<char> = Vec::new();
    for c in text.chars().rev() {
        let w = c.width().unwrap_or(0);
        if used + w > width {
            break;
        }
        used += w;
        kept.push(c);
    }
    kept.into_iter().rev().collect()
}

impl<S: ConfigStore> Widget for &App<S> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let engine = &self.engine;
        let bold_style = Style::default().add_modifier(Modifier::BOLD);
        let dim_style = Style::default().add_modifier(Modifier::DIM);

        let content_height = 13;
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .constraints([
                Constraint::Length(area.height.saturating_sub(content_height) / 2),
                Constraint::Length(1), // clock
                Constraint::Length(1),
                Constraint::Length(1), // status
                Constraint::Length(1),
                Constraint::Length(1), // gauge
                Constraint::Length(1),
                Constraint::Length(3), // task
                Constraint::Length(1), // stats
                Constraint::Length(1), // notice
                Constraint::Length(1), // hints
                Constraint::Min(0),
            ])
            .split(area);

        let state = engine.state();
        let active_kind = engine.phase().map(|p| p.kind);
        let color = match (state, active_kind) {
            (EngineState::Paused, _) => PAUSE_COLOR,
            (EngineState::Idle, _) | (_, None) => ACCENT_COLOR,
            (_, Some(kind)) => phase_color(kind),
        };

        Paragraph::new(Span::styled(
            format_clock(engine.remaining_seconds()),
            bold_style.fg(FG_COLOR),
        ))
        .alignment(Alignment::Center)
        .render(chunks[1], buf);

        let status = match (state, active_kind) {
            (EngineState::Idle, _) | (_, None) => "Ready?".to_string(),
            (EngineState::Paused, Some(kind)) => {
                format!("{} (paused)", status_label(engine.task_label(), kind))
            }
            (_, Some(kind)) => status_label(engine.task_label(), kind),
        };
        Paragraph::new(Span::styled(status, bold_style.fg(color)))
            .alignment(Alignment::Center)
            .render(chunks[3], buf);

        let gauge_area = centered_row(chunks[5], GAUGE_WIDTH);
        Gauge::default()
            .gauge_style(Style::default().fg(color))
            .ratio(engine.fraction_elapsed())
            .label("")
            .render(gauge_area, buf);

        let task_area = centered_row(chunks[7], GAUGE_WIDTH);
        let inner_width = task_area.width.saturating_sub(2) as usize;
        let editable = state == EngineState::Idle;
        let task_line = if self.task_input.is_empty() && editable {
            Span::styled(
                engine.placeholder().to_string(),
                dim_style.add_modifier(Modifier::ITALIC),
            )
        } else if editable {
            Span::raw(format!(
                "{}_",
                fit_tail(&self.task_input, inner_width.saturating_sub(1))
            ))
        } else {
            Span::styled(fit_tail(engine.task_label(), inner_width), dim_style)
        };
        Paragraph::new(task_line)
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL).title("Task"))
            .render(task_area, buf);

        let today = engine.today();
        let stats = engine.stats();
        Paragraph::new(Line::from(vec![
            Span::styled(format!("{}", engine.completed_today()), bold_style.fg(WORK_COLOR)),
            Span::raw(" today  "),
            Span::styled(format!("{}", stats.streak_ending(today)), bold_style),
            Span::raw(" day streak  "),
            Span::styled(format!("{}", stats.total()), bold_style),
            Span::raw(" total"),
        ]))
        .alignment(Alignment::Center)
        .render(chunks[8], buf);

        if let Some(notice) = &self.notice {
            let (text, style) = match notice {
                Notice::Warning(msg) => (msg.as_str(), Style::default().fg(PAUSE_COLOR)),
                Notice::Info(msg) => (msg.as_str(), Style::default().fg(ACCENT_COLOR)),
            };
            Paragraph::new(Span::styled(text.to_string(), style))
                .alignment(Alignment::Center)
                .render(chunks[9], buf);
        }

        let hints = match state {
            EngineState::Idle => "(enter) start / (esc) quit",
            EngineState::Running => "(space) pause / (r)eset / (q)uit",
            EngineState::Paused => "(space) resume / (r)eset / (q)uit",
            EngineState::PhaseComplete | EngineState::AwaitingContinuation => "(y)es / (n)o",
        };
        Paragraph::new(Span::styled(hints, dim_style.add_modifier(Modifier::ITALIC)))
            .alignment(Alignment::Center)
            .render(chunks[10], buf);

        if state == EngineState::AwaitingContinuation {
            render_continuation_prompt(self, area, buf);
        }
    }
}

fn status_label(task: &str, kind: PhaseKind) -> String {
    match kind {
        PhaseKind::Work => task.trim().to_string(),
        other => other.to_string(),
    }
}

fn centered_row(row: Rect, width: u16) -> Rect {
    let width = width.min(row.width);
    Rect {
        x: row.x + (row.width - width) / 2,
        width,
        ..row
    }
}

fn render_continuation_prompt<S: ConfigStore>(app: &App<S>, area: Rect, buf: &mut Buffer) {
    let width = 44.min(area.width);
    let height = 5.min(area.height);
    let popup = Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    };
    let finished = app
        .last_completed
        .map(|kind| format!("{kind} complete"))
        .unwrap_or_else(|| "Session complete".to_string());
    let next = app.engine.next_phase_kind();

    Clear.render(popup, buf);
    Paragraph::new(vec![
        Line::from(Span::styled(
            finished,
            Style::default()
                .fg(ACCENT_COLOR)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(vec![
            Span::raw("Start "),
            Span::styled(next.to_string(), Style::default().fg(phase_color(next))),
            Span::raw("? (y/n)"),
        ]),
    ])
    .alignment(Alignment::Center)
    .block(Block::default().borders(Borders::ALL).title("Session Complete"))
    .render(popup, buf);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FileConfigStore;
    use crate::cue::SilentCue;
    use crate::engine::SessionEngine;
    use tempfile::tempdir;

    fn buffer_text(buf: &Buffer) -> String {
        let area = buf.area;
        let mut out = String::new();
        for y in area.top()..area.bottom() {
            for x in area.left()..area.right() {
                out.push_str(buf[(x, y)].symbol());
            }
            out.push('\n');
        }
        out
    }

    fn render(app: &App<FileConfigStore>) -> String {
        let area = Rect::new(0, 0, 80, 24);
        let mut buf = Buffer::empty(area);
        app.render(area, &mut buf);
        buffer_text(&buf)
    }

    #[test]
    fn fit_tail_keeps_the_end() {
        assert_eq!(fit_tail("hello world", 5), "world");
        assert_eq!(fit_tail("short", 10), "short");
        assert_eq!(fit_tail("日本語", 4), "本語");
    }

    #[test]
    fn idle_screen_shows_placeholder_and_ready() {
        let dir = tempdir().unwrap();
        let store = FileConfigStore::with_path(dir.path().join("doc.json"));
        let app = App::new(SessionEngine::new(store, Box::new(SilentCue)));
        let text = render(&app);
        assert!(text.contains("00:00"));
        assert!(text.contains("Ready?"));
        assert!(text.contains("What are you working on?"));
    }

    #[test]
    fn running_screen_shows_clock_and_task() {
        let dir = tempdir().unwrap();
        let store = FileConfigStore::with_path(dir.path().join("doc.json"));
        let mut app =
            App::new(SessionEngine::new(store, Box::new(SilentCue))).with_task("Write spec");
        app.start();
        let text = render(&app);
        assert!(text.contains("25:00"));
        assert!(text.contains("Write spec"));
        assert!(text.contains("(space) pause"));
    }
}
