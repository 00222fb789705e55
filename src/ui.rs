pub mod screen;

use itertools::Itertools;
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget, Wrap},
};
use unicode_width::UnicodeWidthStr;

use crate::backend::Backend;
use crate::controller::SessionPhase;
use crate::snapshot::SnapshotSource;
use crate::util::format_mm_ss;
use crate::App;

const HORIZONTAL_MARGIN: u16 = 2;

impl<B: Backend, S: SnapshotSource> Widget for &App<B, S> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if self.show_completion {
            render_completion(area, buf);
            return;
        }

        match self.controller.phase() {
            SessionPhase::Loading => render_loading(area, buf),
            SessionPhase::Failed => render_failed(self, area, buf),
            SessionPhase::Submitting | SessionPhase::Submitted => render_submitted(area, buf),
            SessionPhase::Ready | SessionPhase::InProgress => render_session(self, area, buf),
        }
    }
}

fn centered_message(lines: Vec<Line>, area: Rect, buf: &mut Buffer) {
    let vertical_pad = area.height.saturating_sub(lines.len() as u16) / 2;
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(vertical_pad), Constraint::Min(1)])
        .split(area);

    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .render(chunks[1], buf);
}

fn render_loading(area: Rect, buf: &mut Buffer) {
    centered_message(
        vec![
            Line::from(Span::styled(
                "Generating personalized task...",
                Style::default()
                    .add_modifier(Modifier::BOLD | Modifier::ITALIC)
                    .fg(Color::Cyan),
            )),
            Line::from(""),
            Line::from(Span::styled(
                "This can take a few seconds.",
                Style::default().add_modifier(Modifier::DIM),
            )),
        ],
        area,
        buf,
    );
}

fn render_failed<B: Backend, S: SnapshotSource>(app: &App<B, S>, area: Rect, buf: &mut Buffer) {
    let message = app
        .controller
        .load_error()
        .unwrap_or("Failed to generate task");
    centered_message(
        vec![
            Line::from(Span::styled(
                message.to_string(),
                Style::default().add_modifier(Modifier::BOLD).fg(Color::Red),
            )),
            Line::from(""),
            Line::from(Span::styled(
                "Close this window and reopen your test link to try again. (esc) to exit",
                Style::default().add_modifier(Modifier::DIM),
            )),
        ],
        area,
        buf,
    );
}

fn render_submitted(area: Rect, buf: &mut Buffer) {
    centered_message(
        vec![Line::from(Span::styled(
            "Submitting your answer...",
            Style::default().add_modifier(Modifier::BOLD).fg(Color::Cyan),
        ))],
        area,
        buf,
    );
}

fn render_completion(area: Rect, buf: &mut Buffer) {
    centered_message(
        vec![
            Line::from(Span::styled(
                "Test submitted",
                Style::default()
                    .add_modifier(Modifier::BOLD)
                    .fg(Color::Green),
            )),
            Line::from(""),
            Line::from("Your answer and activity report have been recorded."),
            Line::from(Span::styled(
                "You may close this window. (esc) to exit",
                Style::default().add_modifier(Modifier::DIM),
            )),
        ],
        area,
        buf,
    );
}

fn render_session<B: Backend, S: SnapshotSource>(app: &App<B, S>, area: Rect, buf: &mut Buffer) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .constraints([
            Constraint::Length(2), // header: title + timer
            Constraint::Min(6),    // task + answer panes
            Constraint::Length(2), // warning banner
            Constraint::Length(1), // legend
        ])
        .split(area);

    render_header(app, chunks[0], buf);

    let panes = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(chunks[1]);

    render_task_pane(app, panes[0], buf);
    render_answer_pane(app, panes[1], buf);
    render_warnings(app, chunks[2], buf);

    let legend = Paragraph::new(Span::styled(
        "(ctrl-s) submit · answer is typed into the right pane",
        Style::default().add_modifier(Modifier::ITALIC),
    ));
    legend.render(chunks[3], buf);
}

fn render_header<B: Backend, S: SnapshotSource>(app: &App<B, S>, area: Rect, buf: &mut Buffer) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(24), Constraint::Length(24)])
        .split(area);

    let proctoring = if app.controller.camera_available() {
        Span::styled("● proctoring + camera", Style::default().fg(Color::Green))
    } else {
        Span::styled("● proctoring active", Style::default().fg(Color::Green))
    };
    let title = Paragraph::new(vec![
        Line::from(Span::styled(
            "Skill Assessment",
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(proctoring),
    ]);
    title.render(columns[0], buf);

    let remaining = app.controller.clock().remaining_secs();
    let timer = Paragraph::new(Span::styled(
        format_mm_ss(remaining),
        Style::default().add_modifier(Modifier::BOLD).fg(Color::Red),
    ))
    .alignment(Alignment::Right);
    timer.render(columns[1], buf);
}

fn render_task_pane<B: Backend, S: SnapshotSource>(app: &App<B, S>, area: Rect, buf: &mut Buffer) {
    let (title, description) = match app.controller.task() {
        Some(task) => (task.name.as_str(), task.description.as_str()),
        None => ("Task", ""),
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" {title} "));
    let paragraph = Paragraph::new(description)
        .block(block)
        .wrap(Wrap { trim: false });
    paragraph.render(area, buf);
}

fn render_answer_pane<B: Backend, S: SnapshotSource>(
    app: &App<B, S>,
    area: Rect,
    buf: &mut Buffer,
) {
    let answer = app.controller.answer();
    let char_count = answer.chars().count();
    let minimum = app.controller.min_answer_chars();

    let count_style = if crate::util::trimmed_len(answer) >= minimum {
        Style::default().fg(Color::Green)
    } else {
        Style::default().add_modifier(Modifier::DIM)
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Your Answer ")
        .title_bottom(
            Line::from(Span::styled(
                format!(" {char_count} chars (min {minimum}) "),
                count_style,
            ))
            .right_aligned(),
        );

    let mut lines: Vec<Line> = answer.split('\n').map(Line::from).collect();
    if let Some(last) = lines.last_mut() {
        last.push_span(Span::styled(
            "▏",
            Style::default().add_modifier(Modifier::SLOW_BLINK),
        ));
    }
    Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false })
        .render(area, buf);
}

fn render_warnings<B: Backend, S: SnapshotSource>(app: &App<B, S>, area: Rect, buf: &mut Buffer) {
    let warnings = app.controller.warnings();
    if warnings.is_empty() {
        return;
    }

    let amber = Style::default().fg(Color::Yellow);
    let joined = warnings.iter().join("  |  ");

    // One line if everything fits, otherwise just the latest warning
    let line = if joined.width() <= area.width.saturating_sub(2 * HORIZONTAL_MARGIN) as usize {
        joined
    } else {
        warnings.latest().unwrap_or_default().to_string()
    };

    Paragraph::new(vec![
        Line::from(Span::styled(
            "Violation detected",
            amber.add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(line, amber)),
    ])
    .render(area, buf);
}
