mod fields;
mod popups;

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};

use crate::app::{App, COORDINATOR_ID};

/// Render the entire UI.
pub fn render(frame: &mut Frame, app: &App) {
    let size = frame.area();

    let main_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),  // title
            Constraint::Min(8),     // form body
            Constraint::Length(10), // event log
            Constraint::Length(1),  // status bar
        ])
        .split(size);

    render_title(frame, app, main_layout[0]);

    let body = Block::default()
        .title(" Coordinator ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(app.theme.border()))
        .style(Style::default().bg(app.theme.bg()));
    let body_inner = body.inner(main_layout[1]);
    frame.render_widget(body, main_layout[1]);
    if let Some(view) = app.field_view(COORDINATOR_ID) {
        fields::render_field(frame, app, &view, body_inner);
    }

    render_event_log(frame, app, main_layout[2]);
    render_statusbar(frame, app, main_layout[3]);

    if app.dialog_open() {
        popups::render_leaders_dialog(frame, app, size);
    }
    if let Some(ref form) = app.form_preview {
        popups::render_form_preview(frame, app, form, size);
    }
}

fn render_title(frame: &mut Frame, app: &App, area: Rect) {
    let line = Line::from(vec![
        Span::styled(
            " New caravan ",
            Style::default()
                .fg(app.theme.fg_bright())
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            " Tab focus  ↑↓ highlight  Enter pick  Esc close  ^O leaders  ^R re-render  ^D clear  ^X remove  ^S form  ^C quit",
            Style::default().fg(app.theme.hint()).add_modifier(Modifier::DIM),
        ),
    ]);
    frame.render_widget(
        Paragraph::new(line).style(Style::default().bg(app.theme.bg())),
        area,
    );
}

fn render_event_log(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .title(" Selection events ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(app.theme.border()))
        .style(Style::default().bg(app.theme.bg()));

    let lines: Vec<Line> = if app.event_log.is_empty() {
        vec![Line::from(Span::styled(
            "  nothing yet",
            Style::default().fg(app.theme.muted()),
        ))]
    } else {
        app.event_log
            .iter()
            .map(|e| {
                Line::from(Span::styled(
                    format!("  {e}"),
                    Style::default().fg(app.theme.event_color()),
                ))
            })
            .collect()
    };
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_statusbar(frame: &mut Frame, app: &App, area: Rect) {
    let mut spans = vec![Span::styled(
        format!(" {} ", app.status_message),
        Style::default().fg(app.theme.fg()),
    )];
    if app.pending_searches > 0 {
        spans.push(Span::styled(
            format!(" searching ({}) ", app.pending_searches),
            Style::default().fg(app.theme.pending()).add_modifier(Modifier::ITALIC),
        ));
    }
    frame.render_widget(
        Paragraph::new(Line::from(spans)).style(Style::default().bg(app.theme.bg_secondary())),
        area,
    );
}

pub(crate) fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
