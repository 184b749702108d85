use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

use pickfield_core::FormData;

use super::centered_rect;
use super::fields::render_field;
use crate::app::{App, LEADERS_ID};

pub(crate) fn render_leaders_dialog(frame: &mut Frame, app: &App, area: Rect) {
    let popup_area = centered_rect(60, 60, area);
    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .title(" Leaders ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(app.theme.frost_blue()))
        .style(Style::default().bg(app.theme.bg()));
    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);

    if let Some(view) = app.field_view(LEADERS_ID) {
        render_field(frame, app, &view, inner);
    }
}

pub(crate) fn render_form_preview(frame: &mut Frame, app: &App, form: &FormData, area: Rect) {
    let popup_area = centered_rect(50, 40, area);
    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .title(" Form data ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(app.theme.green()))
        .style(Style::default().bg(app.theme.bg()));

    let mut lines: Vec<Line> = form
        .iter()
        .map(|(name, values)| {
            Line::from(vec![
                Span::styled(format!("  {name}"), Style::default().fg(app.theme.frost_ice())),
                Span::styled(" = ", Style::default().fg(app.theme.muted())),
                Span::styled(format!("{values:?}"), Style::default().fg(app.theme.fg())),
            ])
        })
        .collect();
    if lines.is_empty() {
        lines.push(Line::from(Span::styled(
            "  (no named inputs)",
            Style::default().fg(app.theme.muted()),
        )));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "  Esc/Enter: close",
        Style::default().fg(app.theme.muted()).add_modifier(Modifier::DIM),
    )));

    frame.render_widget(Paragraph::new(lines).block(block), popup_area);
}
