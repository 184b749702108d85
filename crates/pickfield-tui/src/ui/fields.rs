use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, Paragraph};

use crate::app::{App, FieldView};

/// Search line, selection summary and, when open, the results panel.
pub(crate) fn render_field(frame: &mut Frame, app: &App, view: &FieldView, area: Rect) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // search
            Constraint::Length(1), // selection
            Constraint::Min(0),    // results
        ])
        .split(area);

    let (indicator, search_style) = if view.focused {
        ("▶ ", Style::default().fg(app.theme.focused_field()).add_modifier(Modifier::BOLD))
    } else {
        ("  ", Style::default().fg(app.theme.fg()))
    };
    let search = if view.focused {
        format!("{}█", view.search)
    } else if view.search.is_empty() {
        "─".to_string()
    } else {
        view.search.clone()
    };
    frame.render_widget(
        Paragraph::new(Line::from(vec![
            Span::styled(indicator, Style::default().fg(app.theme.focused_field())),
            Span::styled("Search: ", Style::default().fg(app.theme.muted())),
            Span::styled(search, search_style),
        ])),
        layout[0],
    );

    frame.render_widget(Paragraph::new(selection_line(app, view)), layout[1]);

    if view.open {
        render_results(frame, app, view, layout[2]);
    }
}

fn selection_line<'a>(app: &App, view: &'a FieldView) -> Line<'a> {
    if let Some(ref committed) = view.committed {
        return Line::from(vec![
            Span::raw("  "),
            Span::styled("✓ ", Style::default().fg(app.theme.committed())),
            Span::styled(committed.as_str(), Style::default().fg(app.theme.committed())),
        ]);
    }
    if let Some(ref placeholder) = view.placeholder {
        return Line::from(Span::styled(
            format!("  {placeholder}"),
            Style::default().fg(app.theme.muted()).add_modifier(Modifier::ITALIC),
        ));
    }

    let mut spans = vec![Span::raw("  ")];
    for chip in &view.chips {
        spans.push(Span::styled(
            format!("[{chip} "),
            Style::default().fg(app.theme.chip_color()),
        ));
        spans.push(Span::styled("×", Style::default().fg(app.theme.danger())));
        spans.push(Span::styled("] ", Style::default().fg(app.theme.chip_color())));
    }
    Line::from(spans)
}

fn render_results(frame: &mut Frame, app: &App, view: &FieldView, area: Rect) {
    let block = Block::default()
        .borders(Borders::TOP)
        .border_style(Style::default().fg(app.theme.border()).add_modifier(Modifier::DIM));

    if view.results.is_empty() {
        let text = if app.pending_searches > 0 { "  searching…" } else { "  no results" };
        frame.render_widget(
            Paragraph::new(Span::styled(text, Style::default().fg(app.theme.muted()))).block(block),
            area,
        );
        return;
    }

    let items: Vec<ListItem> = view
        .results
        .iter()
        .map(|row| {
            let base = if row.highlighted {
                Style::default().bg(app.theme.highlight_bg()).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            ListItem::new(Line::from(vec![
                Span::styled(format!("  {}", row.item.display_name), base.fg(app.theme.fg())),
                Span::styled(
                    format!("  {}", row.item.secondary_label),
                    base.fg(app.theme.secondary_label()),
                ),
            ]))
        })
        .collect();
    frame.render_widget(List::new(items).block(block), area);
}
