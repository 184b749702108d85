
use crossterm::event::{KeyCode, KeyModifiers};

use crate::app::App;

pub fn handle_key(app: &mut App, code: KeyCode, modifiers: KeyModifiers) {
    if modifiers.contains(KeyModifiers::CONTROL) {
        handle_control(app, code);
        return;
    }

    // Form preview takes priority
    if app.form_preview.is_some() {
        if matches!(code, KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q')) {
            app.form_preview = None;
        }
        return;
    }

    match code {
        KeyCode::Tab => app.cycle_focus(true),
        KeyCode::BackTab => app.cycle_focus(false),
        KeyCode::Down => app.move_highlight(1),
        KeyCode::Up => app.move_highlight(-1),
        KeyCode::Enter => app.activate_highlighted(),
        KeyCode::Esc => app.escape(),
        KeyCode::Backspace => app.backspace(),
        KeyCode::Char(c) => app.type_char(c),
        _ => {}
    }
}

fn handle_control(app: &mut App, code: KeyCode) {
    match code {
        KeyCode::Char('c') => app.should_quit = true,
        KeyCode::Char('s') => app.show_form(),
        _ if app.form_preview.is_some() => {}
        KeyCode::Char('o') => app.open_dialog(),
        KeyCode::Char('r') => app.swap_coordinator(),
        KeyCode::Char('d') => app.clear_single(),
        KeyCode::Char('x') => app.remove_last_chip(),
        _ => {}
    }
}
