pub mod app;
pub mod event;
pub mod keys;
pub mod theme;
pub mod ui;

use std::io;
use std::time::Duration;

use anyhow::Result;
use crossterm::ExecutableCommand;
use crossterm::event::KeyEventKind;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;

use app::App;
use event::{AppEvent, EventHandler};

/// Run the full TUI application.
pub fn run_tui(app: &mut App) -> Result<()> {
    // Background searches need a runtime; the draw loop itself stays synchronous.
    let runtime = tokio::runtime::Runtime::new()?;
    let _guard = runtime.enter();

    // Install panic hook
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = crossterm::terminal::disable_raw_mode();
        let _ = std::io::stdout().execute(crossterm::terminal::LeaveAlternateScreen);
        original_hook(info);
    }));

    // Setup terminal
    enable_raw_mode()?;
    io::stdout().execute(EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let tick_rate = Duration::from_millis(app.config.ui.tick_rate_ms);
    let (mut event_handler, tx) = EventHandler::new(tick_rate);
    app.set_search_sender(tx);

    // Main loop
    loop {
        terminal.draw(|frame| ui::render(frame, app))?;

        match event_handler.next()? {
            AppEvent::Key(key) if key.kind == KeyEventKind::Press => {
                keys::handle_key(app, key.code, key.modifiers)
            }
            AppEvent::SearchDelivered { field, query, items } => {
                app.on_search_delivered(field, query, items)
            }
            AppEvent::Key(_) | AppEvent::Resize(_, _) | AppEvent::Tick => {}
        }

        if app.should_quit {
            break;
        }
    }

    // Restore terminal
    disable_raw_mode()?;
    io::stdout().execute(LeaveAlternateScreen)?;
    Ok(())
}
