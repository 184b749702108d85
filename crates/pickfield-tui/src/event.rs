use std::time::Duration;

use anyhow::Result;
use crossterm::event::{self, Event as CrosstermEvent, KeyEvent};
use pickfield_core::{ElementId, SelectionItem};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

/// Events that the TUI can handle.
#[derive(Debug)]
pub enum AppEvent {
    /// A key press event.
    Key(KeyEvent),
    /// Terminal was resized.
    Resize(u16, u16),
    /// Periodic tick for background updates.
    Tick,
    /// A background search finished for the field rooted at `field`.
    SearchDelivered {
        field: ElementId,
        query: String,
        items: Vec<SelectionItem>,
    },
}

/// Polls for terminal events with a configurable tick rate, and drains
/// results sent back by background tasks.
pub struct EventHandler {
    tick_rate: Duration,
    rx: UnboundedReceiver<AppEvent>,
}

impl EventHandler {
    /// Create a handler and the sender background tasks report through.
    pub fn new(tick_rate: Duration) -> (Self, UnboundedSender<AppEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tick_rate, rx }, tx)
    }

    /// Block until the next event (background result, key press, resize, or tick timeout).
    pub fn next(&mut self) -> Result<AppEvent> {
        if let Ok(event) = self.rx.try_recv() {
            return Ok(event);
        }
        if event::poll(self.tick_rate)? {
            match event::read()? {
                CrosstermEvent::Key(key) => Ok(AppEvent::Key(key)),
                CrosstermEvent::Resize(w, h) => Ok(AppEvent::Resize(w, h)),
                _ => Ok(AppEvent::Tick),
            }
        } else {
            Ok(AppEvent::Tick)
        }
    }
}
