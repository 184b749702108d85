use std::sync::Arc;
use std::time::Duration;

use pickfield_core::{CatalogSearch, ElementId, SearchTransport};
use tokio::sync::mpsc::UnboundedSender;

use crate::event::AppEvent;

/// Run a catalog search after `latency` and report it back to the event loop.
///
/// Nothing orders concurrent searches: whichever finishes last is shown.
pub fn spawn_search(
    tx: UnboundedSender<AppEvent>,
    transport: Arc<CatalogSearch>,
    field: ElementId,
    query: String,
    latency: Duration,
) {
    tokio::spawn(async move {
        tokio::time::sleep(latency).await;
        let items = transport.search(&query);
        let _ = tx.send(AppEvent::SearchDelivered { field, query, items });
    });
}
