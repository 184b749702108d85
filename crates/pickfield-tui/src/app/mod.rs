mod search;

use std::sync::Arc;
use std::time::Duration;

use pickfield_core::widgets::{self, class};
use pickfield_core::{
    AppConfig, Catalog, CatalogSearch, Document, ElementId, EnvironmentEvent, FieldController,
    FormData, LifecycleManager, Markup, SearchTransport, SelectionChange, SelectionEvent,
    SelectionItem, UiEvent, deliver_results,
};
use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;

use crate::event::AppEvent;
use crate::theme::NordTheme;

pub const PAGE_ID: &str = "caravan";
pub const COORDINATOR_SLOT_ID: &str = "coordinator-slot";
pub const COORDINATOR_ID: &str = "coordinator";
pub const DIALOG_ID: &str = "leaders-dialog";
pub const LEADERS_ID: &str = "leaders";

const EVENT_LOG_LEN: usize = 8;

/// The "New caravan" form: a coordinator picked on the page, leaders picked
/// in a dialog.
pub fn demo_page() -> Markup {
    Markup::block()
        .id(PAGE_ID)
        .child(Markup::text("New caravan"))
        .child(
            Markup::block()
                .id(COORDINATOR_SLOT_ID)
                .child(widgets::single_field(COORDINATOR_ID, "coordenador")),
        )
        .child(dialog_markup())
}

/// Fresh dialog content, as a server would send it on every open.
pub fn dialog_markup() -> Markup {
    Markup::block()
        .id(DIALOG_ID)
        .hidden()
        .child(widgets::multi_field(LEADERS_ID, "lideres", &[]))
}

/// One result row as the UI draws it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultRow {
    pub item: SelectionItem,
    pub highlighted: bool,
}

/// Read-only snapshot of one field for rendering.
#[derive(Debug, Clone, Default)]
pub struct FieldView {
    pub search: String,
    pub focused: bool,
    pub open: bool,
    pub results: Vec<ResultRow>,
    /// Single: text of the display region, when shown.
    pub committed: Option<String>,
    /// Multi: chip names in order.
    pub chips: Vec<String>,
    /// Multi: placeholder text when nothing is selected.
    pub placeholder: Option<String>,
}

pub struct App {
    pub should_quit: bool,
    pub config: AppConfig,
    pub theme: NordTheme,

    pub doc: Document,
    pub manager: LifecycleManager,
    pub transport: Arc<CatalogSearch>,

    /// Search input that receives typing.
    pub focus: Option<ElementId>,

    pub status_message: String,
    /// Most recent selection changes, newest last.
    pub event_log: Vec<String>,
    /// Collected form data shown in a popup.
    pub form_preview: Option<FormData>,
    /// Background searches not yet delivered.
    pub pending_searches: usize,

    search_tx: Option<UnboundedSender<AppEvent>>,
}

impl App {
    pub fn new(config: AppConfig, catalog: Catalog) -> Self {
        let (mut doc, _) = Document::with_page(&demo_page());
        let mut manager = LifecycleManager::new(config.field.clone());
        manager.handle(&mut doc, EnvironmentEvent::PageReady);
        let transport = Arc::new(CatalogSearch::new(catalog, &config.search, &config.field));

        let mut app = Self {
            should_quit: false,
            config,
            theme: NordTheme::default(),
            doc,
            manager,
            transport,
            focus: None,
            status_message: "Tab: next field  Ctrl-O: leaders dialog  Ctrl-S: form data".to_string(),
            event_log: Vec::new(),
            form_preview: None,
            pending_searches: 0,
            search_tx: None,
        };
        if let Some(first) = app.focusables().first().copied() {
            app.focus_on(first);
        }
        app
    }

    /// Build the app with the configured (or built-in) catalog.
    pub fn from_config(config: AppConfig) -> pickfield_core::Result<Self> {
        let catalog = Catalog::from_config(&config.search)?;
        Ok(Self::new(config, catalog))
    }

    /// Route searches through background tasks instead of answering inline.
    pub fn set_search_sender(&mut self, tx: UnboundedSender<AppEvent>) {
        self.search_tx = Some(tx);
    }

    // ─── Lookups ───────────────────────────────────────────

    pub fn element(&self, dom_id: &str) -> Option<ElementId> {
        self.doc.find_by_dom_id(dom_id)
    }

    fn field(&self, dom_id: &str) -> Option<&FieldController> {
        self.element(dom_id).and_then(|root| self.manager.controller(root))
    }

    /// Root of the field owning the focused search input.
    pub fn focused_field(&self) -> Option<ElementId> {
        self.focus
            .filter(|f| self.doc.is_alive(*f))
            .and_then(|f| self.manager.field_of(&self.doc, f))
    }

    /// Search inputs of initialized, displayed fields in document order.
    pub fn focusables(&self) -> Vec<ElementId> {
        let searches: Vec<ElementId> = self
            .manager
            .controllers()
            .map(|(_, c)| c.binding().search)
            .collect();
        self.doc
            .descendants(self.doc.root())
            .into_iter()
            .filter(|id| searches.contains(id) && self.doc.is_displayed(*id))
            .collect()
    }

    pub fn dialog_open(&self) -> bool {
        self.element(DIALOG_ID)
            .is_some_and(|dialog| self.doc.is_displayed(dialog))
    }

    /// Highlighted entry of the focused field's panel.
    pub fn highlighted(&self) -> Option<ElementId> {
        let root = self.focused_field()?;
        self.manager
            .controller(root)?
            .as_dyn()
            .panel()
            .highlighted(&self.doc)
    }

    pub fn field_view(&self, dom_id: &str) -> Option<FieldView> {
        let root = self.element(dom_id)?;
        let controller = self.manager.controller(root)?;
        let binding = controller.binding();
        let panel = controller.as_dyn().panel();
        let highlighted = panel.highlighted(&self.doc);

        let mut view = FieldView {
            search: self.doc.value(binding.search).to_string(),
            focused: self.focus == Some(binding.search),
            open: panel.is_open(),
            results: panel
                .entries(&self.doc)
                .into_iter()
                .filter_map(|entry| {
                    widgets::read_entry(&self.doc, entry).map(|item| ResultRow {
                        item,
                        highlighted: highlighted == Some(entry),
                    })
                })
                .collect(),
            ..FieldView::default()
        };

        match controller {
            FieldController::Single(single) => {
                let b = single.single_binding();
                view.committed = b
                    .display
                    .filter(|d| self.doc.is_visible(*d))
                    .and_then(|_| b.display_text)
                    .map(|t| self.doc.text(t).to_string());
            }
            FieldController::Multi(multi) => {
                let chips = multi.multi_binding().chips;
                view.chips = self
                    .doc
                    .query_all(chips, class::CHIP)
                    .into_iter()
                    .filter_map(|chip| self.doc.children(chip).first().copied())
                    .map(|name| self.doc.text(name).to_string())
                    .collect();
                view.placeholder = self
                    .doc
                    .query(chips, class::EMPTY)
                    .map(|p| self.doc.text(p).to_string());
            }
        }
        Some(view)
    }

    // ─── Focus & typing ────────────────────────────────────

    fn focus_on(&mut self, search: ElementId) {
        self.focus = Some(search);
        self.manager.dispatch(&mut self.doc, UiEvent::Focus { target: search });
    }

    pub fn cycle_focus(&mut self, forward: bool) {
        let focusables = self.focusables();
        if focusables.is_empty() {
            self.focus = None;
            return;
        }
        let len = focusables.len();
        let next = match self.focus.and_then(|f| focusables.iter().position(|id| *id == f)) {
            Some(i) if forward => (i + 1) % len,
            Some(i) => (i + len - 1) % len,
            None => 0,
        };
        self.focus_on(focusables[next]);
    }

    pub fn type_char(&mut self, c: char) {
        let Some(search) = self.focus else { return };
        let mut value = self.doc.value(search).to_string();
        value.push(c);
        self.input(search, value);
    }

    pub fn backspace(&mut self) {
        let Some(search) = self.focus else { return };
        let mut value = self.doc.value(search).to_string();
        if value.pop().is_none() {
            return;
        }
        self.input(search, value);
    }

    fn input(&mut self, search: ElementId, value: String) {
        self.manager
            .dispatch(&mut self.doc, UiEvent::Input { target: search, value });
        self.sync_events();
        self.request_search();
    }

    // ─── Search ────────────────────────────────────────────

    /// Query the transport for the focused field if its panel is open.
    pub fn request_search(&mut self) {
        let Some(root) = self.focused_field() else { return };
        let Some(controller) = self.manager.controller(root) else { return };
        if !controller.is_open() {
            return;
        }
        let query = self.doc.value(controller.binding().search).to_string();

        match &self.search_tx {
            Some(tx) => {
                debug!(field = %root, query, "search requested");
                self.pending_searches += 1;
                search::spawn_search(
                    tx.clone(),
                    Arc::clone(&self.transport),
                    root,
                    query,
                    Duration::from_millis(self.config.search.latency_ms),
                );
            }
            None => {
                let items = self.transport.search(&query);
                self.pending_searches += 1;
                self.on_search_delivered(root, query, items);
            }
        }
    }

    /// Show results for `field`. Results for a field that no longer exists are dropped.
    pub fn on_search_delivered(
        &mut self,
        field: ElementId,
        query: String,
        items: Vec<SelectionItem>,
    ) {
        self.pending_searches = self.pending_searches.saturating_sub(1);
        let Some(results) = self.manager.controller(field).map(|c| c.binding().results) else {
            debug!(field = %field, query, "dropped results for a released field");
            return;
        };
        deliver_results(&mut self.doc, results, &items);
        self.status_message = match items.len() {
            0 => format!("No matches for \"{query}\""),
            1 => format!("1 match for \"{query}\""),
            n => format!("{n} matches for \"{query}\""),
        };
    }

    // ─── Results panel ─────────────────────────────────────

    /// Move the highlight by `delta` entries, clamped to the list.
    pub fn move_highlight(&mut self, delta: isize) {
        let Some(root) = self.focused_field() else { return };
        let Some(controller) = self.manager.controller(root) else { return };
        let panel = controller.as_dyn().panel();
        if !panel.is_open() {
            return;
        }
        let entries = panel.entries(&self.doc);
        if entries.is_empty() {
            return;
        }
        let current = panel
            .highlighted(&self.doc)
            .and_then(|h| entries.iter().position(|e| *e == h));
        let last = entries.len() as isize - 1;
        let next = match current {
            Some(i) => (i as isize + delta).clamp(0, last) as usize,
            None if delta < 0 => entries.len() - 1,
            None => 0,
        };

        if let Some(i) = current {
            self.manager
                .dispatch(&mut self.doc, UiEvent::PointerOut { target: entries[i] });
        }
        self.manager
            .dispatch(&mut self.doc, UiEvent::PointerOver { target: entries[next] });
    }

    pub fn activate_highlighted(&mut self) {
        match self.highlighted() {
            Some(entry) => {
                self.manager.dispatch(&mut self.doc, UiEvent::Click { target: entry });
                self.sync_events();
            }
            None => self.status_message = "Use Up/Down to pick a result".to_string(),
        }
    }

    /// Close open panels as a click elsewhere would; with none open, hide the dialog.
    pub fn escape(&mut self) {
        let any_open = self.manager.controllers().any(|(_, c)| c.is_open());
        if any_open {
            if let Some(page) = self.element(PAGE_ID) {
                self.manager.dispatch(&mut self.doc, UiEvent::Click { target: page });
            }
        } else if self.dialog_open() {
            self.hide_dialog();
        }
    }

    // ─── Dialog & partial updates ──────────────────────────

    /// Swap in fresh dialog content and show it.
    pub fn open_dialog(&mut self) {
        let Some(old) = self.element(DIALOG_ID) else { return };
        let Some(dialog) = self.doc.replace(old, &dialog_markup()) else { return };
        self.manager
            .handle(&mut self.doc, EnvironmentEvent::ContentReplaced { root: dialog });
        self.doc.set_visible(dialog, true);
        self.manager
            .handle(&mut self.doc, EnvironmentEvent::ContainerShown { container: dialog });

        if let Some(search) = self.field(LEADERS_ID).map(|c| c.binding().search) {
            self.focus_on(search);
        }
        self.status_message = "Leaders dialog open (Esc closes)".to_string();
    }

    pub fn hide_dialog(&mut self) {
        let Some(dialog) = self.element(DIALOG_ID) else { return };
        self.doc.set_visible(dialog, false);
        self.manager
            .handle(&mut self.doc, EnvironmentEvent::ContainerHidden { container: dialog });
        if self.focus.is_some_and(|f| self.doc.contains(dialog, f)) {
            self.focus = None;
            self.cycle_focus(true);
        }
        self.status_message = "Leaders dialog closed".to_string();
    }

    /// Re-render the coordinator fragment as a server would after a partial
    /// update, carrying over its committed value.
    pub fn swap_coordinator(&mut self) {
        let Some(slot) = self.element(COORDINATOR_SLOT_ID) else { return };
        let committed = self
            .field(COORDINATOR_ID)
            .and_then(|c| c.as_single())
            .and_then(|s| s.committed().cloned());
        let had_focus = self.focus.is_some_and(|f| self.doc.contains(slot, f));

        self.doc
            .replace_children(slot, &[widgets::single_field(COORDINATOR_ID, "coordenador")]);
        if let Some(item) = &committed {
            let label = item.label(&self.config.field.label_separator);
            if let Some(hidden) = self.doc.query(slot, class::VALUE) {
                self.doc.set_value(hidden, item.id.as_str());
                self.doc.set_attr(hidden, "data-name", item.display_name.as_str());
                self.doc.set_attr(hidden, "data-doc", item.secondary_label.as_str());
            }
            if let Some(search) = self.doc.query(slot, class::SEARCH) {
                self.doc.set_value(search, label.as_str());
            }
            if let Some(text) = self.doc.query(slot, class::SELECTED_TEXT) {
                self.doc.set_text(text, label.as_str());
            }
            if let Some(display) = self.doc.query(slot, class::SELECTED) {
                self.doc.set_visible(display, true);
            }
        }
        self.manager
            .handle(&mut self.doc, EnvironmentEvent::ContentReplaced { root: slot });

        if had_focus
            && let Some(search) = self.field(COORDINATOR_ID).map(|c| c.binding().search)
        {
            self.focus_on(search);
        }
        self.status_message = "Coordinator fragment re-rendered".to_string();
    }

    pub fn clear_single(&mut self) {
        let clear = self
            .field(COORDINATOR_ID)
            .and_then(|c| c.as_single())
            .and_then(|s| s.single_binding().clear);
        if let Some(target) = clear {
            self.manager.dispatch(&mut self.doc, UiEvent::Click { target });
            self.sync_events();
        }
    }

    pub fn remove_last_chip(&mut self) {
        let Some(multi) = self.field(LEADERS_ID).and_then(|c| c.as_multi()) else {
            self.status_message = "Open the leaders dialog first (Ctrl-O)".to_string();
            return;
        };
        let chips = multi.multi_binding().chips;
        let last = multi.selected().iter().last().map(|i| i.id.clone());
        let Some(last) = last else {
            self.status_message = "No leaders to remove".to_string();
            return;
        };
        let target = self
            .doc
            .query_all(chips, class::REMOVE)
            .into_iter()
            .find(|r| self.doc.data(*r, "item-id") == Some(last.as_str()));
        if let Some(target) = target {
            self.manager.dispatch(&mut self.doc, UiEvent::Click { target });
            self.sync_events();
        }
    }

    pub fn show_form(&mut self) {
        if let Some(page) = self.element(PAGE_ID) {
            self.form_preview = Some(FormData::collect(&self.doc, page));
        }
    }

    // ─── Events ────────────────────────────────────────────

    fn sync_events(&mut self) {
        for event in self.manager.drain_events() {
            let line = describe(&event);
            self.status_message = line.clone();
            self.event_log.push(line);
        }
        if self.event_log.len() > EVENT_LOG_LEN {
            let excess = self.event_log.len() - EVENT_LOG_LEN;
            self.event_log.drain(..excess);
        }
    }
}

fn describe(event: &SelectionEvent) -> String {
    match &event.change {
        SelectionChange::Committed { item } => {
            format!("{}: committed {}", event.key, item.display_name)
        }
        SelectionChange::Cleared => format!("{}: cleared", event.key),
        SelectionChange::Added { item } => format!("{}: added {}", event.key, item.display_name),
        SelectionChange::Removed { id } => format!("{}: removed #{id}", event.key),
    }
}
