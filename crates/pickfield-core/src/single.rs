use tracing::debug;

use crate::config::FieldConfig;
use crate::controller::SelectionController;
use crate::dom::{Document, ElementId};
use crate::event::{SelectionChange, SelectionEvent};
use crate::models::{FieldBinding, SelectionItem, SingleBinding};
use crate::panel::ResultsPanel;

/// Per-instance hook run after an item is committed.
pub type OnSelect = Box<dyn FnMut(&SelectionItem)>;

/// One search field bound to at most one committed item.
///
/// The hidden carrier only ever becomes non-empty through
/// [`on_result_activate`](Self::on_result_activate).
pub struct SingleSelectionController {
    binding: SingleBinding,
    panel: ResultsPanel,
    label_separator: String,
    committed: Option<SelectionItem>,
    on_select: Option<OnSelect>,
}

impl SingleSelectionController {
    pub fn new(doc: &mut Document, binding: SingleBinding, config: &FieldConfig) -> Self {
        let panel = ResultsPanel::new(doc, binding.field.results, config);
        let committed = restore(doc, &binding);
        if let Some(item) = &committed {
            debug!(field = %binding.field.key, id = %item.id, "restored committed item");
        }
        Self {
            binding,
            panel,
            label_separator: config.label_separator.clone(),
            committed,
            on_select: None,
        }
    }

    pub fn with_on_select(mut self, hook: OnSelect) -> Self {
        self.on_select = Some(hook);
        self
    }

    pub fn single_binding(&self) -> &SingleBinding {
        &self.binding
    }

    pub fn committed(&self) -> Option<&SelectionItem> {
        self.committed.as_ref()
    }

    /// Commit `item`: carrier, search text and display region all follow it.
    pub fn on_result_activate(
        &mut self,
        doc: &mut Document,
        item: SelectionItem,
        events: &mut Vec<SelectionEvent>,
    ) {
        let label = item.label(&self.label_separator);
        let hidden = self.binding.hidden;
        doc.set_value(hidden, item.id.as_str());
        doc.set_attr(hidden, "data-name", item.display_name.as_str());
        doc.set_attr(hidden, "data-doc", item.secondary_label.as_str());
        doc.set_value(self.binding.field.search, label.as_str());
        if let Some(text) = self.binding.display_text {
            doc.set_text(text, label.as_str());
        }
        if let Some(display) = self.binding.display {
            doc.set_visible(display, true);
        }
        self.panel.close(doc);

        debug!(field = %self.binding.field.key, id = %item.id, "committed");
        if let Some(hook) = self.on_select.as_mut() {
            hook(&item);
        }
        events.push(self.event(SelectionChange::Committed { item: item.clone() }));
        self.committed = Some(item);
    }

    /// Drop the commitment and the search text.
    pub fn on_clear(&mut self, doc: &mut Document, events: &mut Vec<SelectionEvent>) {
        self.drop_commitment(doc, events);
        doc.set_value(self.binding.field.search, "");
        self.panel.close(doc);
    }

    fn drop_commitment(&mut self, doc: &mut Document, events: &mut Vec<SelectionEvent>) {
        let had_value = !doc.value(self.binding.hidden).is_empty();
        doc.set_value(self.binding.hidden, "");
        if let Some(display) = self.binding.display {
            doc.set_visible(display, false);
        }
        if self.committed.take().is_some() || had_value {
            debug!(field = %self.binding.field.key, "commitment cleared");
            events.push(self.event(SelectionChange::Cleared));
        }
    }

    fn event(&self, change: SelectionChange) -> SelectionEvent {
        SelectionEvent {
            field: self.binding.field.root,
            key: self.binding.field.key.clone(),
            change,
        }
    }
}

impl SelectionController for SingleSelectionController {
    fn binding(&self) -> &FieldBinding {
        &self.binding.field
    }

    fn panel(&self) -> &ResultsPanel {
        &self.panel
    }

    fn panel_mut(&mut self) -> &mut ResultsPanel {
        &mut self.panel
    }

    /// Typing invalidates a stale commitment before a new one is made.
    fn text_changed(&mut self, doc: &mut Document, events: &mut Vec<SelectionEvent>) {
        if self.committed.is_some() || !doc.value(self.binding.hidden).is_empty() {
            self.drop_commitment(doc, events);
        }
    }

    fn activate(
        &mut self,
        doc: &mut Document,
        item: SelectionItem,
        events: &mut Vec<SelectionEvent>,
    ) {
        self.on_result_activate(doc, item, events);
    }

    fn own_click(
        &mut self,
        doc: &mut Document,
        target: ElementId,
        events: &mut Vec<SelectionEvent>,
    ) -> bool {
        match self.binding.clear {
            Some(clear) if doc.contains(clear, target) => {
                self.on_clear(doc, events);
                true
            }
            _ => false,
        }
    }
}

impl std::fmt::Debug for SingleSelectionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SingleSelectionController")
            .field("binding", &self.binding)
            .field("panel", &self.panel)
            .field("committed", &self.committed)
            .field("on_select", &self.on_select.is_some())
            .finish()
    }
}

/// Rebuild the committed item from a server-rendered carrier.
fn restore(doc: &Document, binding: &SingleBinding) -> Option<SelectionItem> {
    let id = doc.value(binding.hidden);
    if id.is_empty() {
        return None;
    }
    let name = doc
        .data(binding.hidden, "name")
        .unwrap_or_else(|| doc.value(binding.field.search));
    let secondary = doc.data(binding.hidden, "doc").unwrap_or_default();
    Some(SelectionItem::new(id, name, secondary))
}
