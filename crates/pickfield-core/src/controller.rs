//! Behaviour shared by every selection field.
//!
//! [`SelectionController`] carries the results-panel protocol in its provided
//! methods. Implementors only supply the strategy: what typing does to an
//! existing selection, what activating an entry means, and which extra
//! affordances they own.

use crate::dom::{Document, ElementId};
use crate::event::SelectionEvent;
use crate::models::{FieldBinding, SelectionItem};
use crate::multi::MultiSelectionController;
use crate::panel::ResultsPanel;
use crate::single::SingleSelectionController;
use crate::widgets;

pub trait SelectionController {
    fn binding(&self) -> &FieldBinding;
    fn panel(&self) -> &ResultsPanel;
    fn panel_mut(&mut self) -> &mut ResultsPanel;

    /// Called on every edit of the search text, before the threshold check.
    fn text_changed(&mut self, doc: &mut Document, events: &mut Vec<SelectionEvent>);

    /// Called when a result entry carrying `item` is activated.
    fn activate(
        &mut self,
        doc: &mut Document,
        item: SelectionItem,
        events: &mut Vec<SelectionEvent>,
    );

    /// Clicks inside the field that are not on a result entry.
    fn own_click(
        &mut self,
        doc: &mut Document,
        target: ElementId,
        events: &mut Vec<SelectionEvent>,
    ) -> bool;

    fn on_focus(&mut self, doc: &mut Document) {
        let search = self.binding().search;
        if self.panel().meets_threshold(doc.value(search)) {
            self.panel_mut().open(doc);
        }
    }

    fn on_input(&mut self, doc: &mut Document, text: &str, events: &mut Vec<SelectionEvent>) {
        let search = self.binding().search;
        doc.set_value(search, text);
        self.text_changed(doc, events);
        self.panel_mut().evaluate(doc, text);
    }

    /// Route a click that landed inside this field.
    fn on_click(
        &mut self,
        doc: &mut Document,
        target: ElementId,
        events: &mut Vec<SelectionEvent>,
    ) -> bool {
        if let Some(entry) = self.panel().entry_for(doc, target) {
            return match widgets::read_entry(doc, entry) {
                Some(item) => {
                    self.activate(doc, item, events);
                    true
                }
                None => false,
            };
        }
        self.own_click(doc, target, events)
    }

    /// Search input plus results panel: clicks here never dismiss the panel.
    fn region_contains(&self, doc: &Document, target: ElementId) -> bool {
        let binding = self.binding();
        doc.contains(binding.search, target) || doc.contains(binding.results, target)
    }

    /// Close the panel if `target` lies outside the search/results region.
    fn on_outside_activation(&mut self, doc: &mut Document, target: ElementId) {
        if self.panel().is_open() && !self.region_contains(doc, target) {
            self.panel_mut().close(doc);
        }
    }

    fn on_pointer_over(&mut self, doc: &mut Document, target: ElementId) {
        self.panel_mut().hover(doc, target);
    }

    fn on_pointer_out(&mut self, doc: &mut Document, target: ElementId) {
        self.panel_mut().unhover(doc, target);
    }

    /// Let go of transient UI state before the controller is dropped.
    fn release(&mut self, doc: &mut Document) {
        self.panel_mut().close(doc);
    }
}

/// A constructed controller of either kind.
pub enum FieldController {
    Single(SingleSelectionController),
    Multi(MultiSelectionController),
}

impl FieldController {
    pub fn as_dyn(&self) -> &dyn SelectionController {
        match self {
            Self::Single(c) => c,
            Self::Multi(c) => c,
        }
    }

    pub fn as_dyn_mut(&mut self) -> &mut dyn SelectionController {
        match self {
            Self::Single(c) => c,
            Self::Multi(c) => c,
        }
    }

    pub fn as_single(&self) -> Option<&SingleSelectionController> {
        match self {
            Self::Single(c) => Some(c),
            Self::Multi(_) => None,
        }
    }

    pub fn as_multi(&self) -> Option<&MultiSelectionController> {
        match self {
            Self::Multi(c) => Some(c),
            Self::Single(_) => None,
        }
    }

    pub fn binding(&self) -> &FieldBinding {
        self.as_dyn().binding()
    }

    pub fn is_open(&self) -> bool {
        self.as_dyn().panel().is_open()
    }

    /// Ids currently held, in submission order.
    pub fn selected_ids(&self) -> Vec<String> {
        match self {
            Self::Single(c) => c.committed().map(|i| vec![i.id.clone()]).unwrap_or_default(),
            Self::Multi(c) => c.selected().ids().map(str::to_string).collect(),
        }
    }
}

impl std::fmt::Debug for FieldController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match self {
            Self::Single(_) => "Single",
            Self::Multi(_) => "Multi",
        };
        f.debug_struct("FieldController")
            .field("kind", &kind)
            .field("key", &self.binding().key)
            .field("selected", &self.selected_ids())
            .finish()
    }
}
