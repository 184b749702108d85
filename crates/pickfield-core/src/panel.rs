//! Results panel shared by both field kinds.
//!
//! Closed until the search text reaches the threshold; closed again when it
//! shrinks below it, on an outside activation, or after an item is chosen.
//! Hover highlighting is cosmetic and cleared whenever the panel closes.

use tracing::trace;

use crate::config::FieldConfig;
use crate::dom::{Document, ElementId};
use crate::widgets::class;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PanelState {
    #[default]
    Closed,
    Open,
}

#[derive(Debug, Clone)]
pub struct ResultsPanel {
    results: ElementId,
    state: PanelState,
    highlighted: Option<ElementId>,
    min_query_len: usize,
    highlight_class: String,
}

impl ResultsPanel {
    /// Take over `results`, starting Closed.
    pub fn new(doc: &mut Document, results: ElementId, config: &FieldConfig) -> Self {
        doc.set_visible(results, false);
        Self {
            results,
            state: PanelState::Closed,
            highlighted: None,
            min_query_len: config.min_query_len,
            highlight_class: config.highlight_class.clone(),
        }
    }

    pub fn results(&self) -> ElementId {
        self.results
    }

    pub fn state(&self) -> PanelState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state == PanelState::Open
    }

    /// Highlighted entry, if it is still part of the document.
    pub fn highlighted(&self, doc: &Document) -> Option<ElementId> {
        self.highlighted.filter(|id| doc.is_alive(*id))
    }

    pub fn meets_threshold(&self, text: &str) -> bool {
        text.chars().count() >= self.min_query_len
    }

    /// Open or close according to the current search text.
    pub fn evaluate(&mut self, doc: &mut Document, text: &str) -> PanelState {
        if self.meets_threshold(text) {
            self.open(doc);
        } else {
            self.close(doc);
        }
        self.state
    }

    pub fn open(&mut self, doc: &mut Document) {
        if self.state != PanelState::Open {
            trace!(results = %self.results, "results panel open");
        }
        doc.set_visible(self.results, true);
        self.state = PanelState::Open;
    }

    pub fn close(&mut self, doc: &mut Document) {
        if self.state != PanelState::Closed {
            trace!(results = %self.results, "results panel closed");
        }
        self.clear_highlight(doc);
        doc.set_visible(self.results, false);
        self.state = PanelState::Closed;
    }

    /// Entries currently rendered into the panel, in order.
    pub fn entries(&self, doc: &Document) -> Vec<ElementId> {
        doc.query_all(self.results, class::ITEM)
    }

    /// The result entry `target` belongs to, if any.
    pub fn entry_for(&self, doc: &Document, target: ElementId) -> Option<ElementId> {
        doc.closest(target, class::ITEM)
            .filter(|entry| doc.contains(self.results, *entry))
    }

    pub fn hover(&mut self, doc: &mut Document, target: ElementId) {
        if let Some(entry) = self.entry_for(doc, target) {
            self.clear_highlight(doc);
            doc.add_class(entry, &self.highlight_class);
            self.highlighted = Some(entry);
        }
    }

    pub fn unhover(&mut self, doc: &mut Document, target: ElementId) {
        if let Some(entry) = self.entry_for(doc, target) {
            doc.remove_class(entry, &self.highlight_class);
            if self.highlighted == Some(entry) {
                self.highlighted = None;
            }
        }
    }

    pub fn clear_highlight(&mut self, doc: &mut Document) {
        for entry in self.entries(doc) {
            doc.remove_class(entry, &self.highlight_class);
        }
        self.highlighted = None;
    }
}
