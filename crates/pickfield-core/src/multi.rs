use tracing::debug;

use crate::config::FieldConfig;
use crate::controller::SelectionController;
use crate::dom::{Document, ElementId, Tag};
use crate::event::{SelectionChange, SelectionEvent};
use crate::models::{FieldBinding, MultiBinding, SelectedSet, SelectionItem};
use crate::panel::ResultsPanel;
use crate::single::OnSelect;
use crate::widgets::{self, class};

/// One search field bound to an ordered, deduplicated set of items.
///
/// Chips and hidden carriers are derived from the set and regenerated in
/// full after every change, never patched.
pub struct MultiSelectionController {
    binding: MultiBinding,
    panel: ResultsPanel,
    selected: SelectedSet,
    empty_message: String,
    fallback_name: String,
    on_select: Option<OnSelect>,
}

impl MultiSelectionController {
    pub fn new(doc: &mut Document, binding: MultiBinding, config: &FieldConfig) -> Self {
        let panel = ResultsPanel::new(doc, binding.field.results, config);
        let mut controller = Self {
            binding,
            panel,
            selected: SelectedSet::new(),
            empty_message: config.empty_message.clone(),
            fallback_name: config.fallback_name.clone(),
            on_select: None,
        };
        controller.initialize(doc);
        controller
    }

    /// Hook run for every item that is newly added to the set.
    pub fn with_on_select(mut self, hook: OnSelect) -> Self {
        self.on_select = Some(hook);
        self
    }

    pub fn multi_binding(&self) -> &MultiBinding {
        &self.binding
    }

    pub fn selected(&self) -> &SelectedSet {
        &self.selected
    }

    /// Load server-rendered carriers into the set, then render.
    pub fn initialize(&mut self, doc: &mut Document) {
        for carrier in doc.descendants(self.binding.carriers) {
            let Some(node) = doc.get(carrier) else { continue };
            if node.tag != Tag::HiddenInput || node.value.is_empty() {
                continue;
            }
            let item = SelectionItem::new(
                node.value.as_str(),
                node.attr("data-name").unwrap_or(&self.fallback_name),
                node.attr("data-doc").unwrap_or_default(),
            );
            self.selected.insert(item);
        }
        debug!(
            field = %self.binding.field.key,
            count = self.selected.len(),
            "loaded initial selection"
        );
        self.render(doc);
        self.sync_hidden_fields(doc);
    }

    /// Insert `item` unless its id is already selected. Returns whether it was added.
    pub fn on_result_activate(
        &mut self,
        doc: &mut Document,
        item: SelectionItem,
        events: &mut Vec<SelectionEvent>,
    ) -> bool {
        let inserted = self.selected.insert(item.clone());
        if inserted {
            debug!(field = %self.binding.field.key, id = %item.id, "added");
            self.render(doc);
            self.sync_hidden_fields(doc);
            if let Some(hook) = self.on_select.as_mut() {
                hook(&item);
            }
            events.push(self.event(SelectionChange::Added { item }));
        }
        doc.set_value(self.binding.field.search, "");
        self.panel.close(doc);
        inserted
    }

    /// Drop `id` if present. Returns whether anything was removed.
    pub fn on_remove(
        &mut self,
        doc: &mut Document,
        id: &str,
        events: &mut Vec<SelectionEvent>,
    ) -> bool {
        if self.selected.remove(id).is_none() {
            return false;
        }
        debug!(field = %self.binding.field.key, id, "removed");
        self.render(doc);
        self.sync_hidden_fields(doc);
        events.push(self.event(SelectionChange::Removed { id: id.to_string() }));
        true
    }

    /// One chip per item in order, or the placeholder when nothing is selected.
    pub fn render(&self, doc: &mut Document) {
        let chips: Vec<_> = if self.selected.is_empty() {
            vec![widgets::empty_placeholder(&self.empty_message)]
        } else {
            self.selected.iter().map(widgets::chip).collect()
        };
        doc.replace_children(self.binding.chips, &chips);
    }

    /// Regenerate every carrier from the set.
    pub fn sync_hidden_fields(&self, doc: &mut Document) {
        let carriers: Vec<_> = self
            .selected
            .iter()
            .map(|item| widgets::carrier(&self.binding.field_name, item))
            .collect();
        doc.replace_children(self.binding.carriers, &carriers);
    }

    fn event(&self, change: SelectionChange) -> SelectionEvent {
        SelectionEvent {
            field: self.binding.field.root,
            key: self.binding.field.key.clone(),
            change,
        }
    }
}

impl std::fmt::Debug for MultiSelectionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MultiSelectionController")
            .field("binding", &self.binding)
            .field("panel", &self.panel)
            .field("selected", &self.selected)
            .field("on_select", &self.on_select.is_some())
            .finish()
    }
}

impl SelectionController for MultiSelectionController {
    fn binding(&self) -> &FieldBinding {
        &self.binding.field
    }

    fn panel(&self) -> &ResultsPanel {
        &self.panel
    }

    fn panel_mut(&mut self) -> &mut ResultsPanel {
        &mut self.panel
    }

    /// A new search never invalidates earlier picks.
    fn text_changed(&mut self, _doc: &mut Document, _events: &mut Vec<SelectionEvent>) {}

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
        let Some(remove) = doc
            .closest(target, class::REMOVE)
            .filter(|r| doc.contains(self.binding.chips, *r))
        else {
            return false;
        };
        match doc.data(remove, "item-id").map(str::to_string) {
            Some(id) => self.on_remove(doc, &id, events),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    use super::*;
    use crate::widgets::multi_field;

    fn setup(initial: &[SelectionItem]) -> (Document, MultiSelectionController) {
        let (mut doc, root) = Document::with_page(&multi_field("leaders", "lideres", initial));
        let binding = MultiBinding::resolve(&doc, root, "items").unwrap();
        let controller = MultiSelectionController::new(&mut doc, binding, &FieldConfig::default());
        (doc, controller)
    }

    fn ana() -> SelectionItem {
        SelectionItem::new("7", "Ana Silva", "123.456.789-00")
    }

    fn caio() -> SelectionItem {
        SelectionItem::new("9", "Caio", "987")
    }

    fn carrier_values(doc: &Document, c: &MultiSelectionController) -> Vec<String> {
        doc.children(c.multi_binding().carriers)
            .iter()
            .map(|id| doc.value(*id).to_string())
            .collect()
    }

    fn chip_count(doc: &Document, c: &MultiSelectionController) -> usize {
        doc.query_all(c.multi_binding().chips, class::CHIP).len()
    }

    #[test]
    fn test_starts_with_placeholder() {
        let (doc, c) = setup(&[]);
        let chips = c.multi_binding().chips;
        let placeholder = doc.query(chips, class::EMPTY).unwrap();
        assert_eq!(doc.text(placeholder), "Nothing selected");
        assert!(carrier_values(&doc, &c).is_empty());
    }

    #[test]
    fn test_double_activation_keeps_one_entry() {
        let (mut doc, mut c) = setup(&[]);
        let mut events = Vec::new();
        assert!(c.on_result_activate(&mut doc, ana(), &mut events));
        assert!(!c.on_result_activate(&mut doc, ana(), &mut events));

        assert_eq!(c.selected().len(), 1);
        assert_eq!(carrier_values(&doc, &c), vec!["7"]);
        assert_eq!(chip_count(&doc, &c), 1);
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn test_activation_clears_search_and_closes() {
        let (mut doc, mut c) = setup(&[]);
        let mut events = Vec::new();
        c.on_input(&mut doc, "an", &mut events);
        assert!(c.panel().is_open());
        c.on_result_activate(&mut doc, ana(), &mut events);
        assert_eq!(doc.value(c.binding().search), "");
        assert!(!c.panel().is_open());
    }

    #[test]
    fn test_on_select_hook_runs_once_per_new_item() {
        use std::cell::RefCell;
        use std::rc::Rc;

        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let (mut doc, c) = setup(&[]);
        let mut c = c.with_on_select(Box::new(move |item: &SelectionItem| {
            sink.borrow_mut().push(item.id.clone())
        }));
        let mut events = Vec::new();
        c.on_result_activate(&mut doc, ana(), &mut events);
        c.on_result_activate(&mut doc, ana(), &mut events);
        c.on_result_activate(&mut doc, caio(), &mut events);
        assert_eq!(*seen.borrow(), vec!["7".to_string(), "9".to_string()]);
    }

    #[test]
    fn test_typing_keeps_selection() {
        let (mut doc, mut c) = setup(&[ana()]);
        let mut events = Vec::new();
        c.on_input(&mut doc, "ca", &mut events);
        assert_eq!(c.selected().len(), 1);
        assert!(events.is_empty());
    }

    #[test]
    fn test_remove_leaves_survivor() {
        let (mut doc, mut c) = setup(&[ana(), caio()]);
        let mut events = Vec::new();
        assert!(c.on_remove(&mut doc, "7", &mut events));
        assert_eq!(carrier_values(&doc, &c), vec!["9"]);
        assert_eq!(chip_count(&doc, &c), 1);
        assert!(!c.on_remove(&mut doc, "7", &mut events));
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn test_remove_affordance_click() {
        let (mut doc, mut c) = setup(&[ana(), caio()]);
        let mut events = Vec::new();
        let chips = c.multi_binding().chips;
        let remove = doc.query_all(chips, class::REMOVE)[1];
        assert!(c.on_click(&mut doc, remove, &mut events));
        assert_eq!(c.selected().ids().collect::<Vec<_>>(), vec!["7"]);
    }

    #[test]
    fn test_initialize_reads_server_rendered_carriers() {
        let (mut doc, root) = Document::with_page(&multi_field("leaders", "lideres", &[]));
        let carriers = doc.query(root, class::CARRIERS).unwrap();
        doc.append(carriers, &crate::dom::Markup::hidden_input().value("5"));
        doc.append(carriers, &crate::dom::Markup::hidden_input().value("5"));
        doc.append(carriers, &crate::dom::Markup::hidden_input().value(""));
        let binding = MultiBinding::resolve(&doc, root, "items").unwrap();
        let c = MultiSelectionController::new(&mut doc, binding, &FieldConfig::default());

        assert_eq!(c.selected().len(), 1);
        assert_eq!(c.selected().get("5").unwrap().display_name, "Selected item");
        assert_eq!(carrier_values(&doc, &c), vec!["5"]);
        let carrier = doc.children(carriers)[0];
        assert_eq!(doc.attr(carrier, "name"), Some("lideres"));
    }

    #[test]
    fn test_initialize_reads_wrapped_carriers() {
        let (mut doc, root) = Document::with_page(&multi_field("leaders", "lideres", &[]));
        let carriers = doc.query(root, class::CARRIERS).unwrap();
        let wrapper = doc.append(carriers, &crate::dom::Markup::block()).unwrap();
        let nested = crate::dom::Markup::hidden_input().value("5").attr("data-name", "Caio");
        doc.append(wrapper, &nested);
        let binding = MultiBinding::resolve(&doc, root, "items").unwrap();
        let c = MultiSelectionController::new(&mut doc, binding, &FieldConfig::default());

        assert_eq!(c.selected().len(), 1);
        assert_eq!(c.selected().get("5").unwrap().display_name, "Caio");
        assert_eq!(carrier_values(&doc, &c), vec!["5"]);
    }

    #[derive(Debug, Clone)]
    enum Op {
        Add(u8),
        Remove(u8),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![(0u8..6).prop_map(Op::Add), (0u8..6).prop_map(Op::Remove)]
    }

    proptest! {
        #[test]
        fn prop_carriers_track_set(ops in proptest::collection::vec(op(), 0..40)) {
            let (mut doc, mut c) = setup(&[]);
            let mut events = Vec::new();
            let mut model: Vec<String> = Vec::new();

            for op in ops {
                match op {
                    Op::Add(n) => {
                        let id = n.to_string();
                        let item = SelectionItem::new(id.clone(), "same label", "");
                        c.on_result_activate(&mut doc, item, &mut events);
                        if !model.contains(&id) {
                            model.push(id);
                        }
                    }
                    Op::Remove(n) => {
                        let id = n.to_string();
                        c.on_remove(&mut doc, &id, &mut events);
                        model.retain(|m| *m != id);
                    }
                }

                let ids: Vec<String> = c.selected().ids().map(str::to_string).collect();
                prop_assert_eq!(&ids, &model);
                prop_assert_eq!(&carrier_values(&doc, &c), &model);
                prop_assert_eq!(chip_count(&doc, &c), model.len());
            }
        }
    }
}
