//! Controller lifetimes across page load, content swaps and dialogs.
//!
//! The manager keeps a registry keyed by element identity. An element with a
//! registry entry is initialized; attaching again skips it. Elements destroyed
//! by a content swap take their identity with them, so their replacements
//! attach fresh and the stale entries are pruned. Hiding a container releases
//! and forgets every controller inside it.

use indexmap::IndexMap;
use tracing::debug;

use crate::config::FieldConfig;
use crate::controller::{FieldController, SelectionController};
use crate::dom::{Document, ElementId};
use crate::event::{EnvironmentEvent, SelectionEvent, UiEvent};
use crate::models::{MultiBinding, SingleBinding};
use crate::multi::MultiSelectionController;
use crate::single::SingleSelectionController;
use crate::widgets::class;

#[derive(Debug)]
pub struct LifecycleManager {
    config: FieldConfig,
    registry: IndexMap<ElementId, FieldController>,
    events: Vec<SelectionEvent>,
}

impl LifecycleManager {
    pub fn new(config: FieldConfig) -> Self {
        Self {
            config,
            registry: IndexMap::new(),
            events: Vec::new(),
        }
    }

    // ─── Attachment ────────────────────────────────────────

    /// Construct a controller for every eligible, uninitialized field under
    /// `root`. Returns how many were attached.
    pub fn attach(&mut self, doc: &mut Document, root: ElementId) -> usize {
        self.prune(doc);
        let mut attached = 0;
        for element in doc.descendants(root) {
            if self.registry.contains_key(&element) {
                continue;
            }
            let controller = if doc.has_class(element, class::SINGLE_FIELD) {
                SingleBinding::resolve(doc, element).map(|binding| {
                    let single = SingleSelectionController::new(doc, binding, &self.config);
                    FieldController::Single(single)
                })
            } else if doc.has_class(element, class::MULTI_FIELD) {
                MultiBinding::resolve(doc, element, &self.config.default_field_name).map(|binding| {
                    let multi = MultiSelectionController::new(doc, binding, &self.config);
                    FieldController::Multi(multi)
                })
            } else {
                continue;
            };

            match controller {
                Some(controller) => {
                    debug!(field = %controller.binding().key, "attached");
                    self.registry.insert(element, controller);
                    attached += 1;
                }
                None => debug!(element = %element, "skipped field with missing parts"),
            }
        }
        attached
    }

    pub fn on_page_ready(&mut self, doc: &mut Document) -> usize {
        let root = doc.root();
        self.attach(doc, root)
    }

    pub fn on_content_replaced(&mut self, doc: &mut Document, subtree: ElementId) -> usize {
        self.attach(doc, subtree)
    }

    pub fn on_container_shown(&mut self, doc: &mut Document, container: ElementId) -> usize {
        self.attach(doc, container)
    }

    /// Release and forget every controller under `container`.
    pub fn on_container_hidden(&mut self, doc: &mut Document, container: ElementId) -> usize {
        let inside: Vec<ElementId> = self
            .registry
            .keys()
            .copied()
            .filter(|root| doc.contains(container, *root))
            .collect();
        for root in &inside {
            if let Some(mut controller) = self.registry.shift_remove(root) {
                controller.as_dyn_mut().release(doc);
                debug!(field = %controller.binding().key, "released");
            }
        }
        inside.len()
    }

    pub fn handle(&mut self, doc: &mut Document, event: EnvironmentEvent) -> usize {
        match event {
            EnvironmentEvent::PageReady => self.on_page_ready(doc),
            EnvironmentEvent::ContentReplaced { root } => self.on_content_replaced(doc, root),
            EnvironmentEvent::ContainerShown { container } => {
                self.on_container_shown(doc, container)
            }
            EnvironmentEvent::ContainerHidden { container } => {
                self.on_container_hidden(doc, container)
            }
        }
    }

    fn prune(&mut self, doc: &Document) {
        let before = self.registry.len();
        self.registry.retain(|root, _| doc.is_alive(*root));
        let pruned = before - self.registry.len();
        if pruned > 0 {
            debug!(pruned, "dropped controllers of destroyed fields");
        }
    }

    // ─── Event routing ─────────────────────────────────────

    /// Deliver a user interaction. Returns whether a controller acted on it.
    pub fn dispatch(&mut self, doc: &mut Document, event: UiEvent) -> bool {
        match event {
            UiEvent::Focus { target } => match self.owner_of_search(target) {
                Some(root) => {
                    if let Some(c) = self.registry.get_mut(&root) {
                        c.as_dyn_mut().on_focus(doc);
                    }
                    true
                }
                None => false,
            },
            UiEvent::Input { target, value } => match self.owner_of_search(target) {
                Some(root) => {
                    if let Some(c) = self.registry.get_mut(&root) {
                        c.as_dyn_mut().on_input(doc, &value, &mut self.events);
                    }
                    true
                }
                None => {
                    doc.set_value(target, value);
                    false
                }
            },
            UiEvent::Click { target } => {
                if !doc.is_alive(target) {
                    return false;
                }
                for controller in self.registry.values_mut() {
                    controller.as_dyn_mut().on_outside_activation(doc, target);
                }
                match self.owner_of(doc, target) {
                    Some(root) => match self.registry.get_mut(&root) {
                        Some(c) => c.as_dyn_mut().on_click(doc, target, &mut self.events),
                        None => false,
                    },
                    None => false,
                }
            }
            UiEvent::PointerOver { target } => self.with_panel_owner(doc, target, |c, doc| {
                c.on_pointer_over(doc, target);
            }),
            UiEvent::PointerOut { target } => self.with_panel_owner(doc, target, |c, doc| {
                c.on_pointer_out(doc, target);
            }),
        }
    }

    fn owner_of_search(&self, target: ElementId) -> Option<ElementId> {
        self.registry
            .iter()
            .find(|(_, c)| c.binding().search == target)
            .map(|(root, _)| *root)
    }

    /// The innermost registered field containing `target`.
    fn owner_of(&self, doc: &Document, target: ElementId) -> Option<ElementId> {
        let mut current = Some(target);
        while let Some(id) = current {
            if self.registry.contains_key(&id) {
                return Some(id);
            }
            current = doc.parent(id);
        }
        None
    }

    fn with_panel_owner(
        &mut self,
        doc: &mut Document,
        target: ElementId,
        f: impl FnOnce(&mut dyn SelectionController, &mut Document),
    ) -> bool {
        let owner = self
            .registry
            .values_mut()
            .find(|c| doc.contains(c.binding().results, target));
        match owner {
            Some(c) => {
                f(c.as_dyn_mut(), doc);
                true
            }
            None => false,
        }
    }

    // ─── Queries ───────────────────────────────────────────

    pub fn controller(&self, root: ElementId) -> Option<&FieldController> {
        self.registry.get(&root)
    }

    /// Registered controllers in attachment order.
    pub fn controllers(&self) -> impl Iterator<Item = (ElementId, &FieldController)> {
        self.registry.iter().map(|(root, c)| (*root, c))
    }

    /// The field root owning `element`, if that field is initialized.
    pub fn field_of(&self, doc: &Document, element: ElementId) -> Option<ElementId> {
        self.owner_of(doc, element)
    }

    pub fn is_initialized(&self, root: ElementId) -> bool {
        self.registry.contains_key(&root)
    }

    pub fn len(&self) -> usize {
        self.registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    pub fn config(&self) -> &FieldConfig {
        &self.config
    }

    /// Take every selection change reported since the last drain.
    pub fn drain_events(&mut self) -> Vec<SelectionEvent> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::dom::Markup;
    use crate::event::SelectionChange;
    use crate::models::SelectionItem;
    use crate::search::deliver_results;
    use crate::widgets::{multi_field, single_field};

    fn ana() -> SelectionItem {
        SelectionItem::new("7", "Ana Silva", "123.456.789-00")
    }

    fn caio() -> SelectionItem {
        SelectionItem::new("9", "Caio", "987")
    }

    fn dialog_markup(initial: &[SelectionItem]) -> Markup {
        Markup::block()
            .id("dialog")
            .child(multi_field("leaders", "lideres", initial))
    }

    fn page() -> Markup {
        Markup::block()
            .id("page")
            .child(single_field("owner", "pessoa"))
            .child(dialog_markup(&[]))
    }

    fn ready() -> (Document, LifecycleManager) {
        let (mut doc, _) = Document::with_page(&page());
        let mut manager = LifecycleManager::new(FieldConfig::default());
        assert_eq!(manager.on_page_ready(&mut doc), 2);
        (doc, manager)
    }

    fn id(doc: &Document, dom_id: &str) -> ElementId {
        doc.find_by_dom_id(dom_id).unwrap()
    }

    /// Type into a field's search, deliver `items` and click the entry for `pick`.
    fn pick(
        doc: &mut Document,
        manager: &mut LifecycleManager,
        field: &str,
        items: &[SelectionItem],
        pick: &str,
    ) {
        let search = id(doc, &format!("{field}-search"));
        let results = id(doc, &format!("{field}-results"));
        manager.dispatch(doc, UiEvent::Focus { target: search });
        manager.dispatch(doc, UiEvent::Input { target: search, value: "an".into() });
        let entries = deliver_results(doc, results, items);
        let index = items.iter().position(|i| i.id == pick).unwrap();
        manager.dispatch(doc, UiEvent::Click { target: entries[index] });
    }

    fn carrier_values(doc: &Document, field: &str) -> Vec<String> {
        let carriers = id(doc, &format!("{field}-carriers"));
        doc.children(carriers)
            .iter()
            .map(|c| doc.value(*c).to_string())
            .collect()
    }

    #[test]
    fn test_attach_twice_is_idempotent() {
        let (mut doc, mut manager) = ready();
        let root = doc.root();
        assert_eq!(manager.attach(&mut doc, root), 0);
        assert_eq!(manager.len(), 2);

        pick(&mut doc, &mut manager, "leaders", &[ana()], "7");
        let added = manager
            .drain_events()
            .into_iter()
            .filter(|e| matches!(e.change, SelectionChange::Added { .. }))
            .count();
        assert_eq!(added, 1);
    }

    #[test]
    fn test_scenario_a_double_activation() {
        let (mut doc, mut manager) = ready();
        pick(&mut doc, &mut manager, "leaders", &[ana()], "7");
        pick(&mut doc, &mut manager, "leaders", &[ana()], "7");

        let leaders = manager.controller(id(&doc, "leaders")).unwrap();
        assert_eq!(leaders.selected_ids(), vec!["7"]);
        assert_eq!(carrier_values(&doc, "leaders"), vec!["7"]);
    }

    #[test]
    fn test_scenario_b_single_commit_then_type() {
        let (mut doc, mut manager) = ready();
        let bruno = SelectionItem::new("3", "Bruno", "A1");
        pick(&mut doc, &mut manager, "owner", &[bruno], "3");

        let search = id(&doc, "owner-search");
        let hidden = id(&doc, "owner-value");
        let display = id(&doc, "owner-selected");
        assert_eq!(doc.value(search), "Bruno - A1");
        assert_eq!(doc.value(hidden), "3");

        let typed = format!("{}x", doc.value(search));
        manager.dispatch(&mut doc, UiEvent::Input { target: search, value: typed });
        assert_eq!(doc.value(hidden), "");
        assert!(!doc.is_visible(display));
    }

    #[test]
    fn test_scenario_c_remove_first_of_two() {
        let (mut doc, mut manager) = ready();
        pick(&mut doc, &mut manager, "leaders", &[ana(), caio()], "7");
        pick(&mut doc, &mut manager, "leaders", &[ana(), caio()], "9");

        let chips = id(&doc, "leaders-chips");
        let remove = doc.query_all(chips, class::REMOVE)[0];
        assert!(manager.dispatch(&mut doc, UiEvent::Click { target: remove }));

        assert_eq!(carrier_values(&doc, "leaders"), vec!["9"]);
        assert_eq!(doc.query_all(chips, class::CHIP).len(), 1);
    }

    #[test]
    fn test_scenario_d_dialog_hidden_then_shown_fresh() {
        let (mut doc, mut manager) = ready();
        pick(&mut doc, &mut manager, "leaders", &[ana()], "7");
        let dialog = id(&doc, "dialog");
        let old_field = id(&doc, "leaders");

        assert_eq!(manager.on_container_hidden(&mut doc, dialog), 1);
        assert!(!manager.is_initialized(old_field));

        let fresh = doc.replace(dialog, &dialog_markup(&[])).unwrap();
        manager.handle(&mut doc, EnvironmentEvent::ContentReplaced { root: fresh });
        let shown = EnvironmentEvent::ContainerShown { container: fresh };
        assert_eq!(manager.handle(&mut doc, shown), 0);

        let new_field = id(&doc, "leaders");
        assert_ne!(new_field, old_field);
        let fields_in_dialog = manager
            .controllers()
            .filter(|(root, _)| doc.contains(fresh, *root))
            .count();
        assert_eq!(fields_in_dialog, 1);
        assert!(manager.controller(new_field).unwrap().selected_ids().is_empty());
        assert_eq!(manager.len(), 2);
    }

    #[test]
    fn test_repeated_dialog_cycles_do_not_accumulate() {
        let (mut doc, mut manager) = ready();
        for _ in 0..5 {
            let dialog = id(&doc, "dialog");
            manager.on_container_hidden(&mut doc, dialog);
            let fresh = doc.replace(dialog, &dialog_markup(&[caio()])).unwrap();
            manager.on_container_shown(&mut doc, fresh);
        }
        assert_eq!(manager.len(), 2);
        let leaders = manager.controller(id(&doc, "leaders")).unwrap();
        assert_eq!(leaders.selected_ids(), vec!["9"]);
    }

    #[test]
    fn test_swap_prunes_stale_and_keeps_persisting() {
        let (mut doc, mut manager) = ready();
        let owner = id(&doc, "owner");
        let dialog = id(&doc, "dialog");
        let leaders = id(&doc, "leaders");

        doc.replace_children(dialog, &[multi_field("leaders", "lideres", &[ana()])]);
        assert_eq!(manager.on_content_replaced(&mut doc, dialog), 1);
        assert!(manager.is_initialized(owner));
        assert!(!manager.is_initialized(leaders));
        assert_eq!(manager.len(), 2);
    }

    #[test]
    fn test_hidden_container_with_same_markup_reattaches_from_carriers() {
        let (mut doc, mut manager) = ready();
        pick(&mut doc, &mut manager, "leaders", &[ana(), caio()], "9");
        let dialog = id(&doc, "dialog");
        manager.on_container_hidden(&mut doc, dialog);
        assert_eq!(manager.on_container_shown(&mut doc, dialog), 1);
        let leaders = manager.controller(id(&doc, "leaders")).unwrap();
        assert_eq!(leaders.selected_ids(), vec!["9"]);
    }

    #[test]
    fn test_outside_click_closes_without_touching_commitment() {
        let (mut doc, mut manager) = ready();
        let bruno = SelectionItem::new("3", "Bruno", "A1");
        pick(&mut doc, &mut manager, "owner", &[bruno], "3");
        let search = id(&doc, "owner-search");
        manager.dispatch(&mut doc, UiEvent::Focus { target: search });
        let owner = manager.controller(id(&doc, "owner")).unwrap();
        assert!(owner.is_open());

        let page = id(&doc, "page");
        manager.dispatch(&mut doc, UiEvent::Click { target: page });
        let owner = manager.controller(id(&doc, "owner")).unwrap();
        assert!(!owner.is_open());
        assert_eq!(doc.value(id(&doc, "owner-value")), "3");
    }

    #[test]
    fn test_click_in_search_keeps_panel_open() {
        let (mut doc, mut manager) = ready();
        let search = id(&doc, "leaders-search");
        manager.dispatch(&mut doc, UiEvent::Input { target: search, value: "ca".into() });
        manager.dispatch(&mut doc, UiEvent::Click { target: search });
        assert!(manager.controller(id(&doc, "leaders")).unwrap().is_open());
    }

    #[test]
    fn test_threshold_through_dispatch() {
        let (mut doc, mut manager) = ready();
        let search = id(&doc, "leaders-search");
        let leaders = id(&doc, "leaders");
        manager.dispatch(&mut doc, UiEvent::Input { target: search, value: "c".into() });
        assert!(!manager.controller(leaders).unwrap().is_open());
        manager.dispatch(&mut doc, UiEvent::Input { target: search, value: "ca".into() });
        assert!(manager.controller(leaders).unwrap().is_open());
    }

    #[test]
    fn test_hover_routed_to_panel_owner() {
        let (mut doc, mut manager) = ready();
        let search = id(&doc, "leaders-search");
        let results = id(&doc, "leaders-results");
        manager.dispatch(&mut doc, UiEvent::Input { target: search, value: "an".into() });
        let entries = deliver_results(&mut doc, results, &[ana(), caio()]);
        assert!(manager.dispatch(&mut doc, UiEvent::PointerOver { target: entries[1] }));
        assert!(doc.has_class(entries[1], "is-highlighted"));
        assert!(manager.dispatch(&mut doc, UiEvent::PointerOut { target: entries[1] }));
        assert!(!doc.has_class(entries[1], "is-highlighted"));
    }

    #[test]
    fn test_field_missing_required_parts_is_skipped() {
        let broken = Markup::block()
            .class(class::MULTI_FIELD)
            .child(Markup::text_input().class(class::SEARCH));
        let (mut doc, _) = Document::with_page(&broken);
        let mut manager = LifecycleManager::new(FieldConfig::default());
        assert_eq!(manager.on_page_ready(&mut doc), 0);
        assert!(manager.is_empty());
    }

    #[test]
    fn test_input_on_plain_element_just_sets_value() {
        let (mut doc, _) = Document::with_page(&Markup::text_input().id("plain"));
        let mut manager = LifecycleManager::new(FieldConfig::default());
        manager.on_page_ready(&mut doc);
        let plain = id(&doc, "plain");
        let typed = UiEvent::Input { target: plain, value: "hello".into() };
        assert!(!manager.dispatch(&mut doc, typed));
        assert_eq!(doc.value(plain), "hello");
    }
}
