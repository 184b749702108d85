//! Headless replay of recorded interactions.
//!
//! A script is a page plus a list of steps that address elements by their
//! `id` attr. Running it drives the same lifecycle manager a front-end would
//! and reports what the form would submit afterwards.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::AppConfig;
use crate::dom::{Document, ElementId, Markup};
use crate::error::{PickfieldError, Result};
use crate::event::{EnvironmentEvent, SelectionEvent, UiEvent};
use crate::form::FormData;
use crate::lifecycle::LifecycleManager;
use crate::search::{Catalog, CatalogSearch, SearchTransport, deliver_results};
use crate::widgets::class;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayScript {
    pub page: Markup,
    /// Overrides the configured catalog.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog: Option<Catalog>,
    /// Assigned catalog entry that searches may still return.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow: Option<String>,
    /// Fail on the first unresolved step instead of skipping it.
    #[serde(default)]
    pub strict: bool,
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    Ready,
    Focus { target: String },
    Input { target: String, value: String },
    /// Search with the field's current text and show the results.
    Deliver { target: String },
    Click { target: String },
    ClickItem { field: String, id: String },
    Hover { field: String, id: String },
    Remove { field: String, id: String },
    Clear { field: String },
    Swap { target: String, markup: Markup },
    Show { target: String },
    Hide { target: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct ReplayReport {
    pub form: FormData,
    pub events: Vec<SelectionEvent>,
    pub controllers: usize,
    /// Indices of steps that referenced something missing.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<usize>,
}

impl ReplayScript {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn run(&self, config: &AppConfig) -> Result<ReplayReport> {
        let catalog = match &self.catalog {
            Some(catalog) => catalog.clone(),
            None => Catalog::from_config(&config.search)?,
        };
        let mut transport = CatalogSearch::new(catalog, &config.search, &config.field);
        if let Some(id) = &self.allow {
            transport = transport.allowing(id.as_str());
        }
        let (doc, _) = Document::with_page(&self.page);
        let mut session = Session {
            doc,
            manager: LifecycleManager::new(config.field.clone()),
            transport,
        };

        let mut skipped = Vec::new();
        for (index, step) in self.steps.iter().enumerate() {
            debug!(index, ?step, "replay step");
            if let Err(err) = session.apply(step) {
                if self.strict {
                    return Err(err);
                }
                warn!(index, error = %err, "replay step skipped");
                skipped.push(index);
            }
        }

        let root = session.doc.root();
        Ok(ReplayReport {
            form: FormData::collect(&session.doc, root),
            events: session.manager.drain_events(),
            controllers: session.manager.len(),
            skipped,
        })
    }
}

struct Session {
    doc: Document,
    manager: LifecycleManager,
    transport: CatalogSearch,
}

impl Session {
    fn apply(&mut self, step: &Step) -> Result<()> {
        match step {
            Step::Ready => {
                self.manager.handle(&mut self.doc, EnvironmentEvent::PageReady);
            }
            Step::Focus { target } => {
                let target = self.search_of(self.element(target)?);
                self.manager.dispatch(&mut self.doc, UiEvent::Focus { target });
            }
            Step::Input { target, value } => {
                let target = self.search_of(self.element(target)?);
                let value = value.clone();
                self.manager.dispatch(&mut self.doc, UiEvent::Input { target, value });
            }
            Step::Deliver { target } => {
                let root = self.field(target)?;
                let (search, results) = match self.manager.controller(root) {
                    Some(c) => (c.binding().search, c.binding().results),
                    None => return Err(PickfieldError::NotAField(target.clone())),
                };
                let items = self.transport.search(self.doc.value(search));
                deliver_results(&mut self.doc, results, &items);
            }
            Step::Click { target } => {
                let target = self.element(target)?;
                self.manager.dispatch(&mut self.doc, UiEvent::Click { target });
            }
            Step::ClickItem { field, id } => {
                let target = self.entry(field, id)?;
                self.manager.dispatch(&mut self.doc, UiEvent::Click { target });
            }
            Step::Hover { field, id } => {
                let target = self.entry(field, id)?;
                self.manager.dispatch(&mut self.doc, UiEvent::PointerOver { target });
            }
            Step::Remove { field, id } => {
                let root = self.field(field)?;
                let chips = self
                    .manager
                    .controller(root)
                    .and_then(|c| c.as_multi())
                    .map(|c| c.multi_binding().chips)
                    .ok_or_else(|| PickfieldError::NotAField(field.clone()))?;
                let target = self
                    .doc
                    .query_all(chips, class::REMOVE)
                    .into_iter()
                    .find(|r| self.doc.data(*r, "item-id") == Some(id.as_str()))
                    .ok_or_else(|| PickfieldError::ElementNotFound(format!("{field}: chip {id}")))?;
                self.manager.dispatch(&mut self.doc, UiEvent::Click { target });
            }
            Step::Clear { field } => {
                let root = self.field(field)?;
                let target = self
                    .manager
                    .controller(root)
                    .and_then(|c| c.as_single())
                    .and_then(|c| c.single_binding().clear)
                    .ok_or_else(|| PickfieldError::ElementNotFound(format!("{field}: clear")))?;
                self.manager.dispatch(&mut self.doc, UiEvent::Click { target });
            }
            Step::Swap { target, markup } => {
                let old = self.element(target)?;
                let root = self
                    .doc
                    .replace(old, markup)
                    .ok_or_else(|| PickfieldError::InvalidScript(format!("cannot swap {target}")))?;
                self.manager
                    .handle(&mut self.doc, EnvironmentEvent::ContentReplaced { root });
            }
            Step::Show { target } => {
                let container = self.element(target)?;
                self.doc.set_visible(container, true);
                self.manager
                    .handle(&mut self.doc, EnvironmentEvent::ContainerShown { container });
            }
            Step::Hide { target } => {
                let container = self.element(target)?;
                self.doc.set_visible(container, false);
                self.manager
                    .handle(&mut self.doc, EnvironmentEvent::ContainerHidden { container });
            }
        }
        Ok(())
    }

    fn element(&self, dom_id: &str) -> Result<ElementId> {
        self.doc
            .find_by_dom_id(dom_id)
            .ok_or_else(|| PickfieldError::ElementNotFound(dom_id.to_string()))
    }

    /// The initialized field root at or above `dom_id`.
    fn field(&self, dom_id: &str) -> Result<ElementId> {
        let element = self.element(dom_id)?;
        self.manager
            .field_of(&self.doc, element)
            .ok_or_else(|| PickfieldError::NotAField(dom_id.to_string()))
    }

    /// Field roots stand in for their search input.
    fn search_of(&self, target: ElementId) -> ElementId {
        self.manager
            .controller(target)
            .map(|c| c.binding().search)
            .unwrap_or(target)
    }

    fn entry(&self, field: &str, id: &str) -> Result<ElementId> {
        let root = self.field(field)?;
        let results = self
            .manager
            .controller(root)
            .map(|c| c.binding().results)
            .ok_or_else(|| PickfieldError::NotAField(field.to_string()))?;
        self.doc
            .query_all(results, class::ITEM)
            .into_iter()
            .find(|e| self.doc.data(*e, "item-id") == Some(id))
            .ok_or_else(|| PickfieldError::ElementNotFound(format!("{field}: result {id}")))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::event::SelectionChange;
    use crate::models::SelectionItem;
    use crate::widgets::{multi_field, single_field};

    fn page() -> Markup {
        Markup::block()
            .id("page")
            .child(Markup::text_input().attr("name", "title").value("Spring trip"))
            .child(single_field("owner", "pessoa"))
            .child(
                Markup::block()
                    .id("dialog")
                    .hidden()
                    .child(multi_field("leaders", "lideres", &[])),
            )
    }

    fn script(steps: Vec<Step>) -> ReplayScript {
        ReplayScript {
            page: page(),
            catalog: None,
            allow: None,
            strict: false,
            steps,
        }
    }

    fn input(target: &str, value: &str) -> Step {
        Step::Input {
            target: target.into(),
            value: value.into(),
        }
    }

    fn deliver(target: &str) -> Step {
        Step::Deliver { target: target.into() }
    }

    fn click_item(field: &str, id: &str) -> Step {
        Step::ClickItem {
            field: field.into(),
            id: id.into(),
        }
    }

    #[test]
    fn test_single_and_multi_selection() {
        let report = script(vec![
            Step::Ready,
            input("owner", "bru"),
            deliver("owner"),
            click_item("owner", "2"),
            Step::Show { target: "dialog".into() },
            input("leaders", "an"),
            deliver("leaders"),
            click_item("leaders", "1"),
            input("leaders", "an"),
            deliver("leaders"),
            click_item("leaders", "1"),
            input("leaders", "ju"),
            deliver("leaders"),
            click_item("leaders", "11"),
        ])
        .run(&AppConfig::default())
        .unwrap();

        assert!(report.skipped.is_empty());
        assert_eq!(report.controllers, 2);
        assert_eq!(report.form.get("pessoa"), &["2".to_string()]);
        assert_eq!(report.form.get("lideres"), &["1".to_string(), "11".to_string()]);
        assert_eq!(report.form.first("title"), Some("Spring trip"));
        assert_eq!(report.events.len(), 3);
        assert_eq!(
            report.events[0].change,
            SelectionChange::Committed {
                item: SelectionItem::new("2", "Bruno Costa", "234.567.890-11")
            }
        );
    }

    #[test]
    fn test_remove_and_clear() {
        let report = script(vec![
            Step::Ready,
            input("leaders-search", "an"),
            deliver("leaders"),
            click_item("leaders", "1"),
            input("leaders-search", "an"),
            deliver("leaders"),
            click_item("leaders", "7"),
            Step::Remove {
                field: "leaders".into(),
                id: "1".into(),
            },
            input("owner", "bru"),
            deliver("owner"),
            click_item("owner", "2"),
            Step::Clear { field: "owner".into() },
        ])
        .run(&AppConfig::default())
        .unwrap();

        assert_eq!(report.form.get("lideres"), &["7".to_string()]);
        assert_eq!(report.form.get("pessoa"), &["".to_string()]);
        let kinds: Vec<_> = report
            .events
            .iter()
            .map(|e| serde_json::to_value(e).unwrap()["kind"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(kinds, vec!["added", "added", "removed", "committed", "cleared"]);
    }

    #[test]
    fn test_hide_then_swap_in_fresh_dialog() {
        let fresh = Markup::block()
            .id("dialog")
            .child(multi_field("leaders", "lideres", &[]));
        let report = script(vec![
            Step::Ready,
            input("leaders", "an"),
            deliver("leaders"),
            click_item("leaders", "1"),
            Step::Hide { target: "dialog".into() },
            Step::Swap {
                target: "dialog".into(),
                markup: fresh,
            },
            Step::Show { target: "dialog".into() },
        ])
        .run(&AppConfig::default())
        .unwrap();

        assert_eq!(report.controllers, 2);
        assert!(report.form.get("lideres").is_empty());
    }

    #[test]
    fn test_unknown_elements_are_skipped_or_fatal() {
        let mut s = script(vec![
            Step::Ready,
            Step::Click { target: "nope".into() },
            click_item("owner", "2"),
            Step::Remove {
                field: "owner".into(),
                id: "2".into(),
            },
        ]);
        let report = s.run(&AppConfig::default()).unwrap();
        assert_eq!(report.skipped, vec![1, 2, 3]);

        s.strict = true;
        let err = s.run(&AppConfig::default()).unwrap_err();
        assert!(matches!(err, PickfieldError::ElementNotFound(ref id) if id == "nope"));
    }

    #[test]
    fn test_parses_json_script_with_inline_catalog() {
        let json = r#"{
            "page": {
                "children": [{
                    "classes": ["pick-single"],
                    "attrs": {"id": "owner"},
                    "children": [
                        {"tag": "text_input", "classes": ["pick-search"]},
                        {"tag": "hidden_input", "classes": ["pick-value"], "attrs": {"name": "pessoa"}},
                        {"classes": ["pick-results"], "hidden": true}
                    ]
                }]
            },
            "catalog": [
                {"id": "42", "display_name": "Rita", "secondary_label": "R1", "assigned": true}
            ],
            "allow": "42",
            "steps": [
                {"action": "ready"},
                {"action": "focus", "target": "owner"},
                {"action": "input", "target": "owner", "value": "rit"},
                {"action": "deliver", "target": "owner"},
                {"action": "hover", "field": "owner", "id": "42"},
                {"action": "click_item", "field": "owner", "id": "42"}
            ]
        }"#;
        let report = ReplayScript::from_json(json)
            .unwrap()
            .run(&AppConfig::default())
            .unwrap();
        assert_eq!(report.form.get("pessoa"), &["42".to_string()]);
        assert_eq!(
            serde_json::to_value(&report.events[0]).unwrap(),
            serde_json::json!({
                "key": "owner",
                "kind": "committed",
                "item": {"id": "42", "display_name": "Rita", "secondary_label": "R1"}
            })
        );
    }

    #[test]
    fn test_bundled_demo_script() {
        let script =
            ReplayScript::from_json(include_str!("../../../demos/new-caravan.json")).unwrap();
        let report = script.run(&AppConfig::default()).unwrap();
        assert!(report.skipped.is_empty());
        assert_eq!(report.form.first("titulo"), Some("Spring retreat"));
        assert_eq!(report.form.get("coordenador"), &["2".to_string()]);
        assert_eq!(report.form.get("lideres"), &["1".to_string()]);
        assert_eq!(report.events.len(), 3);
        assert_eq!(report.controllers, 1);
    }

    #[test]
    fn test_bad_json_is_an_error() {
        assert!(ReplayScript::from_json("{\"steps\": [{\"action\": \"fly\"}]}").is_err());
    }
}
