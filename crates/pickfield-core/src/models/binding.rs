use crate::dom::{Document, ElementId, Tag};
use crate::widgets::{class, FIELD_NAME_ATTR};

/// Handles every field has: its root, search input and results panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldBinding {
    pub root: ElementId,
    pub search: ElementId,
    pub results: ElementId,
    /// Human-readable handle for events: the root's `id` attr, or its element id.
    pub key: String,
}

impl FieldBinding {
    /// Resolve the required handles under `root`, or `None` if any is missing.
    pub fn resolve(doc: &Document, root: ElementId) -> Option<Self> {
        let search = doc
            .query(root, class::SEARCH)
            .filter(|id| doc.get(*id).is_some_and(|n| n.tag == Tag::TextInput))?;
        let results = doc.query(root, class::RESULTS)?;
        let key = doc
            .attr(root, "id")
            .map(str::to_string)
            .unwrap_or_else(|| root.to_string());
        Some(Self {
            root,
            search,
            results,
            key,
        })
    }
}

/// Handles of a single-value field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SingleBinding {
    pub field: FieldBinding,
    pub hidden: ElementId,
    pub display: Option<ElementId>,
    pub display_text: Option<ElementId>,
    pub clear: Option<ElementId>,
}

impl SingleBinding {
    pub fn resolve(doc: &Document, root: ElementId) -> Option<Self> {
        let field = FieldBinding::resolve(doc, root)?;
        let hidden = doc.query(root, class::VALUE)?;
        let display = doc.query(root, class::SELECTED);
        // The text may live in a dedicated child or in the region itself.
        let display_text = display.map(|d| doc.query(d, class::SELECTED_TEXT).unwrap_or(d));
        let clear = doc.query(root, class::CLEAR);
        Some(Self {
            field,
            hidden,
            display,
            display_text,
            clear,
        })
    }
}

/// Handles of a multi-value field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultiBinding {
    pub field: FieldBinding,
    /// Container of the hidden carriers, one per selected item.
    pub carriers: ElementId,
    pub chips: ElementId,
    pub field_name: String,
}

impl MultiBinding {
    pub fn resolve(doc: &Document, root: ElementId, default_field_name: &str) -> Option<Self> {
        let field = FieldBinding::resolve(doc, root)?;
        let carriers = doc.query(root, class::CARRIERS)?;
        let chips = doc.query(root, class::CHIPS)?;
        let field_name = doc
            .attr(root, FIELD_NAME_ATTR)
            .filter(|name| !name.is_empty())
            .unwrap_or(default_field_name)
            .to_string();
        Some(Self {
            field,
            carriers,
            chips,
            field_name,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Markup;
    use crate::widgets::{multi_field, single_field, single_field_bare};

    #[test]
    fn test_single_binding_with_optional_parts() {
        let (doc, root) = Document::with_page(&single_field("owner", "pessoa"));
        let binding = SingleBinding::resolve(&doc, root).unwrap();
        assert_eq!(binding.field.key, "owner");
        assert!(binding.display.is_some());
        assert!(binding.clear.is_some());
        assert_ne!(binding.display, binding.display_text);
    }

    #[test]
    fn test_single_binding_without_optional_parts() {
        let (doc, root) = Document::with_page(&single_field_bare("owner", "pessoa"));
        let binding = SingleBinding::resolve(&doc, root).unwrap();
        assert!(binding.display.is_none());
        assert!(binding.display_text.is_none());
        assert!(binding.clear.is_none());
    }

    #[test]
    fn test_missing_results_panel_skips_binding() {
        let markup = Markup::block()
            .class(class::SINGLE_FIELD)
            .child(Markup::text_input().class(class::SEARCH))
            .child(Markup::hidden_input().class(class::VALUE));
        let (doc, root) = Document::with_page(&markup);
        assert!(SingleBinding::resolve(&doc, root).is_none());
    }

    #[test]
    fn test_multi_binding_field_name_fallback() {
        let (mut doc, root) = Document::with_page(&multi_field("leaders", "", &[]));
        let binding = MultiBinding::resolve(&doc, root, "items").unwrap();
        assert_eq!(binding.field_name, "items");

        doc.set_attr(root, FIELD_NAME_ATTR, "lideres");
        let binding = MultiBinding::resolve(&doc, root, "items").unwrap();
        assert_eq!(binding.field_name, "lideres");
    }
}
