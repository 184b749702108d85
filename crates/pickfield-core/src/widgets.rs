//! Markup conventions for selection fields.
//!
//! Controllers find their parts by class name; the builders here produce
//! markup that follows those conventions.

use crate::dom::{Document, ElementId, Markup};
use crate::models::SelectionItem;

/// Class names marking the parts of a field.
pub mod class {
    pub const SINGLE_FIELD: &str = "pick-single";
    pub const MULTI_FIELD: &str = "pick-multi";
    pub const SEARCH: &str = "pick-search";
    pub const VALUE: &str = "pick-value";
    pub const CARRIERS: &str = "pick-carriers";
    pub const RESULTS: &str = "pick-results";
    pub const ITEM: &str = "pick-item";
    pub const SELECTED: &str = "pick-selected";
    pub const SELECTED_TEXT: &str = "pick-selected-text";
    pub const CLEAR: &str = "pick-clear";
    pub const CHIPS: &str = "pick-chips";
    pub const CHIP: &str = "pick-chip";
    pub const REMOVE: &str = "pick-remove";
    pub const EMPTY: &str = "pick-empty";
}

/// Attribute on a multi-value root naming its carriers.
pub const FIELD_NAME_ATTR: &str = "data-field-name";

/// Single-value field with display region and clear affordance.
pub fn single_field(dom_id: &str, name: &str) -> Markup {
    single_field_bare(dom_id, name)
        .child(
            Markup::block()
                .class(class::SELECTED)
                .id(format!("{dom_id}-selected"))
                .hidden()
                .child(Markup::text("").class(class::SELECTED_TEXT)),
        )
        .child(
            Markup::button("×")
                .class(class::CLEAR)
                .id(format!("{dom_id}-clear")),
        )
}

/// Single-value field with only the required parts.
pub fn single_field_bare(dom_id: &str, name: &str) -> Markup {
    Markup::block()
        .class(class::SINGLE_FIELD)
        .id(dom_id)
        .child(
            Markup::text_input()
                .class(class::SEARCH)
                .id(format!("{dom_id}-search")),
        )
        .child(
            Markup::hidden_input()
                .class(class::VALUE)
                .id(format!("{dom_id}-value"))
                .attr("name", name),
        )
        .child(
            Markup::block()
                .class(class::RESULTS)
                .id(format!("{dom_id}-results"))
                .hidden(),
        )
}

/// Multi-value field, optionally pre-populated with server-rendered carriers.
pub fn multi_field(dom_id: &str, field_name: &str, initial: &[SelectionItem]) -> Markup {
    Markup::block()
        .class(class::MULTI_FIELD)
        .id(dom_id)
        .attr(FIELD_NAME_ATTR, field_name)
        .child(
            Markup::text_input()
                .class(class::SEARCH)
                .id(format!("{dom_id}-search")),
        )
        .child(
            Markup::block()
                .class(class::RESULTS)
                .id(format!("{dom_id}-results"))
                .hidden(),
        )
        .child(
            Markup::block()
                .class(class::CHIPS)
                .id(format!("{dom_id}-chips")),
        )
        .child(
            Markup::block()
                .class(class::CARRIERS)
                .id(format!("{dom_id}-carriers"))
                .children(initial.iter().map(|item| carrier(field_name, item))),
        )
}

/// One entry of the results panel, as the search transport renders it.
pub fn result_entry(item: &SelectionItem) -> Markup {
    Markup::block()
        .class(class::ITEM)
        .data("item-id", &item.id)
        .data("item-name", &item.display_name)
        .data("item-doc", &item.secondary_label)
        .child(Markup::text(&item.display_name))
        .child(Markup::text(&item.secondary_label))
}

/// Removable chip for one selected item.
pub fn chip(item: &SelectionItem) -> Markup {
    Markup::block()
        .class(class::CHIP)
        .child(Markup::text(&item.display_name))
        .child(
            Markup::button("×")
                .class(class::REMOVE)
                .data("item-id", &item.id),
        )
}

/// Hidden carrier holding one selected id for submission.
pub fn carrier(name: &str, item: &SelectionItem) -> Markup {
    Markup::hidden_input()
        .attr("name", name)
        .value(&item.id)
        .data("name", &item.display_name)
        .data("doc", &item.secondary_label)
}

pub fn empty_placeholder(message: &str) -> Markup {
    Markup::text(message).class(class::EMPTY)
}

/// Read the item attached to a result entry. Entries without an id are inert.
pub fn read_entry(doc: &Document, entry: ElementId) -> Option<SelectionItem> {
    let id = doc.data(entry, "item-id").filter(|id| !id.is_empty())?;
    Some(SelectionItem::new(
        id,
        doc.data(entry, "item-name").unwrap_or_default(),
        doc.data(entry, "item-doc").unwrap_or_default(),
    ))
}
