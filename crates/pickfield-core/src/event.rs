use serde::Serialize;

use crate::dom::ElementId;
use crate::models::SelectionItem;

/// Discrete user interaction on an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    Focus { target: ElementId },
    /// The text of `target` changed to `value`.
    Input { target: ElementId, value: String },
    /// Pointer or keyboard activation.
    Click { target: ElementId },
    PointerOver { target: ElementId },
    PointerOut { target: ElementId },
}

/// Coarse-grained notification from the hosting environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvironmentEvent {
    /// The initial page is ready.
    PageReady,
    /// The subtree at `root` was swapped for new markup.
    ContentReplaced { root: ElementId },
    /// A container such as a dialog became visible.
    ContainerShown { container: ElementId },
    /// A container such as a dialog was hidden.
    ContainerHidden { container: ElementId },
}

/// What a controller changed, reported to whoever hosts the fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectionEvent {
    #[serde(skip)]
    pub field: ElementId,
    /// The field's `id` attr, or its element id.
    pub key: String,
    #[serde(flatten)]
    pub change: SelectionChange,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SelectionChange {
    /// A single-value field committed an item.
    Committed { item: SelectionItem },
    /// A single-value field lost its commitment.
    Cleared,
    /// A multi-value field gained an item.
    Added { item: SelectionItem },
    /// A multi-value field dropped an item.
    Removed { id: String },
}
