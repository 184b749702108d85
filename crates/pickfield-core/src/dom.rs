//! Headless UI tree.
//!
//! Elements live in a slab arena. Slots are recycled, but every element gets
//! a fresh generation on creation, so an [`ElementId`] of a destroyed element
//! never resolves to whatever later reuses its slot. Lookups and mutations on
//! dead ids are silent no-ops.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use slab::Slab;

/// Stable identity of one element in a [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId {
    index: usize,
    generation: u64,
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}v{}", self.index, self.generation)
    }
}

/// Element kinds the selection fields need.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tag {
    #[default]
    Block,
    TextInput,
    HiddenInput,
    Text,
    Button,
}

/// A live element.
#[derive(Debug, Clone)]
pub struct Node {
    pub tag: Tag,
    pub classes: Vec<String>,
    pub attrs: BTreeMap<String, String>,
    pub value: String,
    pub text: String,
    pub visible: bool,
    parent: Option<ElementId>,
    children: Vec<ElementId>,
}

impl Node {
    fn from_markup(markup: &Markup, parent: Option<ElementId>) -> Self {
        Self {
            tag: markup.tag,
            classes: markup.classes.clone(),
            attrs: markup.attrs.clone(),
            value: markup.value.clone(),
            text: markup.text.clone(),
            visible: !markup.hidden,
            parent,
            children: Vec::with_capacity(markup.children.len()),
        }
    }

    pub fn parent(&self) -> Option<ElementId> {
        self.parent
    }

    pub fn children(&self) -> &[ElementId] {
        &self.children
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs.get(key).map(String::as_str)
    }
}

/// Serializable description of a subtree, instantiated into a [`Document`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Markup {
    pub tag: Tag,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub classes: Vec<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub attrs: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub value: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub text: String,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub hidden: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Markup>,
}

impl Markup {
    pub fn new(tag: Tag) -> Self {
        Self {
            tag,
            ..Self::default()
        }
    }

    pub fn block() -> Self {
        Self::new(Tag::Block)
    }

    pub fn text_input() -> Self {
        Self::new(Tag::TextInput)
    }

    pub fn hidden_input() -> Self {
        Self::new(Tag::HiddenInput)
    }

    pub fn text(content: impl Into<String>) -> Self {
        Self::new(Tag::Text).with_text(content)
    }

    pub fn button(label: impl Into<String>) -> Self {
        Self::new(Tag::Button).with_text(label)
    }

    pub fn class(mut self, class: impl Into<String>) -> Self {
        self.classes.push(class.into());
        self
    }

    pub fn id(self, id: impl Into<String>) -> Self {
        self.attr("id", id)
    }

    pub fn attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(key.into(), value.into());
        self
    }

    /// Shorthand for a `data-{key}` attribute.
    pub fn data(self, key: &str, value: impl Into<String>) -> Self {
        self.attr(format!("data-{key}"), value)
    }

    pub fn value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    pub fn child(mut self, child: Markup) -> Self {
        self.children.push(child);
        self
    }

    pub fn children(mut self, children: impl IntoIterator<Item = Markup>) -> Self {
        self.children.extend(children);
        self
    }
}

struct Slot {
    generation: u64,
    node: Node,
}

/// The element tree every controller operates on.
pub struct Document {
    slots: Slab<Slot>,
    root: ElementId,
    next_generation: u64,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("root", &self.root)
            .field("len", &self.slots.len())
            .finish()
    }
}

impl Document {
    /// Create a document holding only an empty root block.
    pub fn new() -> Self {
        let mut doc = Self {
            slots: Slab::new(),
            root: ElementId {
                index: 0,
                generation: 0,
            },
            next_generation: 0,
        };
        doc.root = doc.instantiate(None, &Markup::block().id("root"));
        doc
    }

    /// Create a document whose root holds `page`.
    pub fn with_page(page: &Markup) -> (Self, ElementId) {
        let mut doc = Self::new();
        let root = doc.root();
        let page_id = doc.instantiate(Some(root), page);
        if let Some(node) = doc.get_mut(root) {
            node.children.push(page_id);
        }
        (doc, page_id)
    }

    pub fn root(&self) -> ElementId {
        self.root
    }

    /// Number of live elements, root included.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn get(&self, id: ElementId) -> Option<&Node> {
        self.slots
            .get(id.index)
            .filter(|slot| slot.generation == id.generation)
            .map(|slot| &slot.node)
    }

    pub fn get_mut(&mut self, id: ElementId) -> Option<&mut Node> {
        self.slots
            .get_mut(id.index)
            .filter(|slot| slot.generation == id.generation)
            .map(|slot| &mut slot.node)
    }

    pub fn is_alive(&self, id: ElementId) -> bool {
        self.get(id).is_some()
    }

    // ─── Structure ─────────────────────────────────────────

    fn alloc(&mut self, node: Node) -> ElementId {
        self.next_generation += 1;
        let generation = self.next_generation;
        let index = self.slots.insert(Slot { generation, node });
        ElementId { index, generation }
    }

    fn instantiate(&mut self, parent: Option<ElementId>, markup: &Markup) -> ElementId {
        let id = self.alloc(Node::from_markup(markup, parent));
        for child in &markup.children {
            let child_id = self.instantiate(Some(id), child);
            if let Some(node) = self.get_mut(id) {
                node.children.push(child_id);
            }
        }
        id
    }

    fn free_subtree(&mut self, id: ElementId) {
        for dead in self.descendants(id) {
            self.slots.try_remove(dead.index);
        }
    }

    /// Instantiate `markup` as the last child of `parent`.
    pub fn append(&mut self, parent: ElementId, markup: &Markup) -> Option<ElementId> {
        if !self.is_alive(parent) {
            return None;
        }
        let id = self.instantiate(Some(parent), markup);
        if let Some(node) = self.get_mut(parent) {
            node.children.push(id);
        }
        Some(id)
    }

    /// Destroy `id` and its whole subtree. The root cannot be removed.
    pub fn remove(&mut self, id: ElementId) -> bool {
        if id == self.root || !self.is_alive(id) {
            return false;
        }
        if let Some(parent) = self.parent(id)
            && let Some(node) = self.get_mut(parent)
        {
            node.children.retain(|c| *c != id);
        }
        self.free_subtree(id);
        true
    }

    /// Destroy every child of `id`.
    pub fn clear_children(&mut self, id: ElementId) {
        let children = match self.get_mut(id) {
            Some(node) => std::mem::take(&mut node.children),
            None => return,
        };
        for child in children {
            self.free_subtree(child);
        }
    }

    /// Swap the content of `id` for freshly instantiated `markups`.
    pub fn replace_children(&mut self, id: ElementId, markups: &[Markup]) -> Vec<ElementId> {
        if !self.is_alive(id) {
            return Vec::new();
        }
        self.clear_children(id);
        markups
            .iter()
            .filter_map(|m| self.append(id, m))
            .collect()
    }

    /// Swap `id` itself for `markup`, keeping its position among siblings.
    pub fn replace(&mut self, id: ElementId, markup: &Markup) -> Option<ElementId> {
        if id == self.root {
            return None;
        }
        let parent = self.parent(id)?;
        let position = self.children(parent).iter().position(|c| *c == id)?;
        self.free_subtree(id);
        let new_id = self.instantiate(Some(parent), markup);
        let node = self.get_mut(parent)?;
        node.children[position] = new_id;
        Some(new_id)
    }

    pub fn parent(&self, id: ElementId) -> Option<ElementId> {
        self.get(id).and_then(Node::parent)
    }

    pub fn children(&self, id: ElementId) -> &[ElementId] {
        self.get(id).map(Node::children).unwrap_or(&[])
    }

    /// `true` when `node` is `ancestor` or lies below it.
    pub fn contains(&self, ancestor: ElementId, node: ElementId) -> bool {
        if !self.is_alive(ancestor) {
            return false;
        }
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    /// Nearest element carrying `class`, starting at `node` itself.
    pub fn closest(&self, node: ElementId, class: &str) -> Option<ElementId> {
        let mut current = Some(node);
        while let Some(id) = current {
            let element = self.get(id)?;
            if element.has_class(class) {
                return Some(id);
            }
            current = element.parent;
        }
        None
    }

    /// Pre-order walk of the subtree, `root` first.
    pub fn descendants(&self, root: ElementId) -> Vec<ElementId> {
        let mut out = Vec::new();
        if !self.is_alive(root) {
            return out;
        }
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.children(id).iter().rev().copied());
        }
        out
    }

    pub fn query_all(&self, root: ElementId, class: &str) -> Vec<ElementId> {
        self.descendants(root)
            .into_iter()
            .filter(|id| self.has_class(*id, class))
            .collect()
    }

    pub fn query(&self, root: ElementId, class: &str) -> Option<ElementId> {
        self.query_all(root, class).into_iter().next()
    }

    /// Find the element whose `id` attribute equals `dom_id`.
    pub fn find_by_dom_id(&self, dom_id: &str) -> Option<ElementId> {
        self.descendants(self.root)
            .into_iter()
            .find(|id| self.attr(*id, "id") == Some(dom_id))
    }

    // ─── Content ───────────────────────────────────────────

    pub fn value(&self, id: ElementId) -> &str {
        self.get(id).map(|n| n.value.as_str()).unwrap_or("")
    }

    pub fn set_value(&mut self, id: ElementId, value: impl Into<String>) {
        if let Some(node) = self.get_mut(id) {
            node.value = value.into();
        }
    }

    pub fn text(&self, id: ElementId) -> &str {
        self.get(id).map(|n| n.text.as_str()).unwrap_or("")
    }

    pub fn set_text(&mut self, id: ElementId, text: impl Into<String>) {
        if let Some(node) = self.get_mut(id) {
            node.text = text.into();
        }
    }

    pub fn is_visible(&self, id: ElementId) -> bool {
        self.get(id).is_some_and(|n| n.visible)
    }

    /// Visible itself and through every ancestor.
    pub fn is_displayed(&self, id: ElementId) -> bool {
        let mut current = Some(id);
        while let Some(el) = current {
            match self.get(el) {
                Some(node) if node.visible => current = node.parent,
                _ => return false,
            }
        }
        true
    }

    pub fn set_visible(&mut self, id: ElementId, visible: bool) {
        if let Some(node) = self.get_mut(id) {
            node.visible = visible;
        }
    }

    pub fn has_class(&self, id: ElementId, class: &str) -> bool {
        self.get(id).is_some_and(|n| n.has_class(class))
    }

    pub fn add_class(&mut self, id: ElementId, class: &str) {
        if let Some(node) = self.get_mut(id)
            && !node.has_class(class)
        {
            node.classes.push(class.to_string());
        }
    }

    pub fn remove_class(&mut self, id: ElementId, class: &str) {
        if let Some(node) = self.get_mut(id) {
            node.classes.retain(|c| c != class);
        }
    }

    pub fn attr(&self, id: ElementId, key: &str) -> Option<&str> {
        self.get(id).and_then(|n| n.attr(key))
    }

    pub fn set_attr(&mut self, id: ElementId, key: &str, value: impl Into<String>) {
        if let Some(node) = self.get_mut(id) {
            node.attrs.insert(key.to_string(), value.into());
        }
    }

    /// Read a `data-{key}` attribute.
    pub fn data(&self, id: ElementId, key: &str) -> Option<&str> {
        self.attr(id, &format!("data-{key}"))
    }
}
