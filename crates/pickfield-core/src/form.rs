use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::dom::{Document, ElementId, Tag};

/// What a form would submit: named inputs in document order, repeated names
/// grouped under one key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormData {
    fields: IndexMap<String, Vec<String>>,
}

impl FormData {
    pub fn collect(doc: &Document, form_root: ElementId) -> Self {
        let mut data = Self::default();
        for id in doc.descendants(form_root) {
            let Some(node) = doc.get(id) else { continue };
            if !matches!(node.tag, Tag::TextInput | Tag::HiddenInput) {
                continue;
            }
            if let Some(name) = node.attr("name").filter(|n| !n.is_empty()) {
                data.push(name, node.value.clone());
            }
        }
        data
    }

    pub fn push(&mut self, name: &str, value: String) {
        self.fields.entry(name.to_string()).or_default().push(value);
    }

    /// Every value submitted under `name`.
    pub fn get(&self, name: &str) -> &[String] {
        self.fields.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn first(&self, name: &str) -> Option<&str> {
        self.get(name).first().map(String::as_str)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
