use serde::{Deserialize, Serialize};

/// A candidate returned by the search backend.
///
/// Immutable once created: a field replaces its item wholesale.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SelectionItem {
    pub id: String,
    pub display_name: String,

    /// Document or identifier shown next to the name.
    #[serde(default)]
    pub secondary_label: String,
}

impl SelectionItem {
    pub fn new(
        id: impl Into<String>,
        display_name: impl Into<String>,
        secondary_label: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            secondary_label: secondary_label.into(),
        }
    }

    /// `"{display_name}{separator}{secondary_label}"`.
    pub fn label(&self, separator: &str) -> String {
        format!("{}{separator}{}", self.display_name, self.secondary_label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_label() {
        let item = SelectionItem::new("3", "Bruno", "A1");
        assert_eq!(item.label(" - "), "Bruno - A1");
        let separator = crate::config::FieldConfig::default().label_separator;
        assert_eq!(item.label(&separator), "Bruno - A1");
    }

    #[test]
    fn test_item_json_shape() {
        let item: SelectionItem =
            serde_json::from_str(r#"{"id":"7","display_name":"Ana Silva"}"#).unwrap();
        assert_eq!(item.id, "7");
        assert_eq!(item.secondary_label, "");
    }
}
