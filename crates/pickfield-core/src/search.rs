use std::path::Path;

use nucleo_matcher::pattern::{AtomKind, CaseMatching, Normalization, Pattern};
use nucleo_matcher::{Config, Matcher, Utf32Str};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{FieldConfig, MatchMode, SearchConfig};
use crate::dom::{Document, ElementId};
use crate::error::Result;
use crate::models::SelectionItem;
use crate::widgets;

/// Anything that can turn a query into candidate items.
pub trait SearchTransport {
    fn search(&self, query: &str) -> Vec<SelectionItem>;
}

/// One searchable record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    #[serde(flatten)]
    pub item: SelectionItem,
    #[serde(default)]
    pub email: String,
    /// Already linked elsewhere; hidden from searches unless explicitly allowed.
    #[serde(default)]
    pub assigned: bool,
}

impl CatalogEntry {
    pub fn new(item: SelectionItem, email: impl Into<String>) -> Self {
        Self {
            item,
            email: email.into(),
            assigned: false,
        }
    }

    pub fn assigned(mut self) -> Self {
        self.assigned = true;
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
}

impl Catalog {
    pub fn new(entries: Vec<CatalogEntry>) -> Self {
        Self { entries }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let catalog = Self::from_json(&content)?;
        debug!(path = %path.display(), entries = catalog.len(), "catalog loaded");
        Ok(catalog)
    }

    /// The configured catalog file, or the built-in demo people.
    pub fn from_config(config: &SearchConfig) -> Result<Self> {
        match &config.catalog_path {
            Some(path) => Self::load(Path::new(path)),
            None => Ok(Self::demo()),
        }
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn demo() -> Self {
        let people = [
            ("1", "Ana Silva", "123.456.789-00", "ana.silva@example.com", false),
            ("2", "Bruno Costa", "234.567.890-11", "bruno@example.com", false),
            ("3", "Carla Mendes", "345.678.901-22", "carla.m@example.com", false),
            ("4", "Caio Ribeiro", "456.789.012-33", "caio@example.com", false),
            ("5", "Daniela Rocha", "567.890.123-44", "dani.rocha@example.com", true),
            ("6", "Eduardo Lima", "678.901.234-55", "edu.lima@example.com", false),
            ("7", "Fernanda Alves", "789.012.345-66", "fer.alves@example.com", false),
            ("8", "Gabriel Souza", "890.123.456-77", "gabriel@example.com", false),
            ("9", "Helena Martins", "901.234.567-88", "helena@example.com", false),
            ("10", "Igor Santana", "012.345.678-99", "igor.s@example.com", true),
            ("11", "Juliana Prado", "111.222.333-44", "ju.prado@example.com", false),
            ("12", "Luana Ferraz", "222.333.444-55", "luana@example.com", false),
        ];
        Self::new(
            people
                .into_iter()
                .map(|(id, name, doc, email, assigned)| CatalogEntry {
                    item: SelectionItem::new(id, name, doc),
                    email: email.to_string(),
                    assigned,
                })
                .collect(),
        )
    }
}

/// Reference transport over an in-memory [`Catalog`].
#[derive(Debug, Clone)]
pub struct CatalogSearch {
    catalog: Catalog,
    mode: MatchMode,
    min_query_len: usize,
    max_results: usize,
    allowed_id: Option<String>,
}

impl CatalogSearch {
    pub fn new(catalog: Catalog, search: &SearchConfig, field: &FieldConfig) -> Self {
        Self {
            catalog,
            mode: search.match_mode,
            min_query_len: field.min_query_len,
            max_results: search.max_results,
            allowed_id: None,
        }
    }

    pub fn with_mode(mut self, mode: MatchMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    /// Let one assigned entry through, e.g. the current owner of a record
    /// being edited.
    pub fn allowing(mut self, id: impl Into<String>) -> Self {
        self.allowed_id = Some(id.into());
        self
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    fn available(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.catalog
            .entries()
            .iter()
            .filter(|e| !e.assigned || self.allowed_id.as_deref() == Some(e.item.id.as_str()))
    }

    fn contains_matches(&self, query: &str) -> Vec<SelectionItem> {
        let needle = query.to_lowercase();
        let mut hits: Vec<&CatalogEntry> = self
            .available()
            .filter(|e| {
                e.item.display_name.to_lowercase().contains(&needle)
                    || e.item.secondary_label.to_lowercase().contains(&needle)
                    || e.email.to_lowercase().contains(&needle)
            })
            .collect();
        hits.sort_by(|a, b| {
            a.item
                .display_name
                .to_lowercase()
                .cmp(&b.item.display_name.to_lowercase())
                .then_with(|| a.item.id.cmp(&b.item.id))
        });
        hits.into_iter().map(|e| e.item.clone()).collect()
    }

    fn fuzzy_matches(&self, query: &str) -> Vec<SelectionItem> {
        let mut matcher = Matcher::new(Config::DEFAULT);
        let pattern =
            Pattern::new(query, CaseMatching::Ignore, Normalization::Smart, AtomKind::Fuzzy);
        let mut buf = Vec::new();
        let mut scored: Vec<(u32, &CatalogEntry)> = Vec::new();

        for entry in self.available() {
            let searchable = format!(
                "{} {} {}",
                entry.item.display_name, entry.item.secondary_label, entry.email
            );
            let haystack = Utf32Str::new(&searchable, &mut buf);
            if let Some(score) = pattern.score(haystack, &mut matcher) {
                scored.push((score, entry));
            }
        }

        scored.sort_by(|a, b| {
            b.0.cmp(&a.0)
                .then_with(|| a.1.item.display_name.cmp(&b.1.item.display_name))
        });
        scored.into_iter().map(|(_, e)| e.item.clone()).collect()
    }
}

impl SearchTransport for CatalogSearch {
    fn search(&self, query: &str) -> Vec<SelectionItem> {
        let query = query.trim();
        if query.chars().count() < self.min_query_len {
            return Vec::new();
        }
        let mut results = match self.mode {
            MatchMode::Contains => self.contains_matches(query),
            MatchMode::Fuzzy => self.fuzzy_matches(query),
        };
        results.truncate(self.max_results);
        debug!(query, mode = ?self.mode, hits = results.len(), "catalog search");
        results
    }
}

/// Render `items` into a results panel, replacing whatever it showed before.
pub fn deliver_results(
    doc: &mut Document,
    results: ElementId,
    items: &[SelectionItem],
) -> Vec<ElementId> {
    let entries: Vec<_> = items.iter().map(widgets::result_entry).collect();
    doc.replace_children(results, &entries)
}
