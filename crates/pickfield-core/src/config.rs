use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Root application configuration, loaded from `~/.config/pickfield/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub field: FieldConfig,
    pub search: SearchConfig,
    pub ui: UiConfig,
    pub logging: LoggingConfig,
}

/// Behaviour shared by every selection field.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldConfig {
    /// Search text length (in chars) at which the results panel opens.
    pub min_query_len: usize,
    /// Placed between display name and secondary label in a committed label.
    pub label_separator: String,
    /// Placeholder shown by a multi-value field with nothing selected.
    pub empty_message: String,
    /// Display name for server-rendered carriers without `data-name`.
    pub fallback_name: String,
    /// Carrier field name for multi-value roots without `data-field-name`.
    pub default_field_name: String,
    /// Class toggled on the hovered result entry.
    pub highlight_class: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    #[default]
    Contains,
    Fuzzy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub match_mode: MatchMode,
    pub max_results: usize,
    /// Simulated transport delay used by the terminal front-end.
    pub latency_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    pub tick_rate_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

// ─── Defaults ──────────────────────────────────────────────

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            min_query_len: 2,
            label_separator: " - ".to_string(),
            empty_message: "Nothing selected".to_string(),
            fallback_name: "Selected item".to_string(),
            default_field_name: "items".to_string(),
            highlight_class: "is-highlighted".to_string(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            match_mode: MatchMode::Contains,
            max_results: 20,
            latency_ms: 120,
            catalog_path: None,
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self { tick_rate_ms: 250 }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

// ─── Load / Save ───────────────────────────────────────────

impl AppConfig {
    /// Standard config file path: `~/.config/pickfield/config.toml`
    pub fn config_path() -> PathBuf {
        if let Ok(path) = std::env::var("PICKFIELD_CONFIG") {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("pickfield")
            .join("config.toml")
    }

    /// Load config from disk, falling back to defaults if file doesn't exist.
    pub fn load() -> Result<Self> {
        let path = Self::config_path();
        Self::load_from(&path)
    }

    /// Load config from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Save config to the standard path.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path();
        self.save_to(&path)
    }

    /// Save config to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let toml_str = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_str)?;
        Ok(())
    }

    /// Where the terminal front-end writes its log.
    pub fn log_path(&self) -> PathBuf {
        if let Some(file) = &self.logging.file {
            return PathBuf::from(file);
        }
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("~/.local/share"))
            .join("pickfield")
            .join("pickfield.log")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config_is_valid() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.field.min_query_len, 2);
        assert_eq!(cfg.field.label_separator, " - ");
        assert_eq!(cfg.search.max_results, 20);
        assert_eq!(cfg.search.match_mode, MatchMode::Contains);
    }

    #[test]
    fn test_config_toml_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");

        let mut cfg = AppConfig::default();
        cfg.search.match_mode = MatchMode::Fuzzy;
        cfg.field.empty_message = "Nenhum líder selecionado".to_string();
        cfg.save_to(&path).unwrap();

        let loaded = AppConfig::load_from(&path).unwrap();
        assert_eq!(loaded.search.match_mode, MatchMode::Fuzzy);
        assert_eq!(loaded.field.empty_message, cfg.field.empty_message);
        assert_eq!(loaded.ui.tick_rate_ms, cfg.ui.tick_rate_ms);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[field]\nmin_query_len = 3\n").unwrap();

        let cfg = AppConfig::load_from(&path).unwrap();
        assert_eq!(cfg.field.min_query_len, 3);
        assert_eq!(cfg.field.label_separator, " - ");
        assert_eq!(cfg.logging.level, "info");
    }

    #[test]
    fn test_load_nonexistent_returns_default() {
        let cfg =
            AppConfig::load_from(Path::new("/tmp/nonexistent_pickfield_config.toml")).unwrap();
        assert_eq!(cfg.field.min_query_len, 2);
    }

    #[test]
    fn test_log_path_override() {
        let mut cfg = AppConfig::default();
        cfg.logging.file = Some("/tmp/pf.log".to_string());
        assert_eq!(cfg.log_path(), PathBuf::from("/tmp/pf.log"));
    }
}
