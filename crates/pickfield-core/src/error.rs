use thiserror::Error;

/// All errors that can occur in pickfield-core.
///
/// Selection controllers and the lifecycle manager never fail; these cover
/// the fallible edges around them (config files, catalogs, replay scripts).
#[derive(Debug, Error)]
pub enum PickfieldError {
    #[error("Element not found: {0}")]
    ElementNotFound(String),

    #[error("Not a selection field: {0}")]
    NotAField(String),

    #[error("Invalid script: {0}")]
    InvalidScript(String),

    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

pub type Result<T> = std::result::Result<T, PickfieldError>;
