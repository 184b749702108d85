pub mod config;
pub mod controller;
pub mod dom;
pub mod error;
pub mod event;
pub mod form;
pub mod lifecycle;
pub mod models;
pub mod multi;
pub mod panel;
pub mod script;
pub mod search;
pub mod single;
pub mod widgets;

pub use config::{AppConfig, FieldConfig, MatchMode, SearchConfig};
pub use controller::{FieldController, SelectionController};
pub use dom::{Document, ElementId, Markup, Tag};
pub use error::{PickfieldError, Result};
pub use event::{EnvironmentEvent, SelectionChange, SelectionEvent, UiEvent};
pub use form::FormData;
pub use lifecycle::LifecycleManager;
pub use models::*;
pub use multi::MultiSelectionController;
pub use panel::{PanelState, ResultsPanel};
pub use script::{ReplayReport, ReplayScript, Step};
pub use search::{Catalog, CatalogEntry, CatalogSearch, SearchTransport, deliver_results};
pub use single::{OnSelect, SingleSelectionController};
