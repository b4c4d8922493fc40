//! "Open With" viewer catalog.
//!
//! Tracks which viewer opens a class of files (extension plus media type),
//! lets the user add their own applications per class, and persists both to
//! a per-user settings file.

pub mod candidates;
pub mod catalog;
pub mod host;
pub mod key;
pub mod lazy;
pub mod logging;
pub mod provider;
pub mod session;
pub mod settings;
pub mod viewer;

pub use catalog::ViewerCatalog;
pub use host::{Host, StaticHost};
pub use key::ViewerKey;
pub use lazy::{LazyViewerProvider, ResolutionState};
pub use provider::{
    ContentBinding, ExternalBinding, FileMatcher, FileQuery, MappedViewerProvider, ViewerProvider,
};
pub use session::ConfigurationSession;
pub use settings::{SettingsDocument, SettingsStore, default_settings_path};
pub use viewer::{
    ApplicationViewer, ContentViewer, UserDefinedViewer, Viewer, can_add_application,
    suggest_friendly_name,
};
