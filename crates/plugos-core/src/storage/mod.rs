//! # Plugos Storage
//!
//! Filesystem-backed collaborators of the plugin system: the namespaced
//! [`StateStore`] that hands each plugin its own [`PluginState`], and the
//! [`ConfigLoader`] that reads per-plugin configuration files. Both go through
//! the [`StorageProvider`] abstraction, implemented for the local filesystem by
//! [`LocalStorageProvider`].
pub mod config;
pub mod error;
pub mod local;
pub mod provider;
pub mod state;

pub use config::{ConfigData, ConfigFormat, ConfigLoader};
pub use error::StorageSystemError;
pub use local::LocalStorageProvider;
pub use provider::StorageProvider;
pub use state::{PluginState, StateStore};
