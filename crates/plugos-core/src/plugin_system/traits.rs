use std::any::Any;

use async_trait::async_trait;
use thiserror::Error;

use crate::kernel::error::Result;
use crate::plugin_system::context::PluginContext;
use crate::storage::config::ConfigData;

/// Error type for failures raised by plugin hooks
#[derive(Debug, Error)]
pub enum PluginError {
    #[error("Plugin configuration error: {0}")]
    ConfigureError(String),
    #[error("Plugin loading error: {0}")]
    LoadError(String),
    #[error("Plugin unloading error: {0}")]
    UnloadError(String),
}

/// Lifecycle hooks of a registrable unit.
///
/// Every hook is optional; the defaults succeed without doing anything.
/// The manager awaits each hook to completion before moving on, so a
/// dependency's `load` has finished before any dependent's `load` starts.
/// Hooks take `&self`; plugins that keep state use interior mutability.
#[async_trait]
pub trait Plugin: Any + Send + Sync {
    /// Receives the configuration object given at registration (empty if none).
    async fn configure(&self, _config: &ConfigData) -> Result<()> {
        Ok(())
    }

    /// Called once all dependencies are loaded.
    async fn load(&self, _context: &PluginContext) -> Result<()> {
        Ok(())
    }

    /// Called before the plugin leaves the loaded set.
    async fn unload(&self) -> Result<()> {
        Ok(())
    }
}
