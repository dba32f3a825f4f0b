//! # Plugos Plugin System Errors
//!
//! Defines [`PluginSystemError`], the error enum of the registry, the
//! dependency resolver and the lifecycle manager. Resolution failures are
//! carried as [`DependencyError`] so they can be matched on directly.
use std::fmt;

use crate::plugin_system::dependency::DependencyError;

/// Which set a failed lookup was made against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupContext {
    /// The registry of known plugins
    Registered,
    /// The set of currently loaded plugins
    Loaded,
}

impl fmt::Display for LookupContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LookupContext::Registered => write!(f, "registered"),
            LookupContext::Loaded => write!(f, "loaded"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PluginSystemError {
    #[error("Plugin '{name}' is already registered")]
    DuplicateRegistration { name: String },

    #[error("Plugin '{name}' is not {context}")]
    NotFound { name: String, context: LookupContext },

    #[error("Plugin '{name}' is required by loaded plugins: {}", .dependents.join(", "))]
    InUse { name: String, dependents: Vec<String> },

    #[error("Dependency resolution failed: {0}")]
    DependencyResolution(#[from] DependencyError),

    #[error("Plugin '{name}' was skipped because its dependency '{dependency}' failed to load")]
    DependencyFailed { name: String, dependency: String },
}

impl PluginSystemError {
    pub fn not_registered(name: &str) -> Self {
        PluginSystemError::NotFound {
            name: name.to_string(),
            context: LookupContext::Registered,
        }
    }

    pub fn not_loaded(name: &str) -> Self {
        PluginSystemError::NotFound {
            name: name.to_string(),
            context: LookupContext::Loaded,
        }
    }
}
