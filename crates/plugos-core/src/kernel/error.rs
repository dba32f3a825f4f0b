//! # Plugos Core Kernel Errors
//!
//! Defines the crate-wide [`Error`] type and its [`Result`] alias.
//!
//! Each subsystem owns a typed error enum ([`PluginSystemError`],
//! [`StorageSystemError`]) and plugin hooks report failures through
//! [`PluginError`]. The kernel error wraps all of them with `#[from]`
//! conversions so callers can propagate any of them with `?`.
use std::result::Result as StdResult;

use crate::plugin_system::dependency::DependencyError;
use crate::plugin_system::error::PluginSystemError;
use crate::plugin_system::traits::PluginError;
use crate::storage::error::StorageSystemError;
use thiserror::Error as ThisError;

/// Error type shared by every public operation of the crate
#[derive(Debug, ThisError)]
pub enum Error {
    /// Registry, resolver or lifecycle manager error
    #[error("Plugin system error: {0}")]
    PluginSystem(#[from] PluginSystemError),

    /// Failure reported by a plugin's own hook
    #[error("Plugin error: {0}")]
    Plugin(#[from] PluginError),

    /// State store or configuration error
    #[error("Storage system error: {0}")]
    StorageSystem(#[from] StorageSystemError),

    /// Error occurring during a specific kernel lifecycle phase.
    #[error("Kernel lifecycle error during {phase}: {message}")]
    KernelLifecycleError {
        phase: KernelLifecyclePhase,
        component_name: Option<String>,
        message: String,
        #[source]
        source: Option<Box<Error>>,
    },
}

impl From<DependencyError> for Error {
    fn from(err: DependencyError) -> Self {
        Error::PluginSystem(PluginSystemError::DependencyResolution(err))
    }
}

impl Error {
    /// Returns the plugin system error this wraps, if any.
    pub fn as_plugin_system(&self) -> Option<&PluginSystemError> {
        match self {
            Error::PluginSystem(err) => Some(err),
            _ => None,
        }
    }

    /// Returns the dependency resolution error this wraps, if any.
    pub fn as_dependency_error(&self) -> Option<&DependencyError> {
        match self {
            Error::PluginSystem(PluginSystemError::DependencyResolution(err)) => Some(err),
            _ => None,
        }
    }
}

/// Represents a specific phase in the kernel's lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum KernelLifecyclePhase {
    #[error("Initialize")]
    Initialize,
    #[error("Start")]
    Start,
    #[error("RunPreCheck")]
    RunPreCheck,
    #[error("Shutdown")]
    Shutdown,
}

/// Shorthand for Result with our Error type
pub type Result<T> = StdResult<T, Error>;
