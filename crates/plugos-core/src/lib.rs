//! # Plugos Core
//!
//! An in-process host for composable plugins. Plugins are registered with a
//! [`PluginLifecycleManager`], which resolves their declared dependencies into a
//! load order and drives each plugin through `configure`, `load` and `unload`,
//! handing it a [`PluginContext`] scoped to its own state and configuration.
pub mod event;
pub mod kernel;
pub mod plugin_system;
pub mod storage;

pub use event::{Event, EventManager, DefaultEventManager, LifecycleEvent};
pub use kernel::Application;
pub use kernel::error::{Error, Result};
pub use plugin_system::{
    BatchResult, Plugin, PluginContext, PluginDescriptor, PluginError, PluginLifecycleManager,
};
pub use storage::{ConfigData, StateStore, StorageProvider};

#[cfg(test)]
mod tests;
