//! # Plugos Plugin System
//!
//! Registration, dependency ordering and lifecycle of plugins.
//!
//! ## Key Submodules and Responsibilities:
//!
//! - **[`descriptor`]**: The immutable identity of a plugin ([`PluginDescriptor`]):
//!   name, version, description and the names it depends on.
//! - **[`traits`]**: The [`Plugin`] trait with its optional `configure`, `load`
//!   and `unload` hooks, and [`PluginError`] for hook failures.
//! - **[`registry`]**: Bookkeeping of registered plugins ([`PluginRegistry`]) and of
//!   the loaded set ([`LoadedPlugins`]). No ordering or lifecycle logic.
//! - **[`dependency`]**: The [`DependencyGraph`] and [`resolve_order`], a
//!   topological sort that rejects missing dependencies and cycles.
//! - **[`context`]**: The [`CapabilityContextFactory`] building the
//!   [`PluginContext`] each plugin receives in its `load` hook.
//! - **[`manager`]**: The [`PluginLifecycleManager`], which drives plugins through
//!   their hooks in dependency order and aggregates batch results.
//! - **[`error`]**: [`PluginSystemError`], the error taxonomy of the above.
pub mod context;
pub mod dependency;
pub mod descriptor;
pub mod error;
pub mod manager;
pub mod registry;
pub mod traits;

pub use context::{CapabilityContextFactory, PluginContext, PluginLogger};
pub use dependency::{resolve_order, DependencyError, DependencyGraph};
pub use descriptor::PluginDescriptor;
pub use error::{LookupContext, PluginSystemError};
pub use manager::{BatchFailure, BatchResult, PluginLifecycleManager};
pub use registry::{LoadedPlugins, PluginRegistration, PluginRegistry};
pub use traits::{Plugin, PluginError};

#[cfg(test)]
mod tests;
