//! # Plugos Core Kernel
//!
//! Bootstrapping and the shared vocabulary of the core.
//!
//! - **Application Bootstrapping**: [`Application`](bootstrap::Application) wires
//!   the event manager, the state store, the configuration loader and the plugin
//!   lifecycle manager together and drives them through their lifecycle.
//! - **Component Lifecycle**: the [`KernelComponent`](component::KernelComponent)
//!   trait and the ordered [`ComponentRegistry`](component::ComponentRegistry).
//! - **Core Constants**: names and directory layout in `constants`.
//! - **Error Handling**: the crate-wide [`Error`](error::Error) and `Result`.
pub mod bootstrap;
pub mod component;
pub mod constants;
pub mod error;

pub use bootstrap::Application;
pub use component::{ComponentRegistry, KernelComponent};
pub use error::{Error, KernelLifecyclePhase, Result};

#[cfg(test)]
mod tests;
