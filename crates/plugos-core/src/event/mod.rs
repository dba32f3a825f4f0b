//! # Plugos Event System
//!
//! In-process publish/subscribe used as the lifecycle manager's event sink
//! and handed to plugins through their context.
//!
//! Handlers are registered per event name ([`EventManager::register_handler`])
//! or per concrete event type. A handler registered under [`WILDCARD_EVENT`]
//! receives every dispatched event. Handlers run sequentially in registration
//! order; one returning [`EventResult::Stop`] ends propagation.
pub mod dispatcher;
pub mod manager;
pub mod types;

use std::fmt;
use std::any::Any;
use std::sync::Arc;

use async_trait::async_trait;

/// Type for event identifiers
pub type EventId = u64;

/// Handler key that matches every event name
pub const WILDCARD_EVENT: &str = "*";

/// Event priority level.
///
/// Only the queue looks at it: `process_queue` handles higher priorities
/// first. `dispatch` runs handlers immediately whatever the priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum EventPriority {
    /// Lowest priority
    Low = 0,
    /// Default priority
    #[default]
    Normal = 1,
    /// Ahead of normal events in the queue
    High = 2,
    /// Ahead of everything else in the queue
    Critical = 3,
}

/// Result of event processing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventResult {
    /// Event was processed successfully and propagation should continue
    Continue,
    /// Event was processed and propagation should stop
    Stop,
}

/// Core event trait
pub trait Event: Any + fmt::Debug + Send + Sync {
    /// Get the name of this event, e.g. `plugin.loaded`
    fn name(&self) -> &str;

    /// Get event priority
    fn priority(&self) -> EventPriority {
        EventPriority::Normal
    }

    /// Check if this event can be cancelled
    fn is_cancelable(&self) -> bool {
        false
    }

    /// Clone this event
    fn clone_event(&self) -> Box<dyn Event>;

    /// Cast to Any for downcasting
    fn as_any(&self) -> &dyn Any;
}

/// Asynchronous event handler trait
#[async_trait]
pub trait AsyncEventHandler: Send + Sync {
    async fn handle(&self, event: &dyn Event) -> EventResult;
}

/// Event handler type alias
pub type EventHandler = Arc<dyn AsyncEventHandler>;

/// Re-export important types
pub use dispatcher::{EventDispatcher, SharedEventDispatcher, create_dispatcher};
pub use manager::{EventManager, DefaultEventManager, BoxedEvent};
pub use types::{EventMetadata, LifecycleEvent, LifecycleEventKind, LifecycleOperation, PluginEvent};

// Test module declaration
#[cfg(test)]
mod tests;
