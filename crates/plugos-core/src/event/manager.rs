use std::fmt::Debug;
use async_trait::async_trait;

use crate::event::{Event, EventId, EventResult};
use crate::event::dispatcher::{self, NamedHandlerFn, SharedEventDispatcher};
use crate::kernel::component::KernelComponent;
use crate::kernel::error::Result;

/// Type alias for boxed event
pub type BoxedEvent = Box<dyn Event>;

/// Event sink shared by the lifecycle manager and every plugin context.
///
/// Plugins receive publish/subscribe access through this trait, never
/// ownership of the underlying dispatcher.
#[async_trait]
pub trait EventManager: KernelComponent + Send + Sync {
    /// Register a handler for events with a specific name
    async fn register_handler(&self, event_name: &str, handler: NamedHandlerFn) -> EventId;

    /// Unregister a handler by its ID
    async fn unregister_handler(&self, id: EventId) -> bool;

    /// Dispatch an event to its handlers immediately
    async fn dispatch(&self, event: &dyn Event) -> EventResult;

    /// Queue an event for later processing
    async fn queue_event(&self, event: BoxedEvent);

    /// Process all queued events
    async fn process_queue(&self) -> usize;
}

/// Default implementation of EventManager
#[derive(Clone, Debug)]
pub struct DefaultEventManager {
    name: &'static str,
    dispatcher: SharedEventDispatcher,
}

impl DefaultEventManager {
    pub fn new() -> Self {
        Self {
            name: "DefaultEventManager",
            dispatcher: dispatcher::create_dispatcher(),
        }
    }

    pub fn dispatcher(&self) -> &SharedEventDispatcher {
        &self.dispatcher
    }

    /// Register a synchronous handler for events with a specific name
    pub async fn register_sync_handler<F>(&self, event_name: &str, handler: F) -> EventId
    where
        F: Fn(&dyn Event) -> EventResult + Send + Sync + 'static,
    {
        let async_handler = dispatcher::sync_event_handler(handler);
        self.register_handler(event_name, async_handler).await
    }

    /// Register a synchronous handler for events of a specific type
    pub async fn register_sync_type_handler<E, F>(&self, handler: F) -> EventId
    where
        E: Event + 'static,
        F: Fn(&E) -> EventResult + Send + Sync + 'static,
    {
        let async_handler = dispatcher::sync_typed_handler(handler);
        self.dispatcher.register_type_handler::<E>(async_handler).await
    }
}

#[async_trait]
impl KernelComponent for DefaultEventManager {
    fn name(&self) -> &'static str { self.name }
    async fn initialize(&self) -> Result<()> { Ok(()) }
    async fn start(&self) -> Result<()> { Ok(()) }
    async fn stop(&self) -> Result<()> {
        let flushed = self.process_queue().await;
        log::debug!("Flushed {} queued events on stop", flushed);
        Ok(())
    }
}

#[async_trait]
impl EventManager for DefaultEventManager {
    async fn register_handler(&self, event_name: &str, handler: NamedHandlerFn) -> EventId {
        self.dispatcher.register_handler(event_name, handler).await
    }

    async fn unregister_handler(&self, id: EventId) -> bool {
        self.dispatcher.unregister_handler(id).await
    }

    async fn dispatch(&self, event: &dyn Event) -> EventResult {
        self.dispatcher.dispatch(event).await
    }

    async fn queue_event(&self, event: BoxedEvent) {
        self.dispatcher.queue_event(event).await
    }

    async fn process_queue(&self) -> usize {
        self.dispatcher.process_queue().await
    }
}

impl Default for DefaultEventManager {
    fn default() -> Self {
        Self::new()
    }
}
