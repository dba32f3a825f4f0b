use std::any::TypeId;
use std::cmp::Reverse;
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::Mutex;

use async_trait::async_trait;
use crate::event::{AsyncEventHandler, Event, EventHandler, EventId, EventResult, WILDCARD_EVENT};

// Owned future returned by boxed handlers
pub type BoxFuture<'a> = Pin<Box<dyn Future<Output = EventResult> + Send + 'a>>;

/// Boxed handler closure for events matched by name
pub type NamedHandlerFn = Box<dyn for<'a> Fn(&'a dyn Event) -> BoxFuture<'a> + Send + Sync>;

//--------------------------------------------------
// EventDispatcher (Internal, wrapped by SharedEventDispatcher)
//--------------------------------------------------

/// Event dispatcher for managing and dispatching events
pub struct EventDispatcher {
    handlers: HashMap<String, Vec<(EventId, EventHandler)>>,
    type_handlers: HashMap<TypeId, Vec<(EventId, EventHandler)>>,
    next_handler_id: EventId,
    event_queue: VecDeque<Box<dyn Event>>,
}

impl fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name_handler_count: usize = self.handlers.values().map(|v| v.len()).sum();
        let type_handler_count: usize = self.type_handlers.values().map(|v| v.len()).sum();
        f.debug_struct("EventDispatcher")
         .field("name_handlers_count", &name_handler_count)
         .field("type_handlers_count", &type_handler_count)
         .field("next_handler_id", &self.next_handler_id)
         .field("event_queue_size", &self.event_queue.len())
         .finish()
    }
}

/// Handler for events with a specific name
struct SimpleHandler {
    handler: NamedHandlerFn,
}

#[async_trait]
impl AsyncEventHandler for SimpleHandler {
    async fn handle(&self, event: &dyn Event) -> EventResult { (self.handler)(event).await }
}

/// Handler for typed events that will check the type
struct TypedEventHandler<E: Event + 'static> {
    handler: Box<dyn for<'a> Fn(&'a E) -> BoxFuture<'a> + Send + Sync>,
}

#[async_trait]
impl<E: Event + 'static> AsyncEventHandler for TypedEventHandler<E> {
    async fn handle(&self, event: &dyn Event) -> EventResult {
        if let Some(e) = event.as_any().downcast_ref::<E>() { (self.handler)(e).await }
        else { EventResult::Continue }
    }
}

async fn run_handlers(handlers: &[EventHandler], event: &dyn Event) -> EventResult {
    for handler in handlers {
        if handler.handle(event).await == EventResult::Stop {
            return EventResult::Stop;
        }
    }
    EventResult::Continue
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
            type_handlers: HashMap::new(),
            next_handler_id: 1,
            event_queue: VecDeque::new(),
        }
    }

    pub fn register_handler(&mut self, event_name: &str, handler: NamedHandlerFn) -> EventId {
        let id = self.next_handler_id; self.next_handler_id += 1;
        let handler = SimpleHandler { handler };
        self.handlers.entry(event_name.to_string()).or_default().push((id, Arc::new(handler)));
        id
    }

    pub fn register_type_handler<E: Event + 'static>(
        &mut self,
        handler: Box<dyn for<'a> Fn(&'a E) -> BoxFuture<'a> + Send + Sync>,
    ) -> EventId {
        let id = self.next_handler_id; self.next_handler_id += 1;
        let handler = TypedEventHandler { handler };
        self.type_handlers.entry(TypeId::of::<E>()).or_default().push((id, Arc::new(handler)));
        id
    }

    pub fn unregister_handler(&mut self, id: EventId) -> bool {
        let mut found = false;
        for handlers in self.handlers.values_mut().chain(self.type_handlers.values_mut()) {
            let len_before = handlers.len();
            handlers.retain(|(h_id, _)| *h_id != id);
            found |= handlers.len() < len_before;
        }
        found
    }

    /// Handlers matching `event`: name handlers first, then wildcard
    /// handlers, then type handlers, each in registration order.
    pub fn handlers_for(&self, event: &dyn Event) -> Vec<EventHandler> {
        let named = self.handlers.get(event.name()).into_iter().flatten();
        let wildcard = self
            .handlers
            .get(WILDCARD_EVENT)
            .filter(|_| event.name() != WILDCARD_EVENT)
            .into_iter()
            .flatten();
        let typed = self.type_handlers.get(&event.as_any().type_id()).into_iter().flatten();
        named.chain(wildcard).chain(typed).map(|(_, handler)| handler.clone()).collect()
    }

    pub async fn dispatch_internal(&self, event: &dyn Event) -> EventResult {
        run_handlers(&self.handlers_for(event), event).await
    }

    pub fn queue_event(&mut self, event: Box<dyn Event>) { self.event_queue.push_back(event); }

    /// Empty the queue, highest priority first, FIFO within a priority.
    pub fn take_queued(&mut self) -> Vec<Box<dyn Event>> {
        let mut events: Vec<Box<dyn Event>> = self.event_queue.drain(..).collect();
        events.sort_by_key(|event| Reverse(event.priority()));
        events
    }

    pub fn queue_size(&self) -> usize { self.event_queue.len() }

    pub fn handler_count(&self) -> usize {
        self.handlers.values().chain(self.type_handlers.values()).map(Vec::len).sum()
    }
}

impl Default for EventDispatcher { fn default() -> Self { Self::new() } }

//--------------------------------------------------
// SharedEventDispatcher (Public API)
//--------------------------------------------------

/// Thread-safe shared event dispatcher using Tokio Mutex
#[derive(Clone)]
pub struct SharedEventDispatcher {
    dispatcher: Arc<Mutex<EventDispatcher>>
}

impl fmt::Debug for SharedEventDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedEventDispatcher").finish_non_exhaustive()
    }
}

impl SharedEventDispatcher {
    pub fn new() -> Self { Self { dispatcher: Arc::new(Mutex::new(EventDispatcher::new())) } }

    /// Handlers run without the dispatcher lock held, so they may publish,
    /// queue or (un)register on this same dispatcher.
    pub async fn dispatch(&self, event: &dyn Event) -> EventResult {
        let handlers = self.dispatcher.lock().await.handlers_for(event);
        run_handlers(&handlers, event).await
    }

    pub async fn queue_event(&self, event: Box<dyn Event>) {
        let mut dispatcher = self.dispatcher.lock().await;
        dispatcher.queue_event(event);
    }

    /// Dispatch queued events until the queue stays empty, including
    /// events queued by handlers along the way.
    pub async fn process_queue(&self) -> usize {
        let mut count = 0;
        loop {
            let batch = self.dispatcher.lock().await.take_queued();
            if batch.is_empty() {
                return count;
            }
            for event in batch {
                self.dispatch(&*event).await;
                count += 1;
            }
        }
    }

    pub async fn queue_size(&self) -> usize {
        self.dispatcher.lock().await.queue_size()
    }

    pub async fn register_handler(&self, event_name: &str, handler: NamedHandlerFn) -> EventId {
        let mut dispatcher = self.dispatcher.lock().await;
        dispatcher.register_handler(event_name, handler)
    }

    pub async fn register_type_handler<E: Event + 'static>(
        &self,
        handler: Box<dyn for<'a> Fn(&'a E) -> BoxFuture<'a> + Send + Sync>,
    ) -> EventId {
        let mut dispatcher = self.dispatcher.lock().await;
        dispatcher.register_type_handler::<E>(handler)
    }

    pub async fn unregister_handler(&self, id: EventId) -> bool {
        let mut dispatcher = self.dispatcher.lock().await;
        dispatcher.unregister_handler(id)
    }
}

impl Default for SharedEventDispatcher { fn default() -> Self { Self::new() } }

//--------------------------------------------------
// Helper Functions
//--------------------------------------------------

/// Create a new event dispatcher instance
pub fn create_dispatcher() -> SharedEventDispatcher { SharedEventDispatcher::new() }

/// Helper function to create synchronous handlers that are compatible with async system
pub fn sync_event_handler<F>(f: F) -> NamedHandlerFn
where F: Fn(&dyn Event) -> EventResult + Send + Sync + 'static {
    Box::new(move |event| { let result = f(event); Box::pin(async move { result }) })
}

/// Helper function to create typed synchronous handlers
pub fn sync_typed_handler<E, F>(f: F) -> Box<dyn for<'a> Fn(&'a E) -> BoxFuture<'a> + Send + Sync>
where E: Event + 'static, F: Fn(&E) -> EventResult + Send + Sync + 'static {
    Box::new(move |event| { let result = f(event); Box::pin(async move { result }) })
}
