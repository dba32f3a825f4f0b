use std::any::Any;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::event::{Event, EventPriority};
use crate::kernel::constants::LIFECYCLE_EVENT_SOURCE;

/// Lifecycle transitions reported by the plugin lifecycle manager
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LifecycleEventKind {
    #[serde(rename = "plugin.registered")]
    Registered,
    #[serde(rename = "plugin.loaded")]
    Loaded,
    #[serde(rename = "plugin.unloaded")]
    Unloaded,
    #[serde(rename = "plugin.error")]
    Error,
}

impl LifecycleEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleEventKind::Registered => "plugin.registered",
            LifecycleEventKind::Loaded => "plugin.loaded",
            LifecycleEventKind::Unloaded => "plugin.unloaded",
            LifecycleEventKind::Error => "plugin.error",
        }
    }
}

/// Lifecycle operation named in `plugin.error` payloads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleOperation {
    Load,
    Unload,
}

impl LifecycleOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleOperation::Load => "load",
            LifecycleOperation::Unload => "unload",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventMetadata {
    pub source: String,
}

/// Immutable record of a lifecycle transition
#[derive(Debug, Clone, Serialize)]
pub struct LifecycleEvent {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub kind: LifecycleEventKind,
    pub timestamp: DateTime<Utc>,
    pub payload: Value,
    pub metadata: EventMetadata,
}

impl LifecycleEvent {
    fn new(kind: LifecycleEventKind, payload: Value) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            timestamp: Utc::now(),
            payload,
            metadata: EventMetadata {
                source: LIFECYCLE_EVENT_SOURCE.to_string(),
            },
        }
    }

    pub fn registered(name: &str, version: &str, dependencies: &[String]) -> Self {
        Self::new(
            LifecycleEventKind::Registered,
            json!({ "name": name, "version": version, "dependencies": dependencies }),
        )
    }

    pub fn loaded(name: &str, load_time_ms: u128) -> Self {
        Self::new(
            LifecycleEventKind::Loaded,
            json!({ "name": name, "loadTimeMs": load_time_ms as u64 }),
        )
    }

    pub fn unloaded(name: &str) -> Self {
        Self::new(LifecycleEventKind::Unloaded, json!({ "name": name }))
    }

    pub fn error(name: &str, operation: LifecycleOperation, error: &str) -> Self {
        Self::new(
            LifecycleEventKind::Error,
            json!({ "name": name, "operation": operation.as_str(), "error": error }),
        )
    }

    /// The `name` field of the payload
    pub fn plugin_name(&self) -> Option<&str> {
        self.payload.get("name").and_then(Value::as_str)
    }
}

impl Event for LifecycleEvent {
    fn name(&self) -> &str {
        self.kind.as_str()
    }

    fn priority(&self) -> EventPriority {
        match self.kind {
            LifecycleEventKind::Error => EventPriority::High,
            _ => EventPriority::Normal,
        }
    }

    fn clone_event(&self) -> Box<dyn Event> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Event published by a plugin through its context
#[derive(Debug, Clone)]
pub struct PluginEvent {
    /// Name of the event
    pub name: String,
    /// Source plugin name
    pub source: String,
    pub data: Value,
    pub priority: EventPriority,
    pub cancelable: bool,
}

impl PluginEvent {
    pub fn new(name: &str, source: &str, data: Value) -> Self {
        Self {
            name: name.to_string(),
            source: source.to_string(),
            data,
            priority: EventPriority::Normal,
            cancelable: false,
        }
    }
}

impl Event for PluginEvent {
    fn name(&self) -> &str {
        &self.name
    }

    fn priority(&self) -> EventPriority {
        self.priority
    }

    fn is_cancelable(&self) -> bool {
        self.cancelable
    }

    fn clone_event(&self) -> Box<dyn Event> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
