
use std::any::Any;

use crate::event::{Event, EventPriority};

/// Minimal event used across the event tests
#[derive(Debug, Clone)]
pub(super) struct TestEvent {
    pub name: String,
    pub data: String,
    pub priority: EventPriority,
}

impl TestEvent {
    pub fn new(name: &str, data: &str) -> Self {
        Self {
            name: name.to_string(),
            data: data.to_string(),
            priority: EventPriority::Normal,
        }
    }
}

impl Event for TestEvent {
    fn name(&self) -> &str {
        &self.name
    }

    fn priority(&self) -> EventPriority {
        self.priority
    }

    fn clone_event(&self) -> Box<dyn Event> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[test]
fn test_event_priority_default() {
    assert_eq!(EventPriority::default(), EventPriority::Normal);
}

#[test]
fn test_event_priority_ordering() {
    assert!(EventPriority::Critical > EventPriority::High);
    assert!(EventPriority::High > EventPriority::Normal);
    assert!(EventPriority::Normal > EventPriority::Low);
}
