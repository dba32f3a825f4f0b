use std::any::Any;
use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;

use crate::kernel::error::Result;

/// Core component lifecycle trait for all kernel components
#[async_trait]
pub trait KernelComponent: Any + Send + Sync + Debug {
    fn name(&self) -> &'static str;
    async fn initialize(&self) -> Result<()>;
    async fn start(&self) -> Result<()>;
    async fn stop(&self) -> Result<()>;
}

/// Kernel components in initialization order.
///
/// Components start in insertion order and stop in reverse.
#[derive(Default, Debug)]
pub struct ComponentRegistry {
    components: Vec<Arc<dyn KernelComponent>>,
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<V: KernelComponent>(&mut self, component: Arc<V>) {
        self.components.push(component);
    }

    /// Get a component by its concrete type
    pub fn get<T: KernelComponent>(&self) -> Option<Arc<T>> {
        self.components.iter().find_map(|component| {
            let any: Arc<dyn Any + Send + Sync> = component.clone();
            Arc::downcast::<T>(any).ok()
        })
    }

    /// Components in initialization order
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Arc<dyn KernelComponent>> {
        self.components.iter()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.components.iter().map(|c| c.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}
