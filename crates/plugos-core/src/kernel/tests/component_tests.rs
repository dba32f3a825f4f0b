use std::sync::Arc;

use async_trait::async_trait;

use crate::kernel::component::{ComponentRegistry, KernelComponent};
use crate::kernel::error::Result;

#[derive(Debug)]
struct Alpha;

#[derive(Debug)]
struct Beta;

#[async_trait]
impl KernelComponent for Alpha {
    fn name(&self) -> &'static str { "Alpha" }
    async fn initialize(&self) -> Result<()> { Ok(()) }
    async fn start(&self) -> Result<()> { Ok(()) }
    async fn stop(&self) -> Result<()> { Ok(()) }
}

#[async_trait]
impl KernelComponent for Beta {
    fn name(&self) -> &'static str { "Beta" }
    async fn initialize(&self) -> Result<()> { Ok(()) }
    async fn start(&self) -> Result<()> { Ok(()) }
    async fn stop(&self) -> Result<()> { Ok(()) }
}

#[test]
fn test_registry_keeps_insertion_order() {
    let mut registry = ComponentRegistry::new();
    registry.register(Arc::new(Beta));
    registry.register(Arc::new(Alpha));

    assert_eq!(registry.names(), vec!["Beta", "Alpha"]);
    let reversed: Vec<&str> = registry.iter().rev().map(|c| c.name()).collect();
    assert_eq!(reversed, vec!["Alpha", "Beta"]);
    assert_eq!(registry.len(), 2);
}

#[test]
fn test_get_by_concrete_type() {
    let mut registry = ComponentRegistry::new();
    assert!(registry.get::<Alpha>().is_none());

    registry.register(Arc::new(Alpha));
    assert!(registry.get::<Alpha>().is_some());
    assert!(registry.get::<Beta>().is_none());
}
