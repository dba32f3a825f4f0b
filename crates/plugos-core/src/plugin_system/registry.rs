use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use crate::kernel::error::Result;
use crate::plugin_system::dependency::DependencyGraph;
use crate::plugin_system::descriptor::PluginDescriptor;
use crate::plugin_system::error::PluginSystemError;
use crate::plugin_system::traits::Plugin;
use crate::storage::config::ConfigData;

/// A registered plugin: its descriptor, instance and optional configuration
#[derive(Clone)]
pub struct PluginRegistration {
    pub descriptor: PluginDescriptor,
    pub plugin: Arc<dyn Plugin>,
    pub config: Option<ConfigData>,
}

impl fmt::Debug for PluginRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginRegistration")
            .field("descriptor", &self.descriptor)
            .field("has_config", &self.config.is_some())
            .finish_non_exhaustive()
    }
}

/// Registry for managing plugins.
///
/// Pure bookkeeping: no ordering or lifecycle logic lives here.
#[derive(Default)]
pub struct PluginRegistry {
    plugins: HashMap<String, PluginRegistration>,
    /// Registration order
    order: Vec<String>,
}

impl PluginRegistry {
    /// Create an empty plugin registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a plugin under its descriptor's name
    pub fn register(
        &mut self,
        descriptor: PluginDescriptor,
        plugin: Arc<dyn Plugin>,
        config: Option<ConfigData>,
    ) -> Result<()> {
        let name = descriptor.name.clone();
        if self.plugins.contains_key(&name) {
            return Err(PluginSystemError::DuplicateRegistration { name }.into());
        }

        log::debug!("Registering plugin '{}' v{}", name, descriptor.version);
        self.plugins.insert(
            name.clone(),
            PluginRegistration {
                descriptor,
                plugin,
                config,
            },
        );
        self.order.push(name);
        Ok(())
    }

    /// Checks if a plugin with the given name is already registered.
    pub fn is_registered(&self, name: &str) -> bool {
        self.plugins.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&PluginRegistration> {
        self.plugins.get(name)
    }

    pub fn descriptor(&self, name: &str) -> Option<&PluginDescriptor> {
        self.plugins.get(name).map(|reg| &reg.descriptor)
    }

    pub fn config(&self, name: &str) -> Option<&ConfigData> {
        self.plugins.get(name).and_then(|reg| reg.config.as_ref())
    }

    /// Descriptors of every registered plugin, in registration order
    pub fn list(&self) -> Vec<PluginDescriptor> {
        self.iter().map(|reg| reg.descriptor.clone()).collect()
    }

    /// Registered plugin names, in registration order
    pub fn names(&self) -> Vec<String> {
        self.order.clone()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PluginRegistration> {
        self.order.iter().filter_map(|name| self.plugins.get(name))
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    /// Snapshot of the whole registry as a dependency graph
    pub fn dependency_graph(&self) -> DependencyGraph {
        let mut graph = DependencyGraph::new();
        for reg in self.iter() {
            graph.add_node(&reg.descriptor.name, reg.descriptor.dependencies.iter().cloned());
        }
        graph
    }

    /// Graph restricted to `name` and its transitive dependencies.
    ///
    /// Dependencies that are not registered are kept as edges but not as
    /// nodes, so resolving the graph reports them as missing.
    pub fn dependency_subgraph(&self, name: &str) -> DependencyGraph {
        let mut graph = DependencyGraph::new();
        let mut seen = HashSet::new();
        let mut pending = vec![name.to_string()];

        while let Some(current) = pending.pop() {
            if !seen.insert(current.clone()) {
                continue;
            }
            if let Some(descriptor) = self.descriptor(&current) {
                graph.add_node(&current, descriptor.dependencies.iter().cloned());
                pending.extend(descriptor.dependencies.iter().rev().cloned());
            }
        }
        graph
    }

    /// Graph over the given names only; edges leaving the set are dropped.
    pub fn dependency_graph_of(&self, names: &[String]) -> DependencyGraph {
        let members: HashSet<&str> = names.iter().map(String::as_str).collect();
        let mut graph = DependencyGraph::new();
        for name in names {
            let deps = self
                .descriptor(name)
                .map(|d| d.dependencies.clone())
                .unwrap_or_default();
            graph.add_node(name, deps.into_iter().filter(|dep| members.contains(dep.as_str())));
        }
        graph
    }

    /// Registered plugins that list `name` as a dependency
    pub fn dependents_of(&self, name: &str) -> Vec<String> {
        self.iter()
            .filter(|reg| reg.descriptor.depends_on(name))
            .map(|reg| reg.descriptor.name.clone())
            .collect()
    }
}

impl fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginRegistry")
            .field("plugins", &self.order)
            .finish()
    }
}

/// The set of loaded plugins, in the order they finished loading
#[derive(Default)]
pub struct LoadedPlugins {
    plugins: HashMap<String, Arc<dyn Plugin>>,
    order: Vec<String>,
}

impl LoadedPlugins {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: &str, plugin: Arc<dyn Plugin>) {
        if self.plugins.insert(name.to_string(), plugin).is_none() {
            self.order.push(name.to_string());
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<Arc<dyn Plugin>> {
        let removed = self.plugins.remove(name);
        if removed.is_some() {
            self.order.retain(|loaded| loaded != name);
        }
        removed
    }

    pub fn contains(&self, name: &str) -> bool {
        self.plugins.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Plugin>> {
        self.plugins.get(name).cloned()
    }

    /// Loaded plugin names in load order
    pub fn names(&self) -> Vec<String> {
        self.order.clone()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

impl fmt::Debug for LoadedPlugins {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(&self.order).finish()
    }
}
