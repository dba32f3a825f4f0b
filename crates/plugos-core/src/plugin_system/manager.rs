use std::collections::{HashMap, HashSet};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

use crate::event::{EventManager, LifecycleEvent, LifecycleOperation};
use crate::kernel::component::KernelComponent;
use crate::kernel::error::{Error, Result};
use crate::plugin_system::context::CapabilityContextFactory;
use crate::plugin_system::dependency::resolve_order;
use crate::plugin_system::descriptor::PluginDescriptor;
use crate::plugin_system::error::PluginSystemError;
use crate::plugin_system::registry::{LoadedPlugins, PluginRegistry};
use crate::plugin_system::traits::Plugin;
use crate::storage::config::ConfigData;
use crate::storage::state::StateStore;

/// Per-item failure of a batch operation
#[derive(Debug)]
pub struct BatchFailure {
    pub name: String,
    pub error: Error,
}

/// Outcome of [`PluginLifecycleManager::load_all`] or
/// [`PluginLifecycleManager::unload_all`]
#[derive(Debug, Default)]
pub struct BatchResult {
    pub successful: Vec<String>,
    pub failed: Vec<BatchFailure>,
}

impl BatchResult {
    /// True when no item failed
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn failed_names(&self) -> Vec<&str> {
        self.failed.iter().map(|f| f.name.as_str()).collect()
    }

    pub fn failure(&self, name: &str) -> Option<&BatchFailure> {
        self.failed.iter().find(|f| f.name == name)
    }

    fn fail(&mut self, name: &str, error: Error) {
        self.failed.push(BatchFailure {
            name: name.to_string(),
            error,
        });
    }
}

enum LoadOutcome {
    Loaded,
    HookFailed(Error),
    DependencyFailed(Error),
}

/// Operations currently running, keyed by plugin name
#[derive(Default)]
struct InFlight {
    locks: HashMap<String, Arc<Mutex<()>>>,
    loading: HashSet<String>,
    unloading: HashSet<String>,
}

/// Drives registered plugins through configure, load and unload.
///
/// Owns the registry and the loaded set; both change only through the
/// methods below. Loads of the same name are serialised by a per-name
/// lock, so a plugin's hooks run at most once per load even when `load`
/// is called concurrently.
pub struct PluginLifecycleManager {
    registry: RwLock<PluginRegistry>,
    loaded: Arc<RwLock<LoadedPlugins>>,
    in_flight: Mutex<InFlight>,
    events: Arc<dyn EventManager>,
    contexts: CapabilityContextFactory,
}

impl PluginLifecycleManager {
    pub fn new(events: Arc<dyn EventManager>, state_store: StateStore) -> Self {
        let loaded = Arc::new(RwLock::new(LoadedPlugins::new()));
        let contexts = CapabilityContextFactory::new(events.clone(), state_store, loaded.clone());
        Self {
            registry: RwLock::new(PluginRegistry::new()),
            loaded,
            in_flight: Mutex::new(InFlight::default()),
            events,
            contexts,
        }
    }

    /// Register a plugin and announce it with `plugin.registered`
    pub async fn register(
        &self,
        descriptor: PluginDescriptor,
        plugin: Arc<dyn Plugin>,
        config: Option<ConfigData>,
    ) -> Result<()> {
        let event = LifecycleEvent::registered(
            &descriptor.name,
            &descriptor.version,
            &descriptor.dependencies,
        );
        self.registry.write().await.register(descriptor, plugin, config)?;
        self.emit(&event).await;
        Ok(())
    }

    pub async fn is_registered(&self, name: &str) -> bool {
        self.registry.read().await.is_registered(name)
    }

    /// Descriptors of all registered plugins, in registration order
    pub async fn list_plugins(&self) -> Vec<PluginDescriptor> {
        self.registry.read().await.list()
    }

    pub async fn is_loaded(&self, name: &str) -> bool {
        self.loaded.read().await.contains(name)
    }

    /// Names of loaded plugins, in load order
    pub async fn get_loaded_plugins(&self) -> Vec<String> {
        self.loaded.read().await.names()
    }

    pub async fn get_plugin_dependencies(&self, name: &str) -> Result<Vec<String>> {
        self.registry
            .read()
            .await
            .descriptor(name)
            .map(|d| d.dependencies.clone())
            .ok_or_else(|| PluginSystemError::not_registered(name).into())
    }

    /// Registered plugins that declare `name` as a dependency
    pub async fn get_dependent_plugins(&self, name: &str) -> Result<Vec<String>> {
        let registry = self.registry.read().await;
        if !registry.is_registered(name) {
            return Err(PluginSystemError::not_registered(name).into());
        }
        Ok(registry.dependents_of(name))
    }

    /// Dependency-first order over the whole registry
    pub async fn resolve_load_order(&self) -> Result<Vec<String>> {
        let graph = self.registry.read().await.dependency_graph();
        Ok(resolve_order(&graph, None)?)
    }

    /// Load `name` after every one of its transitive dependencies.
    ///
    /// Returns immediately when the plugin is already loaded. A failing
    /// dependency aborts the load with that dependency's error; plugins
    /// loaded before the failure stay loaded.
    pub async fn load(&self, name: &str) -> Result<()> {
        self.load_recursive(name, true).await
    }

    /// `target` is false for frames loading a dependency on behalf of
    /// another plugin; those stay silent when a deeper dependency fails.
    fn load_recursive<'a>(
        &'a self,
        name: &'a str,
        target: bool,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(async move {
            if self.is_settled(name).await {
                return Ok(());
            }

            let (order, plugin, config) = {
                let registry = self.registry.read().await;
                let registration = registry
                    .get(name)
                    .ok_or_else(|| Error::from(PluginSystemError::not_registered(name)))?;
                let order = resolve_order(&registry.dependency_subgraph(name), Some(name));
                (order, registration.plugin.clone(), registration.config.clone())
            };
            let order = match order {
                Ok(order) => order,
                Err(err) => {
                    let err = Error::from(err);
                    self.emit_error(name, LifecycleOperation::Load, &err).await;
                    return Err(err);
                }
            };

            let started = Instant::now();
            let outcome = {
                let _guard = self.lock_name(name).await;
                if self.is_loaded(name).await {
                    return Ok(());
                }

                self.in_flight.lock().await.loading.insert(name.to_string());
                let outcome = self.load_with_dependencies(name, &order, plugin, config).await;
                self.in_flight.lock().await.loading.remove(name);
                outcome
            };

            // Events go out once the name is unlocked; handlers may call back
            // into the manager.
            match outcome {
                LoadOutcome::Loaded => {
                    let elapsed = started.elapsed().as_millis();
                    log::info!("Loaded plugin '{}' in {}ms", name, elapsed);
                    self.emit(&LifecycleEvent::loaded(name, elapsed)).await;
                    Ok(())
                }
                LoadOutcome::HookFailed(err) => {
                    log::error!("Failed to load plugin '{}': {}", name, err);
                    self.emit_error(name, LifecycleOperation::Load, &err).await;
                    Err(err)
                }
                LoadOutcome::DependencyFailed(err) => {
                    log::error!("Failed to load plugin '{}': {}", name, err);
                    if target {
                        self.emit_error(name, LifecycleOperation::Load, &err).await;
                    }
                    Err(err)
                }
            }
        })
    }

    async fn load_with_dependencies(
        &self,
        name: &str,
        order: &[String],
        plugin: Arc<dyn Plugin>,
        config: Option<ConfigData>,
    ) -> LoadOutcome {
        for dependency in order.iter().filter(|dep| dep.as_str() != name) {
            if let Err(err) = self.load_recursive(dependency, false).await {
                return LoadOutcome::DependencyFailed(err);
            }
        }

        log::debug!("Running load hooks of plugin '{}'", name);
        let hooks = async {
            plugin.configure(config.as_ref().unwrap_or(&ConfigData::default())).await?;
            let context = self.contexts.create(name, config.as_ref());
            plugin.load(&context).await
        };
        match hooks.await {
            Ok(()) => {
                self.loaded.write().await.insert(name, plugin);
                LoadOutcome::Loaded
            }
            Err(err) => LoadOutcome::HookFailed(err),
        }
    }

    /// Load every registered plugin, collecting failures instead of stopping.
    ///
    /// A plugin whose dependency failed earlier in the batch is not attempted
    /// and is reported with `DependencyFailed`.
    pub async fn load_all(&self) -> BatchResult {
        let mut batch = BatchResult::default();
        let (order, names) = {
            let registry = self.registry.read().await;
            (resolve_order(&registry.dependency_graph(), None), registry.names())
        };

        let order = match order {
            Ok(order) => order,
            Err(err) => {
                log::error!("Cannot resolve load order: {}", err);
                for name in names {
                    if !self.is_loaded(&name).await {
                        batch.fail(&name, err.clone().into());
                    }
                }
                return batch;
            }
        };

        let mut failed: HashSet<String> = HashSet::new();
        for name in order {
            let dependencies = self.get_plugin_dependencies(&name).await.unwrap_or_default();
            if let Some(dependency) = dependencies.iter().find(|dep| failed.contains(*dep)) {
                let err = Error::from(PluginSystemError::DependencyFailed {
                    name: name.clone(),
                    dependency: dependency.clone(),
                });
                log::warn!("{}", err);
                self.emit_error(&name, LifecycleOperation::Load, &err).await;
                failed.insert(name.clone());
                batch.fail(&name, err);
                continue;
            }

            match self.load(&name).await {
                Ok(()) => batch.successful.push(name),
                Err(err) => {
                    failed.insert(name.clone());
                    batch.fail(&name, err);
                }
            }
        }

        log::info!(
            "Loaded {} plugins, {} failed",
            batch.successful.len(),
            batch.failed.len()
        );
        batch
    }

    /// Unload a loaded plugin that no other loaded plugin depends on.
    pub async fn unload(&self, name: &str) -> Result<()> {
        let guard = self.lock_name(name).await;

        {
            let mut in_flight = self.in_flight.lock().await;
            let registry = self.registry.read().await;
            let loaded = self.loaded.read().await;
            if !loaded.contains(name) {
                return Err(PluginSystemError::not_loaded(name).into());
            }

            let mut dependents: Vec<String> = loaded
                .names()
                .into_iter()
                .chain(in_flight.loading.iter().cloned())
                .filter(|other| other != name)
                .filter(|other| {
                    registry
                        .descriptor(other)
                        .is_some_and(|d| d.depends_on(name))
                })
                .collect();
            if !dependents.is_empty() {
                dependents.sort();
                dependents.dedup();
                return Err(PluginSystemError::InUse {
                    name: name.to_string(),
                    dependents,
                }
                .into());
            }
            in_flight.unloading.insert(name.to_string());
        }

        let plugin = self.loaded.read().await.get(name);
        let result = match plugin {
            Some(plugin) => plugin.unload().await,
            None => Ok(()),
        };

        if result.is_ok() {
            self.loaded.write().await.remove(name);
        }
        self.in_flight.lock().await.unloading.remove(name);
        drop(guard);

        match result {
            Ok(()) => {
                log::info!("Unloaded plugin '{}'", name);
                self.emit(&LifecycleEvent::unloaded(name)).await;
                Ok(())
            }
            Err(err) => {
                log::error!("Failed to unload plugin '{}': {}", name, err);
                self.emit_error(name, LifecycleOperation::Unload, &err).await;
                Err(err)
            }
        }
    }

    /// Unload every loaded plugin, dependents before their dependencies.
    ///
    /// Falls back to reverse load order if the loaded set cannot be resolved.
    pub async fn unload_all(&self) -> BatchResult {
        let loaded = self.get_loaded_plugins().await;
        let graph = self.registry.read().await.dependency_graph_of(&loaded);
        let order = match resolve_order(&graph, None) {
            Ok(order) => order.into_iter().rev().collect::<Vec<_>>(),
            Err(err) => {
                log::warn!("Cannot resolve unload order ({}), using reverse load order", err);
                loaded.into_iter().rev().collect()
            }
        };

        let mut batch = BatchResult::default();
        for name in order {
            match self.unload(&name).await {
                Ok(()) => batch.successful.push(name),
                Err(err) => batch.fail(&name, err),
            }
        }
        log::info!(
            "Unloaded {} plugins, {} failed",
            batch.successful.len(),
            batch.failed.len()
        );
        batch
    }

    /// Loaded and not on its way out
    async fn is_settled(&self, name: &str) -> bool {
        let in_flight = self.in_flight.lock().await;
        !in_flight.unloading.contains(name) && self.loaded.read().await.contains(name)
    }

    async fn lock_name(&self, name: &str) -> OwnedMutexGuard<()> {
        let lock = self
            .in_flight
            .lock()
            .await
            .locks
            .entry(name.to_string())
            .or_default()
            .clone();
        lock.lock_owned().await
    }

    async fn emit(&self, event: &LifecycleEvent) {
        self.events.dispatch(event).await;
    }

    async fn emit_error(&self, name: &str, operation: LifecycleOperation, err: &Error) {
        self.emit(&LifecycleEvent::error(name, operation, &err.to_string()))
            .await;
    }
}

impl fmt::Debug for PluginLifecycleManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginLifecycleManager")
            .field("contexts", &self.contexts)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl KernelComponent for PluginLifecycleManager {
    fn name(&self) -> &'static str {
        "PluginLifecycleManager"
    }

    async fn initialize(&self) -> Result<()> {
        log::info!("Initializing plugin lifecycle manager");
        Ok(())
    }

    async fn start(&self) -> Result<()> {
        let batch = self.load_all().await;
        for failure in &batch.failed {
            log::error!("Plugin '{}' failed to load: {}", failure.name, failure.error);
        }
        Ok(())
    }

    async fn stop(&self) -> Result<()> {
        let batch = self.unload_all().await;
        for failure in &batch.failed {
            log::error!("Plugin '{}' failed to unload: {}", failure.name, failure.error);
        }
        Ok(())
    }
}
