use std::any::Any;
use std::fmt;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::event::{Event, EventManager, EventResult};
use crate::kernel::error::Result;
use crate::plugin_system::error::PluginSystemError;
use crate::plugin_system::registry::LoadedPlugins;
use crate::plugin_system::traits::Plugin;
use crate::storage::config::ConfigData;
use crate::storage::state::{PluginState, StateStore};

/// Logger handed to a plugin, prefixing every message with the plugin name.
///
/// Records go to the `log` facade under the target `plugin::<name>`, so
/// they can be filtered per plugin.
#[derive(Debug, Clone)]
pub struct PluginLogger {
    name: String,
    target: String,
}

impl PluginLogger {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            target: format!("plugin::{}", name),
        }
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn log(&self, level: log::Level, message: impl fmt::Display) {
        log::log!(target: &self.target, level, "[{}] {}", self.name, message);
    }

    pub fn error(&self, message: impl fmt::Display) {
        self.log(log::Level::Error, message);
    }

    pub fn warn(&self, message: impl fmt::Display) {
        self.log(log::Level::Warn, message);
    }

    pub fn info(&self, message: impl fmt::Display) {
        self.log(log::Level::Info, message);
    }

    pub fn debug(&self, message: impl fmt::Display) {
        self.log(log::Level::Debug, message);
    }

    pub fn trace(&self, message: impl fmt::Display) {
        self.log(log::Level::Trace, message);
    }
}

/// Capabilities handed to a plugin's `load` hook.
///
/// The context only reaches the event sink, the plugin's own state
/// namespace and configuration, and the set of loaded plugins. There is
/// no other route from one plugin to another.
#[derive(Clone)]
pub struct PluginContext {
    name: String,
    events: Arc<dyn EventManager>,
    state: PluginState,
    config: ConfigData,
    logger: PluginLogger,
    loaded: Arc<RwLock<LoadedPlugins>>,
}

impl PluginContext {
    /// Name of the plugin this context was built for
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Shared event sink
    pub fn events(&self) -> &Arc<dyn EventManager> {
        &self.events
    }

    /// State handle scoped to this plugin's namespace
    pub fn state(&self) -> &PluginState {
        &self.state
    }

    pub fn config(&self) -> &ConfigData {
        &self.config
    }

    pub fn logger(&self) -> &PluginLogger {
        &self.logger
    }

    /// Look up another plugin among the currently loaded ones.
    pub async fn get_plugin(&self, name: &str) -> Result<Arc<dyn Plugin>> {
        self.loaded
            .read()
            .await
            .get(name)
            .ok_or_else(|| PluginSystemError::not_loaded(name).into())
    }

    /// Typed variant of [`get_plugin`](Self::get_plugin).
    ///
    /// Fails with `NotFound` when the plugin is not loaded or is not a `T`.
    pub async fn get_plugin_as<T: Plugin>(&self, name: &str) -> Result<Arc<T>> {
        let plugin = self.get_plugin(name).await?;
        let any: Arc<dyn Any + Send + Sync> = plugin;
        Arc::downcast::<T>(any).map_err(|_| PluginSystemError::not_loaded(name).into())
    }

    /// Dispatch an event through the shared sink
    pub async fn publish(&self, event: &dyn Event) -> EventResult {
        self.events.dispatch(event).await
    }
}

impl fmt::Debug for PluginContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginContext")
            .field("name", &self.name)
            .field("state", &self.state)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Builds [`PluginContext`]s from the collaborators shared by all plugins.
#[derive(Clone)]
pub struct CapabilityContextFactory {
    events: Arc<dyn EventManager>,
    state_store: StateStore,
    loaded: Arc<RwLock<LoadedPlugins>>,
}

impl CapabilityContextFactory {
    pub fn new(
        events: Arc<dyn EventManager>,
        state_store: StateStore,
        loaded: Arc<RwLock<LoadedPlugins>>,
    ) -> Self {
        Self {
            events,
            state_store,
            loaded,
        }
    }

    pub fn create(&self, name: &str, config: Option<&ConfigData>) -> PluginContext {
        PluginContext {
            name: name.to_string(),
            events: self.events.clone(),
            state: self.state_store.namespace(name),
            config: config.cloned().unwrap_or_default(),
            logger: PluginLogger::new(name),
            loaded: self.loaded.clone(),
        }
    }
}

impl fmt::Debug for CapabilityContextFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CapabilityContextFactory")
            .field("state_store", &self.state_store)
            .finish_non_exhaustive()
    }
}
