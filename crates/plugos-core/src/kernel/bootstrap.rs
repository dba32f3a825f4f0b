use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::event::{DefaultEventManager, EventManager};
use crate::kernel::component::{ComponentRegistry, KernelComponent};
use crate::kernel::constants;
use crate::kernel::error::{Error, KernelLifecyclePhase, Result};
use crate::plugin_system::{BatchResult, Plugin, PluginDescriptor, PluginLifecycleManager};
use crate::storage::{ConfigData, ConfigFormat, ConfigLoader, LocalStorageProvider, StateStore, StorageProvider};

/// Main application struct wiring the kernel components together.
///
/// Everything lives under one base directory: plugin state in
/// `<base>/state`, plugin configuration in `<base>/config/plugins`.
/// Storage paths are relative to that base.
pub struct Application {
    base_path: PathBuf,
    running: bool,
    components: ComponentRegistry,
    events: Arc<DefaultEventManager>,
    state_store: Arc<StateStore>,
    config_loader: ConfigLoader,
    plugins: Arc<PluginLifecycleManager>,
}

impl Application {
    /// Creates a new application rooted at `base_path` with default components.
    pub fn new(base_path: impl Into<PathBuf>) -> Result<Self> {
        let base_path = base_path.into();
        log::info!("Initializing {} v{}", constants::APP_NAME, constants::APP_VERSION);

        let provider: Arc<dyn StorageProvider> = Arc::new(LocalStorageProvider::new(base_path.clone()));
        let state_store = Arc::new(StateStore::new(provider.clone(), PathBuf::from(constants::STATE_DIR)));
        let config_loader = ConfigLoader::new(
            provider,
            PathBuf::from(constants::PLUGIN_CONFIG_DIR),
            ConfigFormat::Json,
        );
        log::info!("Using state directory: {}", base_path.join(state_store.root()).display());
        log::info!("Using plugin config directory: {}", base_path.join(config_loader.config_dir()).display());

        let events = Arc::new(DefaultEventManager::new());
        let sink: Arc<dyn EventManager> = events.clone();
        let plugins = Arc::new(PluginLifecycleManager::new(sink, state_store.as_ref().clone()));

        let mut components = ComponentRegistry::new();
        components.register(state_store.clone());
        components.register(events.clone());
        components.register(plugins.clone());

        Ok(Application {
            base_path,
            running: false,
            components,
            events,
            state_store,
            config_loader,
            plugins,
        })
    }

    /// Gets a specific component instance by its concrete type T.
    pub fn get_component<T: KernelComponent>(&self) -> Option<Arc<T>> {
        self.components.get::<T>()
    }

    /// Register a plugin, reading its configuration from the config directory if present
    pub async fn register_plugin(&self, descriptor: PluginDescriptor, plugin: Arc<dyn Plugin>) -> Result<()> {
        let config = self.config_loader.load_plugin_config(&descriptor.name)?;
        self.plugins.register(descriptor, plugin, config).await
    }

    /// Register a plugin with an explicit configuration
    pub async fn register_plugin_with_config(
        &self,
        descriptor: PluginDescriptor,
        plugin: Arc<dyn Plugin>,
        config: ConfigData,
    ) -> Result<()> {
        self.plugins.register(descriptor, plugin, Some(config)).await
    }

    /// Initialize and start every component; starting the plugin manager
    /// loads all registered plugins.
    pub async fn run(&mut self) -> Result<()> {
        if self.running {
            return Err(Error::KernelLifecycleError {
                phase: KernelLifecyclePhase::RunPreCheck,
                component_name: None,
                message: "Application already running".to_string(),
                source: None,
            });
        }

        self.initialize().await?;
        self.start().await?;
        self.running = true;
        log::info!("Application started with {} plugins loaded", self.plugins.get_loaded_plugins().await.len());
        Ok(())
    }

    async fn initialize(&self) -> Result<()> {
        for component in self.components.iter() {
            log::info!("Initializing component: {}", component.name());
            component.initialize().await.map_err(|e| Error::KernelLifecycleError {
                phase: KernelLifecyclePhase::Initialize,
                component_name: Some(component.name().to_string()),
                message: "Component failed to initialize".to_string(),
                source: Some(Box::new(e)),
            })?;
        }
        Ok(())
    }

    async fn start(&self) -> Result<()> {
        for component in self.components.iter() {
            log::info!("Starting component: {}", component.name());
            component.start().await.map_err(|e| Error::KernelLifecycleError {
                phase: KernelLifecyclePhase::Start,
                component_name: Some(component.name().to_string()),
                message: "Component failed to start".to_string(),
                source: Some(Box::new(e)),
            })?;
        }
        Ok(())
    }

    /// Unload all plugins, then stop every component in reverse order.
    ///
    /// Returns the outcome of unloading the plugins.
    pub async fn shutdown(&mut self) -> Result<BatchResult> {
        log::info!("Shutting down components...");
        let unloaded = self.plugins.unload_all().await;

        for component in self.components.iter().rev() {
            log::info!("Stopping component: {}", component.name());
            if let Err(e) = component.stop().await {
                log::error!("Error stopping component {}: {}", component.name(), e);
                return Err(Error::KernelLifecycleError {
                    phase: KernelLifecyclePhase::Shutdown,
                    component_name: Some(component.name().to_string()),
                    message: "Component failed to stop".to_string(),
                    source: Some(Box::new(e)),
                });
            }
        }
        self.running = false;
        log::info!("Component shutdown complete.");
        Ok(unloaded)
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    pub fn event_manager(&self) -> &Arc<DefaultEventManager> {
        &self.events
    }

    pub fn state_store(&self) -> &Arc<StateStore> {
        &self.state_store
    }

    pub fn config_loader(&self) -> &ConfigLoader {
        &self.config_loader
    }

    pub fn plugin_manager(&self) -> &Arc<PluginLifecycleManager> {
        &self.plugins
    }
}
