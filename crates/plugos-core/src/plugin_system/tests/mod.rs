mod registry_tests;

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::event::{DefaultEventManager, Event, EventManager, EventResult, LifecycleEvent, WILDCARD_EVENT};
use crate::kernel::error::Result;
use crate::plugin_system::context::PluginContext;
use crate::plugin_system::descriptor::PluginDescriptor;
use crate::plugin_system::manager::PluginLifecycleManager;
use crate::plugin_system::traits::{Plugin, PluginError};
use crate::storage::config::ConfigData;
use crate::storage::local::LocalStorageProvider;
use crate::storage::state::StateStore;

/// Shared record of hook calls, in call order
pub(super) type Journal = Arc<Mutex<Vec<String>>>;

pub(super) fn journal() -> Journal {
    Arc::new(Mutex::new(Vec::new()))
}

pub(super) fn entries(journal: &Journal) -> Vec<String> {
    journal.lock().unwrap().clone()
}

/// Plugin that writes every hook call to a journal
pub(super) struct RecordingPlugin {
    name: String,
    journal: Journal,
    fail_configure: bool,
    fail_load: bool,
    fail_unload: bool,
    load_delay: Option<Duration>,
    unload_delay: Option<Duration>,
    configured_with: Mutex<Option<ConfigData>>,
}

impl RecordingPlugin {
    pub fn new(name: &str, journal: &Journal) -> Self {
        Self {
            name: name.to_string(),
            journal: journal.clone(),
            fail_configure: false,
            fail_load: false,
            fail_unload: false,
            load_delay: None,
            unload_delay: None,
            configured_with: Mutex::new(None),
        }
    }

    pub fn failing_configure(mut self) -> Self {
        self.fail_configure = true;
        self
    }

    pub fn failing_load(mut self) -> Self {
        self.fail_load = true;
        self
    }

    pub fn failing_unload(mut self) -> Self {
        self.fail_unload = true;
        self
    }

    pub fn with_load_delay(mut self, millis: u64) -> Self {
        self.load_delay = Some(Duration::from_millis(millis));
        self
    }

    pub fn with_unload_delay(mut self, millis: u64) -> Self {
        self.unload_delay = Some(Duration::from_millis(millis));
        self
    }

    pub fn configured_with(&self) -> Option<ConfigData> {
        self.configured_with.lock().unwrap().clone()
    }

    fn record(&self, entry: &str) {
        self.journal.lock().unwrap().push(format!("{}:{}", entry, self.name));
    }
}

#[async_trait]
impl Plugin for RecordingPlugin {
    async fn configure(&self, config: &ConfigData) -> Result<()> {
        self.record("configure");
        *self.configured_with.lock().unwrap() = Some(config.clone());
        if self.fail_configure {
            return Err(PluginError::ConfigureError(format!("{} rejected its config", self.name)).into());
        }
        Ok(())
    }

    async fn load(&self, _context: &PluginContext) -> Result<()> {
        self.record("load-start");
        if let Some(delay) = self.load_delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_load {
            return Err(PluginError::LoadError(format!("{} failed to load", self.name)).into());
        }
        self.record("load");
        Ok(())
    }

    async fn unload(&self) -> Result<()> {
        if let Some(delay) = self.unload_delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_unload {
            return Err(PluginError::UnloadError(format!("{} failed to unload", self.name)).into());
        }
        self.record("unload");
        Ok(())
    }
}

/// Plugin relying on every default hook
pub(super) struct SilentPlugin;

impl Plugin for SilentPlugin {}

pub(super) fn descriptor(name: &str, dependencies: &[&str]) -> PluginDescriptor {
    PluginDescriptor::new(name, "1.0.0", &format!("{} test plugin", name))
        .with_dependencies(dependencies.iter().copied())
}

pub(super) struct Harness {
    pub manager: Arc<PluginLifecycleManager>,
    pub events: Arc<DefaultEventManager>,
    pub state_store: StateStore,
    pub journal: Journal,
    pub _dir: tempfile::TempDir,
}

impl Harness {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let events = Arc::new(DefaultEventManager::new());
        let state_store = state_store_in(dir.path());
        let sink: Arc<dyn EventManager> = events.clone();
        Self {
            manager: Arc::new(PluginLifecycleManager::new(sink, state_store.clone())),
            events,
            state_store,
            journal: journal(),
            _dir: dir,
        }
    }

    /// Register a recording plugin with the given dependencies
    pub async fn add(&self, name: &str, dependencies: &[&str]) {
        self.add_plugin(name, dependencies, RecordingPlugin::new(name, &self.journal))
            .await;
    }

    pub async fn add_plugin<P: Plugin>(&self, name: &str, dependencies: &[&str], plugin: P) {
        self.manager
            .register(descriptor(name, dependencies), Arc::new(plugin), None)
            .await
            .unwrap();
    }

    pub fn entries(&self) -> Vec<String> {
        entries(&self.journal)
    }
}

pub(super) fn state_store_in(dir: &Path) -> StateStore {
    StateStore::new(
        Arc::new(LocalStorageProvider::new(dir.to_path_buf())),
        PathBuf::from("state"),
    )
}

/// Collect every lifecycle event dispatched through `events`
pub(super) async fn capture_lifecycle_events(events: &DefaultEventManager) -> Arc<Mutex<Vec<LifecycleEvent>>> {
    let captured = Arc::new(Mutex::new(Vec::new()));
    let sink = captured.clone();
    events
        .register_sync_handler(WILDCARD_EVENT, move |event: &dyn Event| {
            if let Some(lifecycle) = event.as_any().downcast_ref::<LifecycleEvent>() {
                sink.lock().unwrap().push(lifecycle.clone());
            }
            EventResult::Continue
        })
        .await;
    captured
}
