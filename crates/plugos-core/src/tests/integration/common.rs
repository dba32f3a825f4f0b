use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::event::{Event, EventResult, LifecycleEvent, PluginEvent, WILDCARD_EVENT};
use crate::kernel::bootstrap::Application;
use crate::kernel::error::Result;
use crate::plugin_system::{Plugin, PluginContext, PluginDescriptor, PluginError};
use crate::storage::ConfigData;

// ===== MOCK PLUGINS =====

/// A plugin that records its hooks into a shared, ordered log
pub struct TracePlugin {
    name: String,
    trace: Arc<Mutex<Vec<String>>>,
    fail_on_load: bool,
}

impl TracePlugin {
    pub fn new(name: &str, trace: &Arc<Mutex<Vec<String>>>) -> Self {
        Self {
            name: name.to_string(),
            trace: trace.clone(),
            fail_on_load: false,
        }
    }

    pub fn failing(mut self) -> Self {
        self.fail_on_load = true;
        self
    }
}

#[async_trait]
impl Plugin for TracePlugin {
    async fn configure(&self, _config: &ConfigData) -> Result<()> {
        self.trace.lock().unwrap().push(format!("{}::configure", self.name));
        Ok(())
    }

    async fn load(&self, context: &PluginContext) -> Result<()> {
        if self.fail_on_load {
            return Err(PluginError::LoadError(format!("{} refused to start", self.name)).into());
        }
        self.trace.lock().unwrap().push(format!("{}::load", self.name));
        context
            .publish(&PluginEvent::new(
                &format!("{}.ready", self.name),
                &self.name,
                serde_json::json!({}),
            ))
            .await;
        Ok(())
    }

    async fn unload(&self) -> Result<()> {
        self.trace.lock().unwrap().push(format!("{}::unload", self.name));
        Ok(())
    }
}

/// Register a trace plugin on the application
pub async fn register_trace(
    app: &Application,
    name: &str,
    dependencies: &[&str],
    plugin: TracePlugin,
) {
    let descriptor = PluginDescriptor::new(name, "1.0.0", "integration test plugin")
        .with_dependencies(dependencies.iter().copied());
    app.register_plugin(descriptor, Arc::new(plugin)).await.unwrap();
}

/// Every event name dispatched through the application's event manager
pub async fn record_event_names(app: &Application) -> Arc<Mutex<Vec<String>>> {
    let names = Arc::new(Mutex::new(Vec::new()));
    let sink = names.clone();
    app.event_manager()
        .register_sync_handler(WILDCARD_EVENT, move |event: &dyn Event| {
            let label = match event.as_any().downcast_ref::<LifecycleEvent>() {
                Some(lifecycle) => format!("{}:{}", event.name(), lifecycle.plugin_name().unwrap_or("?")),
                None => event.name().to_string(),
            };
            sink.lock().unwrap().push(label);
            EventResult::Continue
        })
        .await;
    names
}
