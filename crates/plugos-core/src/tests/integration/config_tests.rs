use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::json;
use tempfile::tempdir;

use crate::kernel::bootstrap::Application;
use crate::kernel::error::Result;
use crate::plugin_system::{Plugin, PluginDescriptor};
use crate::storage::ConfigData;

struct ConfigProbe {
    seen: Arc<Mutex<Option<ConfigData>>>,
}

#[async_trait]
impl Plugin for ConfigProbe {
    async fn configure(&self, config: &ConfigData) -> Result<()> {
        *self.seen.lock().unwrap() = Some(config.clone());
        Ok(())
    }
}

#[tokio::test]
async fn test_config_file_reaches_configure_hook() {
    let dir = tempdir().unwrap();
    let mut app = Application::new(dir.path()).unwrap();
    let expected = ConfigData::new().with("retries", json!(3));
    app.config_loader().save_plugin_config("greeter", &expected).unwrap();

    let seen = Arc::new(Mutex::new(None));
    app.register_plugin(
        PluginDescriptor::new("greeter", "1.0.0", ""),
        Arc::new(ConfigProbe { seen: seen.clone() }),
    )
    .await
    .unwrap();
    app.run().await.unwrap();

    assert_eq!(*seen.lock().unwrap(), Some(expected));
}

#[tokio::test]
async fn test_plugin_without_config_file_gets_empty_config() {
    let dir = tempdir().unwrap();
    let mut app = Application::new(dir.path()).unwrap();

    let seen = Arc::new(Mutex::new(None));
    app.register_plugin(
        PluginDescriptor::new("greeter", "1.0.0", ""),
        Arc::new(ConfigProbe { seen: seen.clone() }),
    )
    .await
    .unwrap();
    app.run().await.unwrap();

    assert_eq!(*seen.lock().unwrap(), Some(ConfigData::new()));
}
