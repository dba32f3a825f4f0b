use std::sync::Arc;

use async_trait::async_trait;
use tempfile::tempdir;

use crate::kernel::bootstrap::Application;
use crate::kernel::error::Result;
use crate::plugin_system::{Plugin, PluginContext, PluginDescriptor};

/// Writes its own name into its state namespace on load
struct NamingPlugin;

#[async_trait]
impl Plugin for NamingPlugin {
    async fn load(&self, context: &PluginContext) -> Result<()> {
        context.state().save("owner", context.name())?;
        Ok(())
    }
}

#[tokio::test]
async fn test_each_plugin_writes_only_its_namespace() {
    let dir = tempdir().unwrap();
    let mut app = Application::new(dir.path()).unwrap();

    for name in ["alpha", "beta"] {
        app.register_plugin(PluginDescriptor::new(name, "1.0.0", ""), Arc::new(NamingPlugin))
            .await
            .unwrap();
    }
    app.run().await.unwrap();

    for name in ["alpha", "beta"] {
        let state = app.state_store().namespace(name);
        assert_eq!(state.load::<String>("owner").unwrap(), Some(name.to_string()));
        assert_eq!(state.keys().unwrap(), vec!["owner"]);
        assert!(dir.path().join("state").join(name).join("owner.json").is_file());
    }
}
