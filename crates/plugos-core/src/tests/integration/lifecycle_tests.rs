use std::sync::{Arc, Mutex};

use tempfile::tempdir;

use super::common::{register_trace, TracePlugin};
use crate::kernel::bootstrap::Application;
use crate::plugin_system::PluginSystemError;

fn trace() -> Arc<Mutex<Vec<String>>> {
    Arc::new(Mutex::new(Vec::new()))
}

#[tokio::test]
async fn test_full_lifecycle_respects_dependencies() {
    let dir = tempdir().unwrap();
    let mut app = Application::new(dir.path()).unwrap();
    let trace = trace();

    // Registered dependents first on purpose
    register_trace(&app, "api", &["db", "log"], TracePlugin::new("api", &trace)).await;
    register_trace(&app, "db", &["log"], TracePlugin::new("db", &trace)).await;
    register_trace(&app, "log", &[], TracePlugin::new("log", &trace)).await;

    app.run().await.unwrap();
    app.shutdown().await.unwrap();

    assert_eq!(
        *trace.lock().unwrap(),
        vec![
            "log::configure",
            "log::load",
            "db::configure",
            "db::load",
            "api::configure",
            "api::load",
            "api::unload",
            "db::unload",
            "log::unload",
        ]
    );
}

#[tokio::test]
async fn test_failing_plugin_does_not_block_unrelated_ones() {
    let dir = tempdir().unwrap();
    let mut app = Application::new(dir.path()).unwrap();
    let trace = trace();

    register_trace(&app, "broken", &[], TracePlugin::new("broken", &trace).failing()).await;
    register_trace(&app, "needs-broken", &["broken"], TracePlugin::new("needs-broken", &trace)).await;
    register_trace(&app, "healthy", &[], TracePlugin::new("healthy", &trace)).await;

    app.run().await.unwrap();

    let manager = app.plugin_manager();
    assert_eq!(manager.get_loaded_plugins().await, vec!["healthy"]);

    let batch = manager.load_all().await;
    assert_eq!(batch.successful, vec!["healthy"]);
    assert!(matches!(
        batch.failure("needs-broken").unwrap().error.as_plugin_system(),
        Some(PluginSystemError::DependencyFailed { .. })
    ));
}

#[tokio::test]
async fn test_manual_unload_and_reload() {
    let dir = tempdir().unwrap();
    let mut app = Application::new(dir.path()).unwrap();
    let trace = trace();

    register_trace(&app, "log", &[], TracePlugin::new("log", &trace)).await;
    register_trace(&app, "db", &["log"], TracePlugin::new("db", &trace)).await;
    app.run().await.unwrap();

    let manager = app.plugin_manager();
    assert!(manager.unload("log").await.is_err());
    manager.unload("db").await.unwrap();
    manager.unload("log").await.unwrap();
    manager.load("db").await.unwrap();

    assert_eq!(manager.get_loaded_plugins().await, vec!["log", "db"]);
    let loads = trace
        .lock()
        .unwrap()
        .iter()
        .filter(|entry| entry.as_str() == "log::load")
        .count();
    assert_eq!(loads, 2);
}
