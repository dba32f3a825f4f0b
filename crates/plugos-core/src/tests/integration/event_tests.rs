use std::sync::{Arc, Mutex};

use tempfile::tempdir;

use super::common::{record_event_names, register_trace, TracePlugin};
use crate::kernel::bootstrap::Application;

#[tokio::test]
async fn test_lifecycle_events_in_order() {
    let dir = tempdir().unwrap();
    let mut app = Application::new(dir.path()).unwrap();
    let trace = Arc::new(Mutex::new(Vec::new()));
    let names = record_event_names(&app).await;

    register_trace(&app, "log", &[], TracePlugin::new("log", &trace)).await;
    register_trace(&app, "db", &["log"], TracePlugin::new("db", &trace)).await;
    app.run().await.unwrap();
    app.shutdown().await.unwrap();

    assert_eq!(
        *names.lock().unwrap(),
        vec![
            "plugin.registered:log",
            "plugin.registered:db",
            "log.ready",
            "plugin.loaded:log",
            "db.ready",
            "plugin.loaded:db",
            "plugin.unloaded:db",
            "plugin.unloaded:log",
        ]
    );
}

#[tokio::test]
async fn test_error_event_for_failing_plugin() {
    let dir = tempdir().unwrap();
    let mut app = Application::new(dir.path()).unwrap();
    let trace = Arc::new(Mutex::new(Vec::new()));

    register_trace(&app, "broken", &[], TracePlugin::new("broken", &trace).failing()).await;
    let names = record_event_names(&app).await;
    app.run().await.unwrap();

    assert_eq!(*names.lock().unwrap(), vec!["plugin.error:broken"]);
}
