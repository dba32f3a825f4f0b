//! Runs in its own process: a `log` logger is installed before the plugin
//! loads, so only the tracing subscriber can be taken over.
use std::sync::Arc;

use core_logging::LoggingPlugin;
use plugos_core::kernel::bootstrap::Application;

struct NullLogger;

impl log::Log for NullLogger {
    fn enabled(&self, _metadata: &log::Metadata) -> bool {
        false
    }

    fn log(&self, _record: &log::Record) {}

    fn flush(&self) {}
}

static NULL_LOGGER: NullLogger = NullLogger;

#[tokio::test]
async fn test_subscriber_counts_as_installed_when_log_bridge_fails() {
    log::set_logger(&NULL_LOGGER).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let mut app = Application::new(dir.path()).unwrap();
    let plugin = Arc::new(LoggingPlugin::new());
    app.register_plugin(LoggingPlugin::descriptor(), plugin.clone())
        .await
        .unwrap();

    app.run().await.unwrap();

    assert!(plugin.is_installed());
    assert!(app.plugin_manager().is_loaded(core_logging::PLUGIN_NAME).await);
    app.shutdown().await.unwrap();
}
