/// Application name
pub const APP_NAME: &str = "Plugos";

/// Application version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// `metadata.source` of every lifecycle event
pub const LIFECYCLE_EVENT_SOURCE: &str = "plugin-lifecycle-manager";

/// Directory under the application base holding plugin state
pub const STATE_DIR: &str = "state";

/// Directory under the application base holding plugin configuration files
pub const PLUGIN_CONFIG_DIR: &str = "config/plugins";
