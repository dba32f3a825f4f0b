//! # Core Logging Plugin
//!
//! Installs the process-wide `tracing` subscriber when loaded and bridges
//! records emitted through the `log` facade into it, so the core's `log`
//! output and every plugin logger end up in one place.
//!
//! Configuration keys:
//!
//! - `level`: an env-filter directive such as `info` or `info,plugos_core=debug`
//! - `format`: `text` (default) or `json`
//! - `with_target`: whether to print the record target (default `true`)
//!
//! `RUST_LOG`, when set, takes precedence over `level`.
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{fmt, EnvFilter};

use plugos_core::kernel::error::Result;
use plugos_core::plugin_system::{Plugin, PluginContext, PluginDescriptor, PluginError};
use plugos_core::storage::ConfigData;

pub const PLUGIN_NAME: &str = "core-logging";

/// Output format of the installed subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingSettings {
    pub level: String,
    pub format: LogFormat,
    pub with_target: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Text,
            with_target: true,
        }
    }
}

impl LoggingSettings {
    /// Read settings from a plugin configuration, falling back to defaults per key
    pub fn from_config(config: &ConfigData) -> Result<Self> {
        let defaults = Self::default();

        let level: String = config.get_or("level", defaults.level);
        EnvFilter::try_new(&level).map_err(|e| {
            PluginError::ConfigureError(format!("invalid log level '{}': {}", level, e))
        })?;

        let format = match config.get::<String>("format") {
            None => defaults.format,
            Some(raw) => match raw.to_lowercase().as_str() {
                "text" => LogFormat::Text,
                "json" => LogFormat::Json,
                _ => {
                    return Err(PluginError::ConfigureError(format!(
                        "unknown log format '{}', expected 'text' or 'json'",
                        raw
                    ))
                    .into());
                }
            },
        };

        Ok(Self {
            level,
            format,
            with_target: config.get_or("with_target", defaults.with_target),
        })
    }

    fn filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.level))
    }
}

/// Plugin that owns the global log subscriber
#[derive(Debug, Default)]
pub struct LoggingPlugin {
    settings: RwLock<LoggingSettings>,
    installed: AtomicBool,
}

impl LoggingPlugin {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn descriptor() -> PluginDescriptor {
        PluginDescriptor::new(
            PLUGIN_NAME,
            env!("CARGO_PKG_VERSION"),
            "Installs the process-wide log subscriber",
        )
    }

    /// Settings applied by the last `configure`
    pub fn settings(&self) -> LoggingSettings {
        match self.settings.read() {
            Ok(settings) => settings.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Whether this instance installed the global subscriber
    pub fn is_installed(&self) -> bool {
        self.installed.load(Ordering::SeqCst)
    }

    fn install_subscriber(settings: &LoggingSettings) -> std::result::Result<(), String> {
        let registry = tracing_subscriber::registry().with(settings.filter());
        let installed = match settings.format {
            LogFormat::Json => tracing::subscriber::set_global_default(
                registry.with(fmt::layer().json().with_target(settings.with_target)),
            ),
            LogFormat::Text => tracing::subscriber::set_global_default(
                registry.with(fmt::layer().with_target(settings.with_target)),
            ),
        };
        installed.map_err(|e| e.to_string())
    }
}

#[async_trait]
impl Plugin for LoggingPlugin {
    async fn configure(&self, config: &ConfigData) -> Result<()> {
        let parsed = LoggingSettings::from_config(config)?;
        let mut settings = self
            .settings
            .write()
            .map_err(|_| PluginError::ConfigureError("settings lock poisoned".to_string()))?;
        *settings = parsed;
        Ok(())
    }

    async fn load(&self, context: &PluginContext) -> Result<()> {
        let settings = self.settings();
        if let Err(e) = Self::install_subscriber(&settings) {
            // Another subscriber already owns the process; keep it.
            context
                .logger()
                .warn(format_args!("Keeping the existing global subscriber: {}", e));
            return Ok(());
        }
        self.installed.store(true, Ordering::SeqCst);

        if let Err(e) = tracing_log::LogTracer::init() {
            context
                .logger()
                .warn(format_args!("Records from the log facade are not forwarded: {}", e));
        }
        tracing::info!(level = %settings.level, format = ?settings.format, "Log subscriber installed");
        Ok(())
    }

    async fn unload(&self) -> Result<()> {
        if self.is_installed() {
            log::debug!("The global log subscriber stays installed until the process exits");
        }
        Ok(())
    }
}
