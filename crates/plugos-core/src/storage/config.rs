use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::kernel::error::Result;
use crate::storage::error::StorageSystemError;
use crate::storage::state::{escape_namespace, unescape_namespace};
use crate::storage::StorageProvider;

/// Supported configuration file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// JSON format (.json)
    Json,
    /// YAML format (.yaml, .yml) - requires "yaml-config" feature
    #[cfg(feature = "yaml-config")]
    Yaml,
    /// TOML format (.toml) - requires "toml-config" feature
    #[cfg(feature = "toml-config")]
    Toml,
}

impl ConfigFormat {
    /// Every format compiled into this build, in lookup order
    pub fn enabled() -> Vec<ConfigFormat> {
        let mut formats = vec![ConfigFormat::Json];
        #[cfg(feature = "yaml-config")]
        formats.push(ConfigFormat::Yaml);
        #[cfg(feature = "toml-config")]
        formats.push(ConfigFormat::Toml);
        formats
    }

    /// Get the file extension for this format
    pub fn extension(&self) -> &'static str {
        match self {
            ConfigFormat::Json => "json",
            #[cfg(feature = "yaml-config")]
            ConfigFormat::Yaml => "yaml",
            #[cfg(feature = "toml-config")]
            ConfigFormat::Toml => "toml",
        }
    }

    /// Determine format from file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| match ext.to_lowercase().as_str() {
                "json" => Some(ConfigFormat::Json),
                #[cfg(feature = "yaml-config")]
                "yaml" | "yml" => Some(ConfigFormat::Yaml),
                #[cfg(feature = "toml-config")]
                "toml" => Some(ConfigFormat::Toml),
                _ => None,
            })
    }
}

/// Opaque configuration object handed to a plugin's `configure` hook.
///
/// Values are kept as JSON so any serde type can be stored and read back.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigData {
    #[serde(flatten)]
    values: HashMap<String, serde_json::Value>,
}

impl ConfigData {
    /// Create a new empty configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a configuration from a HashMap
    pub fn from_hashmap(values: HashMap<String, serde_json::Value>) -> Self {
        Self { values }
    }

    /// Get a configuration value
    pub fn get<T: for<'de> Deserialize<'de>>(&self, key: &str) -> Option<T> {
        self.values
            .get(key)
            .and_then(|value| serde_json::from_value(value.clone()).ok())
    }

    /// Get a configuration value with default
    pub fn get_or<T: for<'de> Deserialize<'de>>(&self, key: &str, default: T) -> T {
        self.get(key).unwrap_or(default)
    }

    /// Set a configuration value
    pub fn set<T: Serialize>(&mut self, key: &str, value: T) -> Result<()> {
        let json_value = serde_json::to_value(value)
            .map_err(|e| StorageSystemError::serialization("json", e))?;
        self.values.insert(key.to_string(), json_value);
        Ok(())
    }

    /// Builder-style `set`, for literal values that cannot fail to serialize
    pub fn with(mut self, key: &str, value: serde_json::Value) -> Self {
        self.values.insert(key.to_string(), value);
        self
    }

    /// Remove a configuration value
    pub fn remove(&mut self, key: &str) -> Option<serde_json::Value> {
        self.values.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn keys(&self) -> Vec<String> {
        self.values.keys().cloned().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Merge with another config, overriding existing values
    pub fn merge(&mut self, other: &ConfigData) {
        for (key, value) in &other.values {
            self.values.insert(key.clone(), value.clone());
        }
    }

    /// Serialize to string based on format
    pub fn serialize(&self, format: ConfigFormat) -> Result<String> {
        let serialized = match format {
            ConfigFormat::Json => serde_json::to_string_pretty(&self)
                .map_err(|e| StorageSystemError::serialization("json", e))?,
            #[cfg(feature = "yaml-config")]
            ConfigFormat::Yaml => serde_yaml::to_string(&self)
                .map_err(|e| StorageSystemError::serialization("yaml", e))?,
            #[cfg(feature = "toml-config")]
            ConfigFormat::Toml => toml::to_string_pretty(&self)
                .map_err(|e| StorageSystemError::serialization("toml", e))?,
        };
        Ok(serialized)
    }

    /// Deserialize from string based on format
    pub fn deserialize(data: &str, format: ConfigFormat) -> Result<Self> {
        let config: ConfigData = match format {
            ConfigFormat::Json => serde_json::from_str(data)
                .map_err(|e| StorageSystemError::deserialization("json", e))?,
            #[cfg(feature = "yaml-config")]
            ConfigFormat::Yaml => serde_yaml::from_str(data)
                .map_err(|e| StorageSystemError::deserialization("yaml", e))?,
            #[cfg(feature = "toml-config")]
            ConfigFormat::Toml => toml::from_str(data)
                .map_err(|e| StorageSystemError::deserialization("toml", e))?,
        };
        Ok(config)
    }
}

/// Loads and saves per-plugin configuration files.
///
/// A plugin named `foo` is configured by `<config_dir>/foo.<ext>`; the first
/// enabled format whose file exists wins. File stems are percent-escaped
/// plugin names, so every name stays inside `config_dir`.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    provider: Arc<dyn StorageProvider>,
    config_dir: PathBuf,
    default_format: ConfigFormat,
}

impl ConfigLoader {
    pub fn new(provider: Arc<dyn StorageProvider>, config_dir: PathBuf, default_format: ConfigFormat) -> Self {
        Self {
            provider,
            config_dir,
            default_format,
        }
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn default_format(&self) -> ConfigFormat {
        self.default_format
    }

    /// Path of the configuration file for `plugin_name` in `format`
    pub fn resolve_config_path(&self, plugin_name: &str, format: ConfigFormat) -> PathBuf {
        self.config_dir
            .join(format!("{}.{}", escape_namespace(plugin_name), format.extension()))
    }

    /// Load the configuration of a plugin, `None` when no file exists
    pub fn load_plugin_config(&self, plugin_name: &str) -> Result<Option<ConfigData>> {
        for format in ConfigFormat::enabled() {
            let path = self.resolve_config_path(plugin_name, format);
            if !self.provider.is_file(&path) {
                continue;
            }
            log::debug!("Loading configuration for plugin '{}' from {}", plugin_name, path.display());
            let content = self.provider.read_to_string(&path)?;
            return ConfigData::deserialize(&content, format).map(Some);
        }
        Ok(None)
    }

    /// Save the configuration of a plugin in the default format
    pub fn save_plugin_config(&self, plugin_name: &str, config: &ConfigData) -> Result<()> {
        self.save_plugin_config_as(plugin_name, config, self.default_format)
    }

    pub fn save_plugin_config_as(
        &self,
        plugin_name: &str,
        config: &ConfigData,
        format: ConfigFormat,
    ) -> Result<()> {
        let path = self.resolve_config_path(plugin_name, format);
        let content = config.serialize(format)?;
        self.provider.write_string(&path, &content)
    }

    /// Names of plugins that have a configuration file
    pub fn list_configs(&self) -> Result<Vec<String>> {
        if !self.provider.is_dir(&self.config_dir) {
            return Ok(vec![]);
        }
        let mut names: Vec<String> = self
            .provider
            .read_dir(&self.config_dir)?
            .into_iter()
            .filter(|path| ConfigFormat::from_path(path).is_some())
            .filter_map(|path| path.file_stem().and_then(|stem| stem.to_str()).and_then(unescape_namespace))
            .collect();
        names.sort();
        names.dedup();
        Ok(names)
    }
}
