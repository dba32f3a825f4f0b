use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::kernel::component::KernelComponent;
use crate::kernel::error::Result;
use crate::storage::error::StorageSystemError;
use crate::storage::provider::StorageProvider;

const STATE_FILE_EXTENSION: &str = "json";

/// File-backed key/value store partitioned into per-plugin namespaces.
///
/// Each value lives in `<root>/<namespace>/<key>.json`.
#[derive(Clone)]
pub struct StateStore {
    provider: Arc<dyn StorageProvider>,
    root: PathBuf,
}

impl StateStore {
    pub fn new(provider: Arc<dyn StorageProvider>, root: PathBuf) -> Self {
        Self { provider, root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Handle bound to one namespace. The handle cannot reach other namespaces.
    pub fn namespace(&self, namespace: &str) -> PluginState {
        PluginState {
            provider: self.provider.clone(),
            namespace: namespace.to_string(),
            dir: self.root.join(escape_namespace(namespace)),
        }
    }
}

impl fmt::Debug for StateStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateStore")
            .field("provider", &self.provider.name())
            .field("root", &self.root)
            .finish()
    }
}

#[async_trait]
impl KernelComponent for StateStore {
    fn name(&self) -> &'static str {
        "StateStore"
    }

    async fn initialize(&self) -> Result<()> {
        self.provider.create_dir_all(&self.root)
    }

    async fn start(&self) -> Result<()> {
        Ok(())
    }

    async fn stop(&self) -> Result<()> {
        Ok(())
    }
}

/// State access handle pre-scoped to a single plugin
#[derive(Clone)]
pub struct PluginState {
    provider: Arc<dyn StorageProvider>,
    namespace: String,
    dir: PathBuf,
}

impl PluginState {
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Persist `value` under `key`, replacing any previous value
    pub fn save<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let path = self.key_path(key)?;
        let content = serde_json::to_string_pretty(value)
            .map_err(|e| StorageSystemError::serialization("json", e))?;
        self.provider.write_string(&path, &content)
    }

    /// Read the value stored under `key`, `None` if nothing was saved
    pub fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let path = self.key_path(key)?;
        if !self.provider.is_file(&path) {
            return Ok(None);
        }
        let content = self.provider.read_to_string(&path)?;
        let value = serde_json::from_str(&content)
            .map_err(|e| StorageSystemError::deserialization("json", e))?;
        Ok(Some(value))
    }

    pub fn exists(&self, key: &str) -> Result<bool> {
        let path = self.key_path(key)?;
        Ok(self.provider.is_file(&path))
    }

    /// Remove one key; removing a missing key is not an error
    pub fn remove(&self, key: &str) -> Result<()> {
        let path = self.key_path(key)?;
        if self.provider.is_file(&path) {
            self.provider.remove_file(&path)?;
        }
        Ok(())
    }

    /// Remove every key of this namespace
    pub fn clear(&self) -> Result<()> {
        if self.provider.is_dir(&self.dir) {
            self.provider.remove_dir_all(&self.dir)?;
        }
        Ok(())
    }

    /// Stored keys, sorted
    pub fn keys(&self) -> Result<Vec<String>> {
        if !self.provider.is_dir(&self.dir) {
            return Ok(vec![]);
        }
        let mut keys: Vec<String> = self
            .provider
            .read_dir(&self.dir)?
            .into_iter()
            .filter(|path| path.extension().and_then(|ext| ext.to_str()) == Some(STATE_FILE_EXTENSION))
            .filter_map(|path| path.file_stem().and_then(|stem| stem.to_str().map(String::from)))
            .collect();
        keys.sort();
        Ok(keys)
    }

    fn key_path(&self, key: &str) -> Result<PathBuf> {
        validate_key(&self.namespace, key)?;
        Ok(self.dir.join(format!("{}.{}", key, STATE_FILE_EXTENSION)))
    }
}

impl fmt::Debug for PluginState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginState")
            .field("namespace", &self.namespace)
            .field("dir", &self.dir)
            .finish()
    }
}

fn validate_key(namespace: &str, key: &str) -> Result<()> {
    let reason = if key.is_empty() {
        Some("key is empty")
    } else if key.starts_with('.') {
        Some("key starts with '.'")
    } else if !key.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')) {
        Some("key may only contain ASCII letters, digits, '-', '_' and '.'")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(StorageSystemError::InvalidKey {
            namespace: namespace.to_string(),
            key: key.to_string(),
            reason: reason.to_string(),
        }
        .into()),
        None => Ok(()),
    }
}

/// Percent-escapes everything outside `[A-Za-z0-9_-]` so that distinct
/// namespaces always map to distinct single directory names.
pub(crate) fn escape_namespace(namespace: &str) -> String {
    let mut escaped = String::with_capacity(namespace.len());
    for byte in namespace.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'_' {
            escaped.push(byte as char);
        } else {
            escaped.push_str(&format!("%{:02X}", byte));
        }
    }
    if escaped.is_empty() {
        escaped.push('%');
    }
    escaped
}

/// Inverse of [`escape_namespace`], `None` for names it cannot produce.
pub(crate) fn unescape_namespace(escaped: &str) -> Option<String> {
    if escaped == "%" {
        return Some(String::new());
    }
    let bytes = escaped.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = escaped.get(i + 1..i + 3)?;
            decoded.push(u8::from_str_radix(hex, 16).ok()?);
            i += 3;
        } else {
            decoded.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(decoded).ok()
}
