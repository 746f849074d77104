//! License token persistence.
//!
//! The token lives under a single value name in an application-scoped
//! key-value store. The store is only read once and written at most once per
//! evaluation.

use crate::error::{LicenseError, LicenseResult};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Value name the license token is stored under.
pub const LICENSE_VALUE_NAME: &str = "LicenseKey";

const STORE_FILE_NAME: &str = "license.json";

/// String key-value persistence.
pub trait KeyValueStore {
    /// Reads a value. Absent values are `Ok(None)`.
    fn get(&self, name: &str) -> LicenseResult<Option<String>>;

    /// Writes a value, replacing any previous one.
    fn set(&self, name: &str, value: &str) -> LicenseResult<()>;
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for &T {
    fn get(&self, name: &str) -> LicenseResult<Option<String>> {
        (**self).get(name)
    }

    fn set(&self, name: &str, value: &str) -> LicenseResult<()> {
        (**self).set(name, value)
    }
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for Arc<T> {
    fn get(&self, name: &str) -> LicenseResult<Option<String>> {
        (**self).get(name)
    }

    fn set(&self, name: &str, value: &str) -> LicenseResult<()> {
        (**self).set(name, value)
    }
}

/// In-process store; nothing survives the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store already holding `value` under `name`.
    pub fn with_value(name: impl Into<String>, value: impl Into<String>) -> Self {
        let store = Self::new();
        store
            .values
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(name.into(), value.into());
        store
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, name: &str) -> LicenseResult<Option<String>> {
        let values = self
            .values
            .lock()
            .map_err(|_| LicenseError::Storage("memory store poisoned".to_string()))?;
        Ok(values.get(name).cloned())
    }

    fn set(&self, name: &str, value: &str) -> LicenseResult<()> {
        let mut values = self
            .values
            .lock()
            .map_err(|_| LicenseError::Storage("memory store poisoned".to_string()))?;
        values.insert(name.to_string(), value.to_string());
        Ok(())
    }
}

/// JSON file store, one file per application namespace.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    /// Opens the store for `namespace` under the platform config directory.
    ///
    /// # Errors
    ///
    /// Returns [`LicenseError::Storage`] if the platform has no config
    /// directory.
    pub fn for_namespace(namespace: &str) -> LicenseResult<Self> {
        let base = dirs::config_dir().ok_or_else(|| {
            LicenseError::Storage("no configuration directory on this platform".to_string())
        })?;
        Ok(Self::at(base.join(namespace).join(STORE_FILE_NAME)))
    }

    /// Uses an explicit file path.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> LicenseResult<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let contents = fs::read_to_string(&self.path)
            .map_err(|e| LicenseError::Storage(format!("reading {}: {e}", self.path.display())))?;
        Ok(serde_json::from_str(&contents)?)
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, name: &str) -> LicenseResult<Option<String>> {
        Ok(self.load()?.remove(name))
    }

    fn set(&self, name: &str, value: &str) -> LicenseResult<()> {
        let mut values = self.load()?;
        values.insert(name.to_string(), value.to_string());

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                LicenseError::Storage(format!("creating {}: {e}", parent.display()))
            })?;
        }
        let json = serde_json::to_string_pretty(&values)?;
        fs::write(&self.path, json)
            .map_err(|e| LicenseError::Storage(format!("writing {}: {e}", self.path.display())))
    }
}
