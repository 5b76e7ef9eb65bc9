//! Per-device key/value persistence.
//!
//! Values are JSON. Each typed key carries a default and a shape check; a
//! stored value that is missing, malformed, or fails the check reads back as
//! the default instead of an error. Writers are last-write-wins and there is
//! no locking across processes.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::StorageError;
use crate::models::{OnboardingData, RawMoodEntry};

pub trait KeyValueStore: Send {
    fn get_raw(&self, key: &str) -> Result<Option<Value>, StorageError>;
    fn set_raw(&mut self, key: &str, value: Value) -> Result<(), StorageError>;
    fn remove(&mut self, key: &str) -> Result<(), StorageError>;
    fn clear_all(&mut self) -> Result<(), StorageError>;
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    values: HashMap<String, Value>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get_raw(&self, key: &str) -> Result<Option<Value>, StorageError> {
        Ok(self.values.get(key).cloned())
    }

    fn set_raw(&mut self, key: &str, value: Value) -> Result<(), StorageError> {
        self.values.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        self.values.remove(key);
        Ok(())
    }

    fn clear_all(&mut self) -> Result<(), StorageError> {
        self.values.clear();
        Ok(())
    }
}

/// One `<key>.json` file per key inside a data directory.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, StorageError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl KeyValueStore for JsonFileStore {
    fn get_raw(&self, key: &str) -> Result<Option<Value>, StorageError> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        let bytes = fs::read(&path)?;
        Ok(Some(serde_json::from_slice(&bytes)?))
    }

    fn set_raw(&mut self, key: &str, value: Value) -> Result<(), StorageError> {
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(&value)?)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        let path = self.path_for(key);
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }

    fn clear_all(&mut self) -> Result<(), StorageError> {
        if !self.dir.exists() {
            return Ok(());
        }
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                fs::remove_file(path)?;
            }
        }
        Ok(())
    }
}

pub struct StoreKey<T> {
    pub name: &'static str,
    pub default: fn() -> T,
    pub validate: fn(&Value) -> bool,
}

fn is_object(value: &Value) -> bool {
    value.is_object()
}

fn is_array(value: &Value) -> bool {
    value.is_array()
}

fn is_bool(value: &Value) -> bool {
    value.is_boolean()
}

pub mod keys {
    use super::*;

    pub const ONBOARDING: StoreKey<OnboardingData> = StoreKey {
        name: "onboarding",
        default: OnboardingData::default,
        validate: is_object,
    };

    pub const ONBOARDING_DRAFT: StoreKey<OnboardingData> = StoreKey {
        name: "onboarding_draft",
        default: OnboardingData::default,
        validate: is_object,
    };

    pub const ONBOARDING_COMPLETED: StoreKey<bool> = StoreKey {
        name: "onboarding_completed",
        default: || false,
        validate: is_bool,
    };

    pub const MOOD_LOGS: StoreKey<Vec<RawMoodEntry>> = StoreKey {
        name: "mood_logs",
        default: Vec::new,
        validate: is_array,
    };
}

/// Typed access on top of a [`KeyValueStore`] backend.
pub struct Persistence {
    backend: Box<dyn KeyValueStore>,
}

impl Persistence {
    pub fn new(backend: impl KeyValueStore + 'static) -> Self {
        Self { backend: Box::new(backend) }
    }

    pub fn in_memory() -> Self {
        Self::new(MemoryStore::new())
    }

    pub fn get<T: DeserializeOwned>(&self, key: &StoreKey<T>) -> T {
        let raw = match self.backend.get_raw(key.name) {
            Ok(Some(raw)) => raw,
            Ok(None) => return (key.default)(),
            Err(e) => {
                tracing::warn!("⚠️ Could not read {}: {}", key.name, e);
                return (key.default)();
            }
        };

        if !(key.validate)(&raw) {
            tracing::warn!("⚠️ Stored {} has an unexpected shape, using default", key.name);
            return (key.default)();
        }

        serde_json::from_value(raw).unwrap_or_else(|e| {
            tracing::warn!("⚠️ Stored {} could not be decoded ({}), using default", key.name, e);
            (key.default)()
        })
    }

    pub fn set<T: Serialize>(&mut self, key: &StoreKey<T>, value: &T) -> Result<(), StorageError> {
        let value = serde_json::to_value(value)?;
        self.backend.set_raw(key.name, value)
    }

    /// Shallow-merges the fields of `partial` into the stored object (or the
    /// key's default when nothing valid is stored) and returns the result.
    pub fn merge<T: Serialize + DeserializeOwned>(
        &mut self,
        key: &StoreKey<T>,
        partial: Value,
    ) -> Result<T, StorageError> {
        let current = serde_json::to_value(self.get(key))?;
        let merged = match (current, partial) {
            (Value::Object(mut base), Value::Object(patch)) => {
                base.extend(patch);
                Value::Object(base)
            }
            (_, patch) => patch,
        };
        let value: T = serde_json::from_value(merged)?;
        self.set(key, &value)?;
        Ok(value)
    }

    pub fn remove<T>(&mut self, key: &StoreKey<T>) -> Result<(), StorageError> {
        self.backend.remove(key.name)
    }

    pub fn clear_all(&mut self) -> Result<(), StorageError> {
        self.backend.clear_all()
    }
}
