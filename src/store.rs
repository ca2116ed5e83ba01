//! Key-value persistence for the registry and preferences.
//!
//! The registry is always written whole under [`REGISTRY_KEY`]. Loading never
//! fails: a missing, unreadable or unparsable value yields an empty registry.

use crate::error::StorageError;
use crate::registry::Registry;
use crate::types::RegistryRecord;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, warn};

/// Key under which the whole registry is stored.
pub const REGISTRY_KEY: &str = "treeflow_projects";

/// Durable key-value store.
pub trait Storage: Send {
    /// Read the value stored under `key`, or `None` if nothing is stored.
    fn read(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Replace the value stored under `key`.
    fn write(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// Stores each key as `<dir>/<key>.json`.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl Storage for FileStorage {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::Io {
                key: key.to_string(),
                source,
            }),
        }
    }

    /// Write to a sibling temp file, then rename it over the target so a
    /// reader never sees a partial value.
    fn write(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        let io_err = |source| StorageError::Io {
            key: key.to_string(),
            source,
        };

        fs::create_dir_all(&self.dir).map_err(io_err)?;
        let target = self.path_for(key);
        let tmp = self.dir.join(format!(".{}.json.tmp", key));
        fs::write(&tmp, value).map_err(io_err)?;
        if let Err(e) = fs::rename(&tmp, &target) {
            let _ = fs::remove_file(&tmp);
            return Err(io_err(e));
        }
        debug!(path = %target.display(), bytes = value.len(), "Wrote storage key");
        Ok(())
    }
}

/// In-memory store. Clones share the same entries.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value under `key`.
    pub fn get(&self, key: &str) -> Option<String> {
        self.lock().get(key).cloned()
    }

    /// Seed a raw value, bypassing any encoding.
    pub fn insert(&self, key: impl Into<String>, value: impl Into<String>) {
        self.lock().insert(key.into(), value.into());
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Storage for MemoryStorage {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.get(key))
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.insert(key, value);
        Ok(())
    }
}

/// Load the registry, degrading to an empty one on any problem.
pub fn load_registry(storage: &dyn Storage) -> Registry {
    let raw = match storage.read(REGISTRY_KEY) {
        Ok(Some(raw)) if !raw.trim().is_empty() => raw,
        Ok(_) => {
            debug!("No stored registry, starting empty");
            return Registry::new();
        }
        Err(e) => {
            warn!(error = %e, "Failed to read registry, starting empty");
            return Registry::new();
        }
    };

    match parse_registry(&raw) {
        Ok(record) => Registry::from_record(record),
        Err(e) => {
            warn!(error = %e, "Stored registry is corrupt, starting empty");
            Registry::new()
        }
    }
}

/// Decode a stored registry. Each tree level nests two JSON levels, so the
/// parser's recursion limit is lifted and deep trees grow the stack on demand.
fn parse_registry(raw: &str) -> Result<RegistryRecord, serde_json::Error> {
    let mut de = serde_json::Deserializer::from_str(raw);
    de.disable_recursion_limit();
    let record = RegistryRecord::deserialize(serde_stacker::Deserializer::new(&mut de))?;
    de.end()?;
    Ok(record)
}

/// Persist the whole registry.
pub fn save_registry(storage: &mut dyn Storage, registry: &Registry) -> Result<(), StorageError> {
    let json =
        serde_json::to_string(&registry.to_record()).map_err(|source| StorageError::Serialize {
            key: REGISTRY_KEY.to_string(),
            source,
        })?;
    storage.write(REGISTRY_KEY, &json)
}
