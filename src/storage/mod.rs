//! Key-value persistence host and the two collections kept in it.
//!
//! Every collection is a JSON array stored under one key. Reads never fail:
//! a missing, unreadable or corrupted collection comes back as
//! [`Loaded::Empty`] with the reason attached. Writes return errors so the
//! stores can log them and carry on.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::error::StorageError;

pub mod packs;
pub mod saves;

pub use packs::PackStore;
pub use saves::SaveStore;

pub const PACKS_KEY: &str = "jeopardy_packs";
pub const SAVES_KEY: &str = "jeopardy_saves";

/// String values under string keys.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// One `<key>.json` file per key under a data directory.
#[derive(Debug, Clone)]
pub struct DirStore {
    root: PathBuf,
}

impl DirStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.json"))
    }

    fn temp_path(&self, key: &str) -> PathBuf {
        self.root.join(format!(".{key}.json.tmp"))
    }
}

impl KeyValueStore for DirStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(self.path(key)) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Writes through a temp file and renames it over the target.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        fs::create_dir_all(&self.root)?;

        let tmp_path = self.temp_path(key);
        let mut tmp = File::create(&tmp_path)?;
        tmp.write_all(value.as_bytes())?;
        tmp.sync_all()?;
        drop(tmp);

        fs::rename(&tmp_path, self.path(key))?;
        debug!(key, bytes = value.len(), "stored value");
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        match fs::remove_file(self.path(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-process store, used by tests and `--ephemeral` runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>, StorageError> {
        self.values
            .lock()
            .map_err(|_| StorageError::Unavailable("memory store lock poisoned".to_string()))
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.lock()?.remove(key);
        Ok(())
    }
}

/// Why a collection read produced nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmptyReason {
    /// Nothing has been stored under the key yet.
    Missing,
    /// The host could not be read.
    Unavailable(String),
    /// Stored data did not parse.
    Corrupt(String),
}

/// Outcome of reading a collection.
#[derive(Debug, Clone, PartialEq)]
pub enum Loaded<T> {
    Found(Vec<T>),
    Empty(EmptyReason),
}

impl<T> Loaded<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            Loaded::Found(items) => items,
            Loaded::Empty(_) => Vec::new(),
        }
    }

    /// Reason the read came back empty, if it did.
    pub fn empty_reason(&self) -> Option<&EmptyReason> {
        match self {
            Loaded::Found(_) => None,
            Loaded::Empty(reason) => Some(reason),
        }
    }
}

pub(crate) fn read_collection<T: DeserializeOwned>(kv: &dyn KeyValueStore, key: &str) -> Loaded<T> {
    let text = match kv.get(key) {
        Ok(Some(text)) => text,
        Ok(None) => return Loaded::Empty(EmptyReason::Missing),
        Err(e) => {
            warn!(key, error = %e, "storage unavailable, using empty collection");
            return Loaded::Empty(EmptyReason::Unavailable(e.to_string()));
        }
    };

    match serde_json::from_str(&text) {
        Ok(items) => Loaded::Found(items),
        Err(e) => {
            warn!(key, error = %e, "stored collection is corrupted, using empty collection");
            Loaded::Empty(EmptyReason::Corrupt(e.to_string()))
        }
    }
}

pub(crate) fn write_collection<T: Serialize>(
    kv: &dyn KeyValueStore,
    key: &str,
    items: &[T],
) -> Result<(), StorageError> {
    let text = serde_json::to_string(items)?;
    kv.set(key, &text)
}
