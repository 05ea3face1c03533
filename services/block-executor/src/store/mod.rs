//! Deterministic key-value store layer
//!
//! A canonical in-memory store plus copy-on-write branches. Branches nest:
//! the block coordinator branches the canonical store once per iteration,
//! and every per-pair task branches the frozen iteration view behind a
//! per-pair key whitelist.

pub mod branch;
pub mod keys;

pub use branch::{StoreBranch, WhitelistedStore};

use std::collections::BTreeMap;
use types::errors::StoreError;

/// Overlay delta: `None` is a tombstone
pub type Delta = BTreeMap<Vec<u8>, Option<Vec<u8>>>;

/// Read access to a store view
pub trait StoreRead: Send + Sync {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>>;

    /// All entries whose key starts with `prefix`, in ascending key order
    fn scan_prefix(&self, prefix: &[u8]) -> Vec<(Vec<u8>, Vec<u8>)>;
}

/// Write access to a store view
///
/// Writes are fallible so that restricted views can reject them
/// deterministically.
pub trait StoreWrite: StoreRead {
    fn set(&mut self, key: Vec<u8>, value: Vec<u8>) -> Result<(), StoreError>;
    fn delete(&mut self, key: Vec<u8>) -> Result<(), StoreError>;
}

/// Canonical store backed by an ordered map
#[derive(Debug, Clone, Default)]
pub struct MemStore {
    entries: BTreeMap<Vec<u8>, Vec<u8>>,
}

impl MemStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold a branch delta into the canonical state
    pub fn apply_delta(&mut self, delta: Delta) {
        for (key, value) in delta {
            match value {
                Some(value) => {
                    self.entries.insert(key, value);
                }
                None => {
                    self.entries.remove(&key);
                }
            }
        }
    }

    /// Number of stored entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate every entry in ascending key order
    pub fn iter(&self) -> impl Iterator<Item = (&Vec<u8>, &Vec<u8>)> {
        self.entries.iter()
    }
}

impl StoreRead for MemStore {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.entries.get(key).cloned()
    }

    fn scan_prefix(&self, prefix: &[u8]) -> Vec<(Vec<u8>, Vec<u8>)> {
        self.entries
            .range(prefix.to_vec()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }
}

impl StoreWrite for MemStore {
    fn set(&mut self, key: Vec<u8>, value: Vec<u8>) -> Result<(), StoreError> {
        self.entries.insert(key, value);
        Ok(())
    }

    fn delete(&mut self, key: Vec<u8>) -> Result<(), StoreError> {
        self.entries.remove(&key);
        Ok(())
    }
}
