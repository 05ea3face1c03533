//! Copy-on-write branches and whitelisted views

use super::{Delta, StoreRead, StoreWrite};
use types::errors::StoreError;

/// Copy-on-write overlay over any readable store
///
/// Reads fall through to the base unless shadowed by the local delta;
/// deletes become tombstones. The branch commits by surrendering its delta
/// to the owner of the base, or discards by being dropped.
pub struct StoreBranch<'a> {
    base: &'a dyn StoreRead,
    delta: Delta,
}

impl<'a> StoreBranch<'a> {
    /// Branch off a base view
    pub fn new(base: &'a dyn StoreRead) -> Self {
        Self {
            base,
            delta: Delta::new(),
        }
    }

    /// Consume the branch, yielding its pending writes
    pub fn into_delta(self) -> Delta {
        self.delta
    }

    /// Fold another delta into this branch
    pub fn apply_delta(&mut self, delta: Delta) {
        for (key, value) in delta {
            self.delta.insert(key, value);
        }
    }
}

impl StoreRead for StoreBranch<'_> {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        match self.delta.get(key) {
            Some(Some(value)) => Some(value.clone()),
            Some(None) => None,
            None => self.base.get(key),
        }
    }

    fn scan_prefix(&self, prefix: &[u8]) -> Vec<(Vec<u8>, Vec<u8>)> {
        let mut merged: Delta = self
            .base
            .scan_prefix(prefix)
            .into_iter()
            .map(|(key, value)| (key, Some(value)))
            .collect();
        for (key, value) in self
            .delta
            .range(prefix.to_vec()..)
            .take_while(|(key, _)| key.starts_with(prefix))
        {
            merged.insert(key.clone(), value.clone());
        }
        merged
            .into_iter()
            .filter_map(|(key, value)| value.map(|v| (key, v)))
            .collect()
    }
}

impl StoreWrite for StoreBranch<'_> {
    fn set(&mut self, key: Vec<u8>, value: Vec<u8>) -> Result<(), StoreError> {
        self.delta.insert(key, Some(value));
        Ok(())
    }

    fn delete(&mut self, key: Vec<u8>) -> Result<(), StoreError> {
        self.delta.insert(key, None);
        Ok(())
    }
}

/// A branch restricted to a set of writable key prefixes
///
/// Reads are unrestricted; writes and deletes outside the whitelist fail
/// with [`StoreError::KeyNotWhitelisted`], deterministically on every
/// replica.
pub struct WhitelistedStore<'a> {
    inner: StoreBranch<'a>,
    prefixes: Vec<Vec<u8>>,
}

impl<'a> WhitelistedStore<'a> {
    /// Restrict a fresh branch of `base` to `prefixes`
    pub fn new(base: &'a dyn StoreRead, prefixes: Vec<Vec<u8>>) -> Self {
        Self {
            inner: StoreBranch::new(base),
            prefixes,
        }
    }

    /// Consume the view, yielding its pending writes
    pub fn into_delta(self) -> Delta {
        self.inner.into_delta()
    }

    fn allows(&self, key: &[u8]) -> bool {
        self.prefixes.iter().any(|prefix| key.starts_with(prefix))
    }

    fn reject(key: &[u8]) -> StoreError {
        StoreError::KeyNotWhitelisted {
            key: String::from_utf8_lossy(key).into_owned(),
        }
    }
}

impl StoreRead for WhitelistedStore<'_> {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.inner.get(key)
    }

    fn scan_prefix(&self, prefix: &[u8]) -> Vec<(Vec<u8>, Vec<u8>)> {
        self.inner.scan_prefix(prefix)
    }
}

impl StoreWrite for WhitelistedStore<'_> {
    fn set(&mut self, key: Vec<u8>, value: Vec<u8>) -> Result<(), StoreError> {
        if !self.allows(&key) {
            return Err(Self::reject(&key));
        }
        self.inner.set(key, value)
    }

    fn delete(&mut self, key: Vec<u8>) -> Result<(), StoreError> {
        if !self.allows(&key) {
            return Err(Self::reject(&key));
        }
        self.inner.delete(key)
    }
}
