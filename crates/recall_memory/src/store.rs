// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! In-memory store implementation using dashmap.
//!
//! Conditional writes and increments hold the per-key shard lock for the duration of the
//! read-check-write, so they are atomic with respect to other calls on the same store.

use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use recall_store::{Backend, ClientError, ClientErrorKind, Pattern, Result, SetOptions, Store, StoredEntry};

/// A process-local store backed by a concurrent map.
///
/// Cloning is cheap and clones share the same entries.
///
/// # Examples
///
/// ```
/// use recall_memory::MemoryStore;
/// use recall_store::{SetOptions, Store};
///
/// let store = MemoryStore::new();
/// assert!(store.set("key", b"first", &SetOptions::new().only_if_new())?);
/// assert!(!store.set("key", b"second", &SetOptions::new().only_if_new())?);
/// assert_eq!(store.get("key")?, Some(b"first".to_vec()));
/// # Ok::<(), recall_store::Error>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<DashMap<String, StoredEntry>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty store with room for `capacity` entries before reallocating.
    ///
    /// This is not a bound; the store never evicts.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Arc::new(DashMap::with_capacity(capacity)),
        }
    }

    /// Returns the number of held entries, including expired ones not yet read.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no entries are held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Store for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        if let Some(entry) = self.entries.get(key) {
            if !entry.is_expired() {
                return Ok(Some(entry.value().value().to_vec()));
            }
        } else {
            return Ok(None);
        }

        // The read guard is released above; purge only if still expired.
        self.entries.remove_if(key, |_, entry| entry.is_expired());
        Ok(None)
    }

    fn set(&self, key: &str, value: &[u8], options: &SetOptions) -> Result<bool> {
        let condition = options.condition()?;
        let entry = StoredEntry::new(value.to_vec(), options.ttl());

        match self.entries.entry(key.to_string()) {
            Entry::Occupied(mut occupied) => {
                if !condition.permits(!occupied.get().is_expired()) {
                    return Ok(false);
                }
                occupied.insert(entry);
            }
            Entry::Vacant(vacant) => {
                if !condition.permits(false) {
                    return Ok(false);
                }
                vacant.insert(entry);
            }
        }
        Ok(true)
    }

    fn delete(&self, keys: &[String]) -> Result<usize> {
        Ok(keys.iter().filter(|key| self.entries.remove(key.as_str()).is_some()).count())
    }

    fn keys(&self, pattern: &str) -> Result<Vec<String>> {
        let pattern = Pattern::new(pattern)?;
        Ok(self
            .entries
            .iter()
            .filter(|item| !item.value().is_expired() && pattern.matches(item.key()))
            .map(|item| item.key().clone())
            .collect())
    }

    fn backend(&self) -> Backend {
        Backend::Memory
    }

    fn increase(&self, key: &str, amount: i64) -> Result<String> {
        let mut slot = self
            .entries
            .entry(key.to_string())
            .or_insert_with(|| StoredEntry::new(b"0".to_vec(), None));

        let current = if slot.is_expired() {
            Some(0)
        } else {
            std::str::from_utf8(slot.value().value()).ok().and_then(|text| text.parse::<i64>().ok())
        };

        let Some(next) = current.and_then(|current| current.checked_add(amount)) else {
            return Err(ClientError::new(
                Backend::Memory,
                ClientErrorKind::NotAnInteger,
                format!("value of key `{key}` is not an integer that can be increased by {amount}"),
            )
            .into());
        };

        let text = next.to_string();
        *slot = StoredEntry::new(text.clone().into_bytes(), None);
        Ok(text)
    }
}
