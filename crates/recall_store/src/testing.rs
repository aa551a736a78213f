// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Mock store implementation for testing.
//!
//! This module provides `MockStore`, an in-memory store that records all operations and
//! supports failure injection for testing error paths.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::{Backend, ClientError, ClientErrorKind, Pattern, Result, SetOptions, Store, StoredEntry};

/// Recorded store operation with full context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreOp {
    /// A get operation was performed with the given key.
    Get(String),
    /// A set operation was performed.
    Set {
        /// The key that was written.
        key: String,
        /// The value that was written.
        value: Vec<u8>,
        /// The options of the write.
        options: SetOptions,
    },
    /// A delete operation was performed with the given keys.
    Delete(Vec<String>),
    /// A key listing was performed with the given pattern.
    Keys(String),
}

type FailPredicate = Box<dyn Fn(&StoreOp) -> bool + Send + Sync>;

/// A configurable mock store for testing.
///
/// Values live in memory and honor ttls and conditional writes, so the mock behaves like
/// a real backend until told to fail. All primitive operations are recorded; the default
/// trait methods (`increase`, `multi_get`, `clear`, `memory_size`) show up as the
/// primitives they are built from.
///
/// # Examples
///
/// ```
/// use recall_store::testing::{MockStore, StoreOp};
/// use recall_store::{SetOptions, Store};
///
/// let store = MockStore::new();
/// store.set("key", b"value", &SetOptions::new())?;
/// assert_eq!(store.get("key")?, Some(b"value".to_vec()));
///
/// store.fail_when(|op| matches!(op, StoreOp::Get(k) if k == "forbidden"));
/// assert!(store.get("forbidden").is_err());
/// assert!(store.get("allowed").is_ok());
/// # Ok::<(), recall_store::Error>(())
/// ```
pub struct MockStore {
    data: Arc<Mutex<HashMap<String, StoredEntry>>>,
    operations: Arc<Mutex<Vec<StoreOp>>>,
    fail_when: Arc<Mutex<Option<FailPredicate>>>,
}

impl std::fmt::Debug for MockStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockStore")
            .field("data", &self.data)
            .field("operations", &self.operations)
            .field("fail_when", &self.fail_when.lock().is_some())
            .finish()
    }
}

impl Clone for MockStore {
    fn clone(&self) -> Self {
        Self {
            data: Arc::clone(&self.data),
            operations: Arc::clone(&self.operations),
            fail_when: Arc::clone(&self.fail_when),
        }
    }
}

impl Default for MockStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MockStore {
    /// Creates a new empty mock store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            data: Arc::new(Mutex::new(HashMap::new())),
            operations: Arc::new(Mutex::new(Vec::new())),
            fail_when: Arc::new(Mutex::new(None)),
        }
    }

    /// Returns the number of entries held, expired or not.
    #[must_use]
    pub fn entry_count(&self) -> usize {
        self.data.lock().len()
    }

    /// Returns the raw entry stored under `key`, ignoring expiry.
    #[must_use]
    pub fn entry(&self, key: &str) -> Option<StoredEntry> {
        self.data.lock().get(key).cloned()
    }

    /// Sets a predicate that determines when operations should fail.
    ///
    /// ```
    /// use recall_store::testing::{MockStore, StoreOp};
    ///
    /// let store = MockStore::new();
    ///
    /// // Fail all writes
    /// store.fail_when(|op| matches!(op, StoreOp::Set { .. }));
    /// ```
    pub fn fail_when<F>(&self, predicate: F)
    where
        F: Fn(&StoreOp) -> bool + Send + Sync + 'static,
    {
        *self.fail_when.lock() = Some(Box::new(predicate));
    }

    /// Clears the failure predicate, allowing all operations to succeed.
    pub fn clear_failures(&self) {
        *self.fail_when.lock() = None;
    }

    /// Returns a clone of all recorded operations.
    #[must_use]
    pub fn operations(&self) -> Vec<StoreOp> {
        self.operations.lock().clone()
    }

    /// Clears all recorded operations.
    pub fn clear_operations(&self) {
        self.operations.lock().clear();
    }

    fn record(&self, op: StoreOp) -> Result<()> {
        let fail = self.fail_when.lock().as_ref().is_some_and(|predicate| predicate(&op));
        let message = format!("mock: {op:?} failed");
        self.operations.lock().push(op);
        if fail {
            return Err(ClientError::new(Backend::Mock, ClientErrorKind::Io, message).into());
        }
        Ok(())
    }

    fn live_value(&self, key: &str) -> Option<Vec<u8>> {
        let mut data = self.data.lock();
        if data.get(key).is_some_and(StoredEntry::is_expired) {
            data.remove(key);
        }
        data.get(key).map(|entry| entry.value().to_vec())
    }
}

impl Store for MockStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        self.record(StoreOp::Get(key.to_string()))?;
        Ok(self.live_value(key))
    }

    fn set(&self, key: &str, value: &[u8], options: &SetOptions) -> Result<bool> {
        self.record(StoreOp::Set {
            key: key.to_string(),
            value: value.to_vec(),
            options: *options,
        })?;

        let condition = options.condition()?;
        if !condition.permits(self.live_value(key).is_some()) {
            return Ok(false);
        }
        self.data
            .lock()
            .insert(key.to_string(), StoredEntry::new(value.to_vec(), options.ttl()));
        Ok(true)
    }

    fn delete(&self, keys: &[String]) -> Result<usize> {
        self.record(StoreOp::Delete(keys.to_vec()))?;
        let mut data = self.data.lock();
        Ok(keys.iter().filter(|key| data.remove(key.as_str()).is_some()).count())
    }

    fn keys(&self, pattern: &str) -> Result<Vec<String>> {
        self.record(StoreOp::Keys(pattern.to_string()))?;
        let pattern = Pattern::new(pattern)?;
        let data = self.data.lock();
        let mut keys: Vec<String> = data
            .iter()
            .filter(|(key, entry)| !entry.is_expired() && pattern.matches(key))
            .map(|(key, _)| key.clone())
            .collect();
        keys.sort();
        Ok(keys)
    }

    fn backend(&self) -> Backend {
        Backend::Mock
    }
}
