// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! A store that spreads one logical store over several backends.

use std::sync::Arc;

use recall_store::{Backend, ClientError, ClientErrorKind, Result, SetOptions, Store};

use crate::telemetry::{self, CacheActivity, CacheOperation};

/// Composes several stores behind the [`Store`] contract.
///
/// The first backend is the primary: reads, writes, increments and listings go to it
/// alone. Deletes and clears fan out to every backend so that stale copies written by
/// other processes through other primaries do not survive an invalidation.
///
/// A fan-out attempts every backend before it reports a failure. When several backends
/// fail, the first error is returned and the others are logged.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
///
/// use recall::{Dispatcher, MemoryStore, SetOptions, Store};
///
/// let local = Arc::new(MemoryStore::new());
/// let shared = Arc::new(MemoryStore::new());
/// shared.set("user:1", b"stale", &SetOptions::new())?;
///
/// let backends: Vec<Arc<dyn Store>> = vec![local, Arc::clone(&shared) as Arc<dyn Store>];
/// let dispatcher = Dispatcher::new(backends)?;
/// dispatcher.set("user:1", b"fresh", &SetOptions::new())?;
///
/// assert_eq!(dispatcher.delete_each(&["user:1".to_string()])?, vec![1, 1]);
/// assert_eq!(shared.get("user:1")?, None);
/// # Ok::<(), recall::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct Dispatcher {
    primary: Arc<dyn Store>,
    backends: Vec<Arc<dyn Store>>,
}

impl Dispatcher {
    /// Creates a dispatcher whose primary is the first of `backends`.
    ///
    /// # Errors
    ///
    /// Returns an [`ClientErrorKind::InvalidConfiguration`] client error if `backends` is empty.
    pub fn new(backends: Vec<Arc<dyn Store>>) -> Result<Self> {
        let Some(primary) = backends.first().map(Arc::clone) else {
            return Err(ClientError::new(
                Backend::Dispatcher,
                ClientErrorKind::InvalidConfiguration,
                "a dispatcher needs at least one backend",
            )
            .into());
        };
        Ok(Self { primary, backends })
    }

    /// Returns the backend that serves reads and writes.
    #[must_use]
    pub fn primary(&self) -> &Arc<dyn Store> {
        &self.primary
    }

    /// Returns every backend, primary first.
    #[must_use]
    pub fn backends(&self) -> &[Arc<dyn Store>] {
        &self.backends
    }

    /// Deletes `keys` from every backend, returning each backend's count in order.
    ///
    /// # Errors
    ///
    /// Returns the first backend failure after all backends have been attempted.
    pub fn delete_each(&self, keys: &[String]) -> Result<Vec<usize>> {
        self.fan_out(CacheOperation::Delete, |backend| backend.delete(keys))
    }

    fn fan_out(&self, operation: CacheOperation, apply: impl Fn(&dyn Store) -> Result<usize>) -> Result<Vec<usize>> {
        let mut counts = Vec::with_capacity(self.backends.len());
        let mut first_error = None;

        for (index, backend) in self.backends.iter().enumerate() {
            match apply(backend.as_ref()) {
                Ok(count) => counts.push(count),
                Err(err) => {
                    tracing::warn!(index, backend = %backend.backend(), error = %err, "dispatched operation failed");
                    telemetry::record(Backend::Dispatcher.as_str(), operation, CacheActivity::FanoutFailed, None);
                    if first_error.is_none() {
                        first_error = Some(err);
                    }
                }
            }
        }

        match first_error {
            Some(err) => Err(err),
            None => Ok(counts),
        }
    }
}

impl Store for Dispatcher {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        self.primary().get(key)
    }

    fn set(&self, key: &str, value: &[u8], options: &SetOptions) -> Result<bool> {
        self.primary().set(key, value, options)
    }

    fn delete(&self, keys: &[String]) -> Result<usize> {
        Ok(self.delete_each(keys)?.into_iter().sum())
    }

    fn keys(&self, pattern: &str) -> Result<Vec<String>> {
        self.primary().keys(pattern)
    }

    fn backend(&self) -> Backend {
        Backend::Dispatcher
    }

    fn increase(&self, key: &str, amount: i64) -> Result<String> {
        self.primary().increase(key, amount)
    }

    fn multi_get(&self, keys: &[String]) -> Result<Vec<Option<Vec<u8>>>> {
        self.primary().multi_get(keys)
    }

    fn clear(&self, pattern: &str) -> Result<usize> {
        Ok(self
            .fan_out(CacheOperation::Clear, |backend| backend.clear(pattern))?
            .into_iter()
            .sum())
    }

    fn memory_size(&self, keys: &[String]) -> Result<usize> {
        self.primary().memory_size(keys)
    }
}

#[cfg(test)]
mod tests {
    use recall_memory::MemoryStore;
    use recall_store::testing::{MockStore, StoreOp};

    use super::*;
    use crate::telemetry::testing::LogCapture;

    fn keys(names: &[&str]) -> Vec<String> {
        names.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn empty_backend_list_is_invalid_configuration() {
        let err = Dispatcher::new(Vec::new()).unwrap_err();
        let client = err.as_client().unwrap();
        assert_eq!(client.backend(), Backend::Dispatcher);
        assert_eq!(client.kind(), ClientErrorKind::InvalidConfiguration);
    }

    #[test]
    fn reads_and_writes_only_touch_primary() {
        let primary = MockStore::new();
        let secondary = MockStore::new();
        let backends: Vec<Arc<dyn Store>> = vec![Arc::new(primary.clone()), Arc::new(secondary.clone())];
        let dispatcher = Dispatcher::new(backends).unwrap();

        dispatcher.set("k", b"v", &SetOptions::new()).unwrap();
        assert_eq!(dispatcher.get("k").unwrap(), Some(b"v".to_vec()));
        assert_eq!(dispatcher.increase("n", 2).unwrap(), "2");
        assert_eq!(dispatcher.keys("*").unwrap(), keys(&["k", "n"]));
        assert_eq!(dispatcher.multi_get(&keys(&["k"])).unwrap(), vec![Some(b"v".to_vec())]);
        assert_eq!(dispatcher.memory_size(&keys(&["k"])).unwrap(), 2);

        assert!(!primary.operations().is_empty());
        assert!(secondary.operations().is_empty());
    }

    #[test]
    fn delete_sums_per_backend_counts() {
        let a = Arc::new(MemoryStore::new());
        let b = Arc::new(MemoryStore::new());
        a.set("x", b"1", &SetOptions::new()).unwrap();
        b.set("x", b"1", &SetOptions::new()).unwrap();
        b.set("y", b"1", &SetOptions::new()).unwrap();

        let backends: Vec<Arc<dyn Store>> = vec![a, b];
        let dispatcher = Dispatcher::new(backends).unwrap();
        assert_eq!(dispatcher.delete(&keys(&["x", "y"])).unwrap(), 3);
    }

    #[test]
    fn fan_out_attempts_every_backend_before_failing() {
        let failing = MockStore::new();
        failing.fail_when(|op| matches!(op, StoreOp::Keys(_)));
        let healthy = Arc::new(MemoryStore::new());
        healthy.set("ns:a", b"1", &SetOptions::new()).unwrap();

        let capture = LogCapture::new();
        let _guard = tracing::subscriber::set_default(capture.subscriber());

        let backends: Vec<Arc<dyn Store>> = vec![Arc::new(failing), Arc::clone(&healthy) as Arc<dyn Store>];
        let dispatcher = Dispatcher::new(backends).unwrap();
        let err = dispatcher.clear("ns:*").unwrap_err();

        assert_eq!(err.as_client().map(ClientError::backend), Some(Backend::Mock));
        assert!(healthy.is_empty(), "the healthy backend was still cleared");
        capture.assert_contains("cache.fanout_failed");
    }
}
