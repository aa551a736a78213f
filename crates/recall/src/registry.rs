// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Shared memoizers keyed by configuration.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use recall_memory::MemoryStore;
use recall_store::{Result, Store};

use crate::memoize::Memoizer;
use crate::namespace::Namespace;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct RegistryKey {
    namespace: String,
    default_expiry: Option<Duration>,
    store: usize,
}

#[derive(Debug, Default)]
struct RegistryState {
    memoizers: HashMap<RegistryKey, Memoizer>,
    default_store: Option<Arc<dyn Store>>,
}

/// Hands out one shared [`Memoizer`] per namespace, default expiry and store.
///
/// Stores are told apart by identity: two requests passing clones of the same
/// `Arc<dyn Store>` share a memoizer, while two separately created stores never do.
/// Requests without a store share one in-memory store created on first use. Memoizers
/// live as long as the registry.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use recall::Registry;
///
/// let registry = Registry::new();
/// let a = registry.get_or_create("reports", Some(Duration::from_secs(60)), None)?;
/// let b = registry.get_or_create("reports", Some(Duration::from_secs(60)), None)?;
/// let c = registry.get_or_create("reports", None, None)?;
///
/// assert!(a.same_as(&b));
/// assert!(!a.same_as(&c));
/// assert_eq!(registry.len(), 2);
/// # Ok::<(), recall::Error>(())
/// ```
#[derive(Debug, Default)]
pub struct Registry {
    state: Mutex<RegistryState>,
}

impl Registry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the memoizer for the given configuration, creating it on first use.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Namespace`](crate::Error::Namespace) if the namespace is empty or
    /// reserved.
    pub fn get_or_create(
        &self,
        namespace: &str,
        default_expiry: Option<Duration>,
        store: Option<Arc<dyn Store>>,
    ) -> Result<Memoizer> {
        let mut state = self.state.lock();
        let store = match store {
            Some(store) => store,
            None => Arc::clone(
                state
                    .default_store
                    .get_or_insert_with(|| Arc::new(MemoryStore::new())),
            ),
        };

        let key = RegistryKey {
            namespace: namespace.to_string(),
            default_expiry,
            store: Arc::as_ptr(&store).cast::<()>().addr(),
        };
        if let Some(memoizer) = state.memoizers.get(&key) {
            return Ok(memoizer.clone());
        }

        let memoizer = Memoizer::new(
            Namespace::builder(namespace)
                .with_default_expiry(default_expiry)
                .store(store)
                .build()?,
        );
        state.memoizers.insert(key, memoizer.clone());
        Ok(memoizer)
    }

    /// Returns the number of memoizers created so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.lock().memoizers.len()
    }

    /// Returns `true` if no memoizer has been created.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state.lock().memoizers.is_empty()
    }
}
