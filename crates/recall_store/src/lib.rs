// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Storage contract shared by every recall backend.
//!
//! This crate defines the [`Store`] trait that all key-value backends satisfy, together with
//! [`StoredEntry`] for values carrying expiry metadata, [`SetOptions`] for conditional writes,
//! glob [`Pattern`]s for key listing, and the [`Error`] taxonomy every backend translates its
//! native failures into.
//!
//! # Overview
//!
//! A backend implements the four primitive operations (`get`, `set`, `delete`, `keys`) and
//! names itself through [`Store::backend`]. The remaining operations (`increase`, `multi_get`,
//! `clear`, `memory_size`) have default implementations layered on the primitives, which a
//! backend may override when it can do better, e.g. with a native atomic increment.
//!
//! # Implementing a Store
//!
//! ```
//! use std::collections::HashMap;
//! use std::sync::Mutex;
//!
//! use recall_store::{Backend, Pattern, Result, SetOptions, Store, StoredEntry};
//!
//! #[derive(Debug, Default)]
//! struct SimpleStore(Mutex<HashMap<String, StoredEntry>>);
//!
//! impl Store for SimpleStore {
//!     fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
//!         let map = self.0.lock().unwrap();
//!         Ok(map.get(key).filter(|e| !e.is_expired()).map(|e| e.value().to_vec()))
//!     }
//!
//!     fn set(&self, key: &str, value: &[u8], options: &SetOptions) -> Result<bool> {
//!         let condition = options.condition()?;
//!         let mut map = self.0.lock().unwrap();
//!         let present = map.get(key).is_some_and(|e| !e.is_expired());
//!         if !condition.permits(present) {
//!             return Ok(false);
//!         }
//!         map.insert(key.to_string(), StoredEntry::new(value.to_vec(), options.ttl()));
//!         Ok(true)
//!     }
//!
//!     fn delete(&self, keys: &[String]) -> Result<usize> {
//!         let mut map = self.0.lock().unwrap();
//!         Ok(keys.iter().filter(|k| map.remove(k.as_str()).is_some()).count())
//!     }
//!
//!     fn keys(&self, pattern: &str) -> Result<Vec<String>> {
//!         let pattern = Pattern::new(pattern)?;
//!         let map = self.0.lock().unwrap();
//!         Ok(map.keys().filter(|k| pattern.matches(k)).cloned().collect())
//!     }
//!
//!     fn backend(&self) -> Backend {
//!         Backend::Memory
//!     }
//! }
//!
//! let store = SimpleStore::default();
//! assert_eq!(store.increase("counter", 5)?, "5");
//! # Ok::<(), recall_store::Error>(())
//! ```

mod entry;
pub mod error;
mod options;
pub mod pattern;
mod store;
#[cfg(any(feature = "test-util", test))]
pub mod testing;

#[doc(inline)]
pub use entry::StoredEntry;
#[doc(inline)]
pub use error::{Backend, ClientError, ClientErrorKind, Error, Result};
#[doc(inline)]
pub use options::{SetOptions, WriteCondition};
#[doc(inline)]
pub use pattern::Pattern;
#[doc(inline)]
pub use store::Store;
