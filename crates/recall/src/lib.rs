// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Function-result memoization over pluggable key-value stores.
//!
//! This crate caches the results of ordinary functions in any [`Store`]:
//! - [`Memoizer`] wraps functions so that repeated calls with equal arguments reuse a
//!   stored result
//! - [`Namespace`] isolates one cache inside a shared store and counts hits and misses
//! - [`Dispatcher`] spreads one logical store over several backends
//! - [`Registry`] hands out shared memoizers per configuration
//! - [`StoreConfig`] selects stores from configuration files
//!
//! All calls block the calling thread. Activity is reported as `tracing` events.
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use recall::{CallOptions, Memoizer, MemoryStore, Namespace, function_id};
//!
//! let namespace = Namespace::builder("pricing")
//!     .default_expiry(Duration::from_secs(300))
//!     .store(Arc::new(MemoryStore::new()))
//!     .build()?;
//! let memoizer = Memoizer::new(namespace);
//!
//! let quote = memoizer.wrap(function_id!(quote), |(item, qty): &(String, u32)| {
//!     format!("{item} x{qty}")
//! });
//!
//! assert_eq!(quote.call(&("apple".to_string(), 3))?, "apple x3");
//! assert_eq!(quote.call(&("apple".to_string(), 3))?, "apple x3");
//! assert_eq!(memoizer.namespace().hits()?, 1);
//!
//! // Force a recomputation.
//! quote.call_with(&("apple".to_string(), 3), CallOptions::refresh())?;
//! # Ok::<(), recall::Error>(())
//! ```

mod codec;
pub mod config;
mod dispatcher;
pub mod memoize;
pub mod namespace;
mod registry;
mod telemetry;

#[doc(inline)]
pub use codec::{Codec, JsonCodec};
#[doc(inline)]
pub use config::StoreConfig;
#[doc(inline)]
pub use dispatcher::Dispatcher;
#[doc(inline)]
pub use memoize::{CallOptions, Computed, CostRetention, FunctionId, Memoized, Memoizer, MemoizerBuilder};
#[doc(inline)]
pub use namespace::{DEFAULT_GLOBAL_NAMESPACE, Namespace, NamespaceBuilder, Region};
#[cfg(feature = "file")]
#[doc(inline)]
pub use recall_file::FileStore;
#[doc(inline)]
pub use recall_memory::MemoryStore;
#[cfg(feature = "redis")]
#[doc(inline)]
pub use recall_redis::{Host, RedisStore, RedisStoreBuilder};
#[doc(inline)]
pub use recall_store::{Backend, ClientError, ClientErrorKind, Error, Pattern, Result, SetOptions, Store, WriteCondition};
#[doc(inline)]
pub use registry::Registry;

#[cfg(any(feature = "test-util", test))]
#[doc(inline)]
pub use recall_store::testing::{MockStore, StoreOp};
