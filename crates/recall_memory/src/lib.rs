// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! In-process store backed by a concurrent map.
//!
//! This crate provides [`MemoryStore`], a process-local [`Store`](recall_store::Store) that
//! keeps every entry in a sharded concurrent map. Nothing is persisted across process
//! restarts and nothing is evicted except by lazy ttl expiry.
//!
//! # Quick Start
//!
//! ```
//! use recall_memory::MemoryStore;
//! use recall_store::{SetOptions, Store};
//! use std::time::Duration;
//!
//! let store = MemoryStore::new();
//! store.set("key", b"42", &SetOptions::new().with_ttl(Duration::from_secs(300)))?;
//! assert_eq!(store.get("key")?, Some(b"42".to_vec()));
//! # Ok::<(), recall_store::Error>(())
//! ```

pub mod store;

#[doc(inline)]
pub use store::MemoryStore;
