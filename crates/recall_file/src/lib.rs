// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Filesystem backend for recall.
//!
//! [`FileStore`] keeps one small JSON document per key hash under a root directory. It
//! survives process restarts and can be shared by processes on the same machine, at the
//! cost of rewriting a whole document on every write.
//!
//! # Layout
//!
//! The file name is the hex `xxh3` digest of the key. Each document maps the full key to
//! `[value, stored_at, ttl]`, where `stored_at` is seconds since the Unix epoch and `ttl`
//! is seconds or `null`. Keys whose digests collide share a document; lookups always
//! compare the full key.
//!
//! ```
//! use recall_file::FileStore;
//! use recall_store::{SetOptions, Store};
//!
//! let dir = tempfile::tempdir()?;
//! let store = FileStore::with_root(dir.path());
//!
//! store.set("greeting", b"hello", &SetOptions::new())?;
//! assert_eq!(store.get("greeting")?, Some(b"hello".to_vec()));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod document;
pub mod store;

#[doc(inline)]
pub use store::FileStore;
