// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Redis backend for recall.
//!
//! [`RedisStore`] maps every storage operation onto a native Redis command over one
//! synchronous connection, so conditional writes (`SET NX|XX`) and increments (`INCRBY`)
//! are atomic on the server.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use recall_redis::RedisStore;
//! use recall_store::{SetOptions, Store};
//!
//! let store = RedisStore::builder("localhost:6379".parse()?)
//!     .timeout(Duration::from_secs(2))
//!     .connect()?;
//!
//! store.set("key", b"value", &SetOptions::new().with_ttl(Duration::from_secs(60)))?;
//! # Ok::<(), recall_store::Error>(())
//! ```

mod host;
pub mod store;

#[doc(inline)]
pub use host::{DEFAULT_PORT, Host};
#[doc(inline)]
pub use store::{RedisStore, RedisStoreBuilder};
