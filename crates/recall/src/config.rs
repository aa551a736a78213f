// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Data-driven store selection.

#[cfg(feature = "file")]
use std::path::PathBuf;
use std::sync::Arc;
#[cfg(feature = "redis")]
use std::time::Duration;

use recall_memory::MemoryStore;
use recall_store::{Backend, ClientError, ClientErrorKind, Result, Store};
use serde::{Deserialize, Serialize};

use crate::dispatcher::Dispatcher;

/// Describes a store so that it can be chosen in configuration files.
///
/// The variant is selected by the `kind` field.
///
/// ```
/// use recall::StoreConfig;
///
/// let config: StoreConfig = serde_json::from_str(
///     r#"{ "kind": "dispatch", "backends": [{ "kind": "memory" }, { "kind": "memory" }] }"#,
/// )?;
/// let store = config.build()?;
/// assert_eq!(store.backend().as_str(), "dispatcher");
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
#[non_exhaustive]
pub enum StoreConfig {
    /// A process-local [`MemoryStore`].
    Memory,
    /// A [`FileStore`](recall_file::FileStore), rooted in the temporary directory by default.
    #[cfg(feature = "file")]
    File {
        /// The root directory.
        #[serde(default)]
        root: Option<PathBuf>,
    },
    /// A [`RedisStore`](recall_redis::RedisStore).
    #[cfg(feature = "redis")]
    Redis {
        /// The server as `host[:port]`.
        host: String,
        /// Connect, read and write timeout in milliseconds.
        #[serde(default)]
        timeout_ms: Option<u64>,
    },
    /// A [`Dispatcher`] over the listed stores, the first being the primary.
    Dispatch {
        /// The composed stores.
        backends: Vec<StoreConfig>,
    },
}

impl StoreConfig {
    /// Creates the described store.
    ///
    /// # Errors
    ///
    /// Returns [`Error::HostFormat`](crate::Error::HostFormat) for a malformed remote host, a
    /// client error if a remote store cannot be reached, or an
    /// [`ClientErrorKind::InvalidConfiguration`] client error naming every dispatched
    /// store that could not be built.
    pub fn build(&self) -> Result<Arc<dyn Store>> {
        match self {
            Self::Memory => Ok(Arc::new(MemoryStore::new())),
            #[cfg(feature = "file")]
            Self::File { root } => Ok(Arc::new(
                root.as_ref()
                    .map_or_else(recall_file::FileStore::new, recall_file::FileStore::with_root),
            )),
            #[cfg(feature = "redis")]
            Self::Redis { host, timeout_ms } => {
                let mut builder = recall_redis::RedisStore::builder(host.parse()?);
                if let Some(timeout_ms) = timeout_ms {
                    builder = builder.timeout(Duration::from_millis(*timeout_ms));
                }
                Ok(Arc::new(builder.connect()?))
            }
            Self::Dispatch { backends } => build_dispatcher(backends),
        }
    }
}

fn build_dispatcher(configs: &[StoreConfig]) -> Result<Arc<dyn Store>> {
    let mut backends = Vec::with_capacity(configs.len());
    let mut failures = Vec::new();

    for (index, config) in configs.iter().enumerate() {
        match config.build() {
            Ok(backend) => backends.push(backend),
            Err(err) => failures.push((index, err)),
        }
    }

    let Some((_, first)) = failures.first() else {
        return Ok(Arc::new(Dispatcher::new(backends)?));
    };

    let indices: Vec<usize> = failures.iter().map(|(index, _)| *index).collect();
    let message = format!("dispatched stores at positions {indices:?} could not be built, first failure: {first}");
    let (_, cause) = failures.swap_remove(0);
    Err(ClientError::caused_by(Backend::Dispatcher, ClientErrorKind::InvalidConfiguration, message, cause).into())
}
