// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! On-disk document format.

use std::collections::BTreeMap;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use recall_store::{Backend, ClientError, ClientErrorKind, Result, StoredEntry};
use serde::{Deserialize, Serialize};

/// All records sharing one document file, keyed by their full key.
pub(crate) type Document = BTreeMap<String, Record>;

/// Stored bytes, kept readable when they are text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub(crate) enum StoredValue {
    Text(String),
    Bytes(Vec<u8>),
}

impl StoredValue {
    fn from_bytes(value: &[u8]) -> Self {
        match std::str::from_utf8(value) {
            Ok(text) => Self::Text(text.to_string()),
            Err(_) => Self::Bytes(value.to_vec()),
        }
    }

    fn into_bytes(self) -> Vec<u8> {
        match self {
            Self::Text(text) => text.into_bytes(),
            Self::Bytes(bytes) => bytes,
        }
    }
}

/// `[value, stored_at_epoch_seconds, ttl_seconds_or_null]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct Record(StoredValue, f64, Option<f64>);

impl Record {
    pub(crate) fn new(value: &[u8], ttl: Option<Duration>) -> Self {
        let stored_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0.0, |since| since.as_secs_f64());
        Self(StoredValue::from_bytes(value), stored_at, ttl.map(|ttl| ttl.as_secs_f64()))
    }

    /// Rebuilds the entry so expiry is judged the same way as in every other backend.
    pub(crate) fn to_entry(&self, key: &str) -> Result<StoredEntry> {
        let stored_at = UNIX_EPOCH + seconds(self.1, key)?;
        let ttl = self.2.map(|ttl| seconds(ttl, key)).transpose()?;
        Ok(StoredEntry::with_stored_at(self.0.clone().into_bytes(), stored_at, ttl))
    }

    pub(crate) fn is_live(&self, key: &str) -> Result<bool> {
        Ok(!self.to_entry(key)?.is_expired())
    }
}

fn seconds(value: f64, key: &str) -> Result<Duration> {
    Duration::try_from_secs_f64(value).map_err(|err| {
        ClientError::caused_by(
            Backend::File,
            ClientErrorKind::MalformedDocument,
            format!("record of key `{key}` holds an invalid duration {value}"),
            err,
        )
        .into()
    })
}
