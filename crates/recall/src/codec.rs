// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Encoding of call arguments and results.

use std::fmt::Debug;

use recall_store::{Error, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Turns arguments and results into bytes and back.
///
/// Encoding must be deterministic: equal arguments have to produce equal bytes, because
/// the encoded arguments are part of the cache key.
pub trait Codec: Send + Sync + Debug {
    /// Encodes a value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Codec`] if the value cannot be represented.
    fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>>;

    /// Decodes a value previously produced by [`encode`](Self::encode).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Codec`] if the bytes do not describe a `T`.
    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T>;
}

/// A [`Codec`] producing compact JSON.
///
/// ```
/// use recall::{Codec, JsonCodec};
///
/// let bytes = JsonCodec.encode(&(1, "two"))?;
/// assert_eq!(bytes, br#"[1,"two"]"#);
/// assert_eq!(JsonCodec.decode::<(i32, String)>(&bytes)?, (1, "two".to_string()));
/// # Ok::<(), recall::Error>(())
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>> {
        serde_json::to_vec(value).map_err(Error::codec)
    }

    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T> {
        serde_json::from_slice(bytes).map_err(Error::codec)
    }
}
