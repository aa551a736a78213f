// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The core trait for key-value storage backends.
//!
//! [`Store`] defines the contract every backend implements. It is object safe so that
//! heterogeneous backends can be composed behind `Arc<dyn Store>`.

use std::fmt::Debug;
use std::sync::Arc;

use crate::{Backend, ClientError, ClientErrorKind, Result, SetOptions};

/// Trait for key-value storage backends.
///
/// Four methods are required: `get`, `set`, `delete` and `keys`, plus [`backend`](Store::backend)
/// which tags errors raised by the default implementations. The remaining methods are
/// layered on the required ones:
/// - `increase`: read, add, write back
/// - `multi_get`: repeated `get`
/// - `clear`: `delete` of every key matching the pattern
/// - `memory_size`: byte length of the keys plus their fetched values
///
/// All operations block the calling thread until the backend answers.
pub trait Store: Send + Sync + Debug {
    /// Gets the value stored under `key`, or `None` if it is absent or expired.
    ///
    /// # Errors
    ///
    /// Returns a client error if the backend fails. A miss is never an error.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Stores `value` under `key`, returning `true` iff the value was written.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parameter`](crate::Error::Parameter) if the options request both
    /// conditional modes, or a client error if the backend fails.
    fn set(&self, key: &str, value: &[u8], options: &SetOptions) -> Result<bool>;

    /// Deletes the given keys, returning how many were present.
    ///
    /// # Errors
    ///
    /// Returns a client error if the backend fails.
    fn delete(&self, keys: &[String]) -> Result<usize>;

    /// Lists the keys matching a glob pattern.
    ///
    /// # Errors
    ///
    /// Returns a client error if the backend fails or the pattern cannot be compiled.
    fn keys(&self, pattern: &str) -> Result<Vec<String>>;

    /// Names the backend family, used to tag errors raised by default methods.
    fn backend(&self) -> Backend;

    /// Adds `amount` to the integer stored under `key` and returns the new value as text.
    ///
    /// An absent key counts as zero. The rewritten counter carries no ttl.
    ///
    /// # Errors
    ///
    /// Returns a [`ClientErrorKind::NotAnInteger`] client error, leaving the stored value
    /// untouched, if the current value is not integer text or the sum overflows.
    fn increase(&self, key: &str, amount: i64) -> Result<String> {
        let next = match self.get(key)? {
            None => amount,
            Some(raw) => parse_counter(&raw).and_then(|current| current.checked_add(amount)).ok_or_else(|| {
                ClientError::new(
                    self.backend(),
                    ClientErrorKind::NotAnInteger,
                    format!("value of key `{key}` is not an integer that can be increased by {amount}"),
                )
            })?,
        };

        let text = next.to_string();
        self.set(key, text.as_bytes(), &SetOptions::new())?;
        Ok(text)
    }

    /// Gets several values at once, aligned with `keys`.
    ///
    /// # Errors
    ///
    /// Returns a client error if the backend fails.
    fn multi_get(&self, keys: &[String]) -> Result<Vec<Option<Vec<u8>>>> {
        keys.iter().map(|key| self.get(key)).collect()
    }

    /// Deletes every key matching the pattern, returning how many were deleted.
    ///
    /// # Errors
    ///
    /// Returns a client error if the backend fails.
    fn clear(&self, pattern: &str) -> Result<usize> {
        let keys = self.keys(pattern)?;
        if keys.is_empty() {
            return Ok(0);
        }
        self.delete(&keys)
    }

    /// Approximates the bytes consumed by the given keys and their values.
    ///
    /// # Errors
    ///
    /// Returns a client error if the backend fails.
    fn memory_size(&self, keys: &[String]) -> Result<usize> {
        if keys.is_empty() {
            return Ok(0);
        }
        let key_bytes: usize = keys.iter().map(String::len).sum();
        let value_bytes: usize = self.multi_get(keys)?.iter().flatten().map(Vec::len).sum();
        Ok(key_bytes + value_bytes)
    }
}

/// Parses integer counter text as written by [`Store::increase`].
#[must_use]
pub(crate) fn parse_counter(raw: &[u8]) -> Option<i64> {
    std::str::from_utf8(raw).ok()?.parse().ok()
}

macro_rules! forward_store {
    ($($wrapper:ident)::+) => {
        impl<T: Store + ?Sized> Store for $($wrapper)::+<T> {
            fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
                (**self).get(key)
            }

            fn set(&self, key: &str, value: &[u8], options: &SetOptions) -> Result<bool> {
                (**self).set(key, value, options)
            }

            fn delete(&self, keys: &[String]) -> Result<usize> {
                (**self).delete(keys)
            }

            fn keys(&self, pattern: &str) -> Result<Vec<String>> {
                (**self).keys(pattern)
            }

            fn backend(&self) -> Backend {
                (**self).backend()
            }

            fn increase(&self, key: &str, amount: i64) -> Result<String> {
                (**self).increase(key, amount)
            }

            fn multi_get(&self, keys: &[String]) -> Result<Vec<Option<Vec<u8>>>> {
                (**self).multi_get(keys)
            }

            fn clear(&self, pattern: &str) -> Result<usize> {
                (**self).clear(pattern)
            }

            fn memory_size(&self, keys: &[String]) -> Result<usize> {
                (**self).memory_size(keys)
            }
        }
    };
}

forward_store!(Arc);
forward_store!(Box);
