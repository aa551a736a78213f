// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::time::{Duration, SystemTime};

/// A stored value with the metadata needed for lazy expiry.
///
/// An entry with a ttl becomes logically absent once more than `ttl` has elapsed since
/// `stored_at`. Nothing sweeps expired entries; backends check [`is_expired`](Self::is_expired)
/// when they read.
///
/// # Examples
///
/// ```
/// use recall_store::StoredEntry;
/// use std::time::{Duration, SystemTime};
///
/// let entry = StoredEntry::new(b"value".to_vec(), Some(Duration::from_secs(60)));
/// assert_eq!(entry.value(), b"value");
/// assert!(!entry.is_expired());
///
/// let later = entry.stored_at() + Duration::from_secs(61);
/// assert!(entry.is_expired_at(later));
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredEntry {
    value: Vec<u8>,
    stored_at: SystemTime,
    ttl: Option<Duration>,
}

impl StoredEntry {
    /// Creates an entry stamped with the current time.
    #[must_use]
    pub fn new(value: Vec<u8>, ttl: Option<Duration>) -> Self {
        Self::with_stored_at(value, SystemTime::now(), ttl)
    }

    /// Creates an entry with an explicit timestamp.
    ///
    /// This is used when recreating entries from persistent storage.
    #[must_use]
    pub fn with_stored_at(value: Vec<u8>, stored_at: SystemTime, ttl: Option<Duration>) -> Self {
        Self { value, stored_at, ttl }
    }

    /// Returns the stored bytes.
    #[must_use]
    pub fn value(&self) -> &[u8] {
        &self.value
    }

    /// Consumes the entry and returns the stored bytes.
    #[must_use]
    pub fn into_value(self) -> Vec<u8> {
        self.value
    }

    /// Returns when the entry was written.
    #[must_use]
    pub fn stored_at(&self) -> SystemTime {
        self.stored_at
    }

    /// Returns the entry's time to live, if any.
    #[must_use]
    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    /// Returns `true` if the entry is logically absent at `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: SystemTime) -> bool {
        let Some(ttl) = self.ttl else {
            return false;
        };

        match now.duration_since(self.stored_at) {
            Ok(elapsed) => elapsed > ttl,
            // The system clock went backwards past the write.
            Err(_) => true,
        }
    }

    /// Returns `true` if the entry is logically absent now.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(SystemTime::now())
    }
}
