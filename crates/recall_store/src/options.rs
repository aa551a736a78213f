// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::time::Duration;

use crate::{Error, Result};

/// Options for a [`Store::set`](crate::Store::set) call.
///
/// `only_if_new` and `only_if_old` are mutually exclusive; backends call
/// [`condition`](Self::condition) which rejects the combination.
///
/// # Examples
///
/// ```
/// use recall_store::{SetOptions, WriteCondition};
/// use std::time::Duration;
///
/// let options = SetOptions::new().with_ttl(Duration::from_secs(30)).only_if_new();
/// assert_eq!(options.ttl(), Some(Duration::from_secs(30)));
/// assert_eq!(options.condition()?, WriteCondition::IfAbsent);
///
/// assert!(SetOptions::new().only_if_new().only_if_old().condition().is_err());
/// # Ok::<(), recall_store::Error>(())
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SetOptions {
    ttl: Option<Duration>,
    only_if_new: bool,
    only_if_old: bool,
}

impl SetOptions {
    /// Creates options for an unconditional write without expiry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the time to live of the written entry.
    #[must_use]
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// Sets or clears the time to live of the written entry.
    #[must_use]
    pub fn with_expiry(mut self, ttl: Option<Duration>) -> Self {
        self.ttl = ttl;
        self
    }

    /// Only write if the key currently resolves to absent.
    #[must_use]
    pub fn only_if_new(mut self) -> Self {
        self.only_if_new = true;
        self
    }

    /// Only write if the key currently resolves to a present value.
    #[must_use]
    pub fn only_if_old(mut self) -> Self {
        self.only_if_old = true;
        self
    }

    /// Returns the time to live of the written entry.
    #[must_use]
    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    /// Returns `true` if the write is restricted to absent keys.
    #[must_use]
    pub fn is_only_if_new(&self) -> bool {
        self.only_if_new
    }

    /// Returns `true` if the write is restricted to present keys.
    #[must_use]
    pub fn is_only_if_old(&self) -> bool {
        self.only_if_old
    }

    /// Resolves the conditional flags.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parameter`] if both `only_if_new` and `only_if_old` are set.
    pub fn condition(&self) -> Result<WriteCondition> {
        match (self.only_if_new, self.only_if_old) {
            (true, true) => Err(Error::Parameter("only one of `only_if_new` and `only_if_old` may be set")),
            (true, false) => Ok(WriteCondition::IfAbsent),
            (false, true) => Ok(WriteCondition::IfPresent),
            (false, false) => Ok(WriteCondition::Always),
        }
    }
}

/// When a write is allowed to take place.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum WriteCondition {
    /// Write regardless of the current state.
    #[default]
    Always,
    /// Write only if the key is absent.
    IfAbsent,
    /// Write only if the key is present.
    IfPresent,
}

impl WriteCondition {
    /// Returns `true` if a write may proceed given whether the key is currently present.
    #[must_use]
    pub fn permits(self, present: bool) -> bool {
        match self {
            Self::Always => true,
            Self::IfAbsent => !present,
            Self::IfPresent => present,
        }
    }
}
