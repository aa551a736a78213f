// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Structured logging of cache activity.
//!
//! Every event is a `tracing` event with the message `cache.event` and the fields
//! `cache.name`, `cache.operation`, `cache.activity` and `cache.duration_ns`. Installing a
//! subscriber is left to the application.

use std::time::Duration;

use tracing::Level;

pub(crate) mod attributes;
#[cfg(test)]
pub(crate) mod testing;

#[derive(Debug, Clone, Copy)]
pub(crate) enum CacheOperation {
    Get,
    Compute,
    Set,
    Delete,
    Clear,
}

impl CacheOperation {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "cache.get",
            Self::Compute => "cache.compute",
            Self::Set => "cache.set",
            Self::Delete => "cache.delete",
            Self::Clear => "cache.clear",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) enum CacheActivity {
    Hit,
    Miss,
    Computed,
    Uncached,
    WriteFailed,
    Cleared,
    FanoutFailed,
}

impl CacheActivity {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hit => "cache.hit",
            Self::Miss => "cache.miss",
            Self::Computed => "cache.computed",
            Self::Uncached => "cache.uncached",
            Self::WriteFailed => "cache.write_failed",
            Self::Cleared => "cache.cleared",
            Self::FanoutFailed => "cache.fanout_failed",
        }
    }

    pub fn severity(self) -> Level {
        match self {
            Self::Hit | Self::Miss | Self::Computed => Level::DEBUG,
            Self::Uncached | Self::Cleared => Level::INFO,
            Self::WriteFailed | Self::FanoutFailed => Level::WARN,
        }
    }
}

/// Emits one cache event at the activity's severity.
pub(crate) fn record(cache_name: &str, operation: CacheOperation, activity: CacheActivity, duration: Option<Duration>) {
    let op = operation.as_str();
    let ev = activity.as_str();
    let duration_ns = duration.map(|d| d.as_nanos());

    // Tracing level must be constant, so a macro selects the level.
    // Field names must match the constants in attributes.rs, checked by its tests.
    macro_rules! emit_event {
        ($level:ident) => {
            tracing::$level!(
                cache.name = cache_name,
                cache.operation = op,
                cache.activity = ev,
                cache.duration_ns = ?duration_ns,
                "cache.event"
            )
        };
    }

    let level = activity.severity();
    if level == Level::WARN {
        emit_event!(warn);
    } else if level == Level::INFO {
        emit_event!(info);
    } else {
        emit_event!(debug);
    }
}
