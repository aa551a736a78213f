// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Read-through memoization of function calls.

use std::borrow::Cow;
use std::fmt::{self, Write as _};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use recall_store::{Result, SetOptions};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::codec::{Codec, JsonCodec};
use crate::namespace::Namespace;
use crate::telemetry::{self, CacheActivity, CacheOperation};

/// Identifies a memoized function: the module it lives in and its name.
///
/// Both parts go into every cache key of the function, so renaming or moving a function
/// starts it with an empty cache. Use [`function_id!`](crate::function_id) to capture the
/// current module.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FunctionId {
    module: Cow<'static, str>,
    name: Cow<'static, str>,
}

impl FunctionId {
    /// Creates an identity from its parts.
    pub fn new(module: impl Into<Cow<'static, str>>, name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            module: module.into(),
            name: name.into(),
        }
    }

    /// Returns the module path.
    #[must_use]
    pub fn module(&self) -> &str {
        &self.module
    }

    /// Returns the function name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for FunctionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.module, self.name)
    }
}

/// Creates a [`FunctionId`] for `name` in the calling module.
///
/// ```
/// use recall::function_id;
///
/// fn lookup() {}
///
/// let id = function_id!(lookup);
/// assert_eq!(id.name(), "lookup");
/// assert_eq!(id.module(), module_path!());
/// ```
#[macro_export]
macro_rules! function_id {
    ($name:ident) => {
        $crate::FunctionId::new(::core::module_path!(), ::core::stringify!($name))
    };
    ($name:literal) => {
        $crate::FunctionId::new(::core::module_path!(), $name)
    };
}

/// The outcome of a memoized computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Computed<R> {
    /// The result may be stored and reused.
    Cacheable(R),
    /// The result is returned to this caller only and never stored.
    Uncached(R),
}

impl<R> Computed<R> {
    /// Returns the result, whether or not it may be stored.
    pub fn into_inner(self) -> R {
        match self {
            Self::Cacheable(value) | Self::Uncached(value) => value,
        }
    }

    /// Returns `true` if the result may be stored.
    #[must_use]
    pub fn is_cacheable(&self) -> bool {
        matches!(self, Self::Cacheable(_))
    }
}

/// Per-call options of a [`Memoized`] function.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallOptions {
    refresh: bool,
}

impl CallOptions {
    /// Options for a normal read-through call.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Options that skip the lookup, recompute and overwrite the stored result.
    #[must_use]
    pub fn refresh() -> Self {
        Self { refresh: true }
    }

    /// Returns `true` if the call recomputes unconditionally.
    #[must_use]
    pub fn is_refresh(&self) -> bool {
        self.refresh
    }
}

/// How long compute-cost samples are kept.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CostRetention {
    /// A sample expires together with the value it was measured for.
    #[default]
    MatchEntry,
    /// Samples expire after a fixed time.
    Fixed(Duration),
    /// Samples never expire.
    Forever,
}

impl CostRetention {
    fn ttl(self, entry_ttl: Option<Duration>) -> Option<Duration> {
        match self {
            Self::MatchEntry => entry_ttl,
            Self::Fixed(ttl) => Some(ttl),
            Self::Forever => None,
        }
    }
}

#[derive(Debug)]
struct MemoizerInner<C> {
    namespace: Namespace,
    codec: C,
    cost_retention: CostRetention,
    wrapped: Mutex<Vec<FunctionId>>,
}

/// Caches the results of wrapped functions in a [`Namespace`].
///
/// A wrapped function derives its cache key from its [`FunctionId`] and its encoded
/// arguments. A call whose key is present returns the decoded stored result without
/// running the function; otherwise the function runs, and its result is stored with the
/// namespace's default expiry together with a sample of how long it took.
///
/// Concurrent misses on the same key all compute; the last write wins.
///
/// Cloning is cheap and clones share all state.
///
/// # Examples
///
/// ```
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::sync::Arc;
///
/// use recall::{Memoizer, Namespace, function_id};
///
/// let memoizer = Memoizer::new(Namespace::builder("math").build()?);
/// let runs = Arc::new(AtomicUsize::new(0));
///
/// let counter = Arc::clone(&runs);
/// let square = memoizer.wrap(function_id!(square), move |x: &u64| {
///     counter.fetch_add(1, Ordering::Relaxed);
///     x * x
/// });
///
/// assert_eq!(square.call(&12)?, 144);
/// assert_eq!(square.call(&12)?, 144);
/// assert_eq!(runs.load(Ordering::Relaxed), 1);
/// # Ok::<(), recall::Error>(())
/// ```
#[derive(Debug)]
pub struct Memoizer<C = JsonCodec> {
    inner: Arc<MemoizerInner<C>>,
}

impl<C> Clone for Memoizer<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C> Memoizer<C> {
    /// Returns `true` if both handles share the same state.
    #[must_use]
    pub fn same_as(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

/// Builder for [`Memoizer`].
#[derive(Debug)]
pub struct MemoizerBuilder<C = JsonCodec> {
    namespace: Namespace,
    codec: C,
    cost_retention: CostRetention,
}

impl<C> MemoizerBuilder<C> {
    /// Replaces the codec used for arguments and results.
    #[must_use]
    pub fn codec<C2: Codec>(self, codec: C2) -> MemoizerBuilder<C2> {
        MemoizerBuilder {
            namespace: self.namespace,
            codec,
            cost_retention: self.cost_retention,
        }
    }

    /// Sets how long compute-cost samples are kept.
    #[must_use]
    pub fn cost_retention(mut self, retention: CostRetention) -> Self {
        self.cost_retention = retention;
        self
    }
}

impl<C: Codec> MemoizerBuilder<C> {
    /// Builds the memoizer.
    #[must_use]
    pub fn build(self) -> Memoizer<C> {
        Memoizer {
            inner: Arc::new(MemoizerInner {
                namespace: self.namespace,
                codec: self.codec,
                cost_retention: self.cost_retention,
                wrapped: Mutex::new(Vec::new()),
            }),
        }
    }
}

impl Memoizer<JsonCodec> {
    /// Starts building a memoizer over `namespace`.
    #[must_use]
    pub fn builder(namespace: Namespace) -> MemoizerBuilder<JsonCodec> {
        MemoizerBuilder {
            namespace,
            codec: JsonCodec,
            cost_retention: CostRetention::default(),
        }
    }

    /// Creates a memoizer with the JSON codec and default cost retention.
    #[must_use]
    pub fn new(namespace: Namespace) -> Self {
        Self::builder(namespace).build()
    }
}

impl<C: Codec> Memoizer<C> {
    /// Returns the namespace results are cached in.
    #[must_use]
    pub fn namespace(&self) -> &Namespace {
        &self.inner.namespace
    }

    /// Returns the codec.
    #[must_use]
    pub fn codec(&self) -> &C {
        &self.inner.codec
    }

    /// Returns the retention of compute-cost samples.
    #[must_use]
    pub fn cost_retention(&self) -> CostRetention {
        self.inner.cost_retention
    }

    /// Memoizes `f`, caching every result it returns.
    pub fn wrap<A, R, F>(&self, id: FunctionId, f: F) -> Memoized<A, R, C>
    where
        A: ?Sized + 'static,
        R: 'static,
        F: Fn(&A) -> R + Send + Sync + 'static,
    {
        self.wrap_computed(id, move |args: &A| Computed::Cacheable(f(args)))
    }

    /// Memoizes `f`, which decides per call whether its result may be cached.
    ///
    /// ```
    /// use recall::{Computed, Memoizer, Namespace, function_id};
    ///
    /// let memoizer = Memoizer::new(Namespace::builder("lookups").build()?);
    /// let find = memoizer.wrap_computed(function_id!(find), |id: &u32| {
    ///     if *id == 0 {
    ///         Computed::Uncached(None)
    ///     } else {
    ///         Computed::Cacheable(Some(format!("user-{id}")))
    ///     }
    /// });
    ///
    /// assert_eq!(find.call(&0)?, None);
    /// assert_eq!(find.call(&7)?, Some("user-7".to_string()));
    /// assert_eq!(memoizer.namespace().keys("*")?.len(), 1);
    /// # Ok::<(), recall::Error>(())
    /// ```
    pub fn wrap_computed<A, R, F>(&self, id: FunctionId, f: F) -> Memoized<A, R, C>
    where
        A: ?Sized + 'static,
        R: 'static,
        F: Fn(&A) -> Computed<R> + Send + Sync + 'static,
    {
        let mut wrapped = self.inner.wrapped.lock();
        if !wrapped.contains(&id) {
            wrapped.push(id.clone());
        }
        drop(wrapped);
        Memoized {
            id,
            memoizer: self.clone(),
            source: Arc::new(f),
        }
    }

    /// Returns the identities of every function wrapped so far, in the order they were first
    /// wrapped. Wrapping an identity again does not list it twice.
    #[must_use]
    pub fn wrapped(&self) -> Vec<FunctionId> {
        self.inner.wrapped.lock().clone()
    }

    /// Caches `value` under `key` and records `cost` as its compute-cost sample.
    ///
    /// The sample is written first, to the monitoring region under the same key and with
    /// the same conditions; its ttl follows the [`CostRetention`]. The returned flag is
    /// that of the value write.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parameter`](crate::Error::Parameter) for conflicting conditions, or
    /// a client error if the store fails.
    pub fn set(&self, key: &str, value: &[u8], options: &SetOptions, cost: Duration) -> Result<bool> {
        let namespace = &self.inner.namespace;
        let options = namespace.effective_options(options);
        let cost_options = options.with_expiry(self.inner.cost_retention.ttl(options.ttl()));

        namespace.store().set(
            &namespace.time_cost_key(key),
            cost.as_secs_f64().to_string().as_bytes(),
            &cost_options,
        )?;
        namespace.set(key, value, &options)
    }

    /// Returns the mean of all stored compute-cost samples in seconds, or zero if there
    /// are none.
    ///
    /// Samples that are not numbers are ignored.
    ///
    /// # Errors
    ///
    /// Returns a client error if the store fails.
    #[expect(clippy::cast_precision_loss, reason = "sample counts are far below 2^52")]
    pub fn time_cost_average(&self) -> Result<f64> {
        let store = self.inner.namespace.store();
        let keys = store.keys(self.inner.namespace.time_cost_pattern())?;
        if keys.is_empty() {
            return Ok(0.0);
        }

        let samples: Vec<f64> = store
            .multi_get(&keys)?
            .into_iter()
            .flatten()
            .filter_map(|raw| std::str::from_utf8(&raw).ok()?.parse().ok())
            .collect();
        if samples.is_empty() {
            return Ok(0.0);
        }
        Ok(samples.iter().sum::<f64>() / samples.len() as f64)
    }

    /// Derives the logical cache key of a call: `module:function:encoded-arguments`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Codec`](crate::Error::Codec) if the arguments cannot be encoded.
    pub fn cache_key<A: Serialize + ?Sized>(&self, id: &FunctionId, args: &A) -> Result<String> {
        let encoded = self.inner.codec.encode(args)?;
        Ok(format!("{id}:{}", key_fragment(encoded)))
    }
}

/// Keeps text encodings readable and hex-encodes anything else.
fn key_fragment(encoded: Vec<u8>) -> String {
    match String::from_utf8(encoded) {
        Ok(text) => text,
        Err(err) => err.into_bytes().iter().fold(String::new(), |mut hex, byte| {
            let _ = write!(hex, "{byte:02x}");
            hex
        }),
    }
}

/// A function wrapped by a [`Memoizer`].
pub struct Memoized<A: ?Sized, R, C = JsonCodec> {
    id: FunctionId,
    memoizer: Memoizer<C>,
    source: Arc<dyn Fn(&A) -> Computed<R> + Send + Sync>,
}

impl<A: ?Sized, R, C> Clone for Memoized<A, R, C> {
    fn clone(&self) -> Self {
        Self {
            id: self.id.clone(),
            memoizer: self.memoizer.clone(),
            source: Arc::clone(&self.source),
        }
    }
}

impl<A: ?Sized, R, C: fmt::Debug> fmt::Debug for Memoized<A, R, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Memoized")
            .field("id", &self.id)
            .field("memoizer", &self.memoizer)
            .finish_non_exhaustive()
    }
}

impl<A, R, C> Memoized<A, R, C>
where
    A: Serialize + ?Sized,
    R: Serialize + DeserializeOwned,
    C: Codec,
{
    /// Returns the cached result for `args`, computing and caching it on a miss.
    ///
    /// # Errors
    ///
    /// Returns a client error if the lookup fails, or [`Error::Codec`](crate::Error::Codec)
    /// if the arguments or the result cannot be encoded or decoded. A failure to store a
    /// computed result is logged and does not fail the call.
    pub fn call(&self, args: &A) -> Result<R> {
        self.call_with(args, CallOptions::new())
    }

    /// Like [`call`](Self::call), with per-call options.
    ///
    /// # Errors
    ///
    /// See [`call`](Self::call).
    pub fn call_with(&self, args: &A, options: CallOptions) -> Result<R> {
        let memoizer = &self.memoizer;
        let key = memoizer.cache_key(&self.id, args)?;

        if !options.is_refresh()
            && let Some(stored) = memoizer.namespace().get(&key)?
        {
            return memoizer.codec().decode(&stored);
        }

        let name = memoizer.namespace().namespace();
        let started = Instant::now();
        let computed = (self.source)(args);
        let elapsed = started.elapsed();

        let value = match computed {
            Computed::Cacheable(value) => value,
            Computed::Uncached(value) => {
                telemetry::record(name, CacheOperation::Compute, CacheActivity::Uncached, Some(elapsed));
                return Ok(value);
            }
        };

        let encoded = memoizer.codec().encode(&value)?;
        match memoizer.set(&key, &encoded, &SetOptions::new(), elapsed) {
            Ok(_) => telemetry::record(name, CacheOperation::Compute, CacheActivity::Computed, Some(elapsed)),
            Err(err) => {
                tracing::warn!(function = %self.id, error = %err, "failed to store computed result");
                telemetry::record(name, CacheOperation::Set, CacheActivity::WriteFailed, Some(elapsed));
            }
        }
        Ok(value)
    }
}

impl<A: ?Sized, R, C> Memoized<A, R, C> {
    /// Returns the identity the function was wrapped under.
    #[must_use]
    pub fn id(&self) -> &FunctionId {
        &self.id
    }

    /// Returns the memoizer that owns this wrapper.
    #[must_use]
    pub fn memoizer(&self) -> &Memoizer<C> {
        &self.memoizer
    }

    /// Returns the wrapped function, which runs without touching the cache.
    pub fn source(&self) -> impl Fn(&A) -> R + '_ {
        move |args: &A| (self.source)(args).into_inner()
    }
}
