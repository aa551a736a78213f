// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Namespaced view of a store with hit and miss accounting.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use recall_memory::MemoryStore;
use recall_store::pattern::escape;
use recall_store::{ClientError, ClientErrorKind, Error, Result, SetOptions, Store};

use crate::telemetry::{self, CacheActivity, CacheOperation};

/// The global namespace used when none is configured.
pub const DEFAULT_GLOBAL_NAMESPACE: &str = "recall";

const RESERVED_NAMESPACE: &str = "default";
const SEP: char = ':';

const HITS_SUFFIX: &str = "hits";
const MISSES_SUFFIX: &str = "misses";
const TIME_COST_SUFFIX: &str = "time_cost";

/// The part of a namespace an entry belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Region {
    /// Cached values.
    Cache,
    /// Hit and miss counters and compute-cost samples.
    Monitoring,
}

impl Region {
    /// Returns the key segment naming this region.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cache => "cache",
            Self::Monitoring => "monitoring",
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Physical key fragments, formatted once per namespace.
#[derive(Debug)]
struct KeySpace {
    cache_prefix: String,
    monitoring_prefix: String,
    hits_key: String,
    misses_key: String,
    cache_pattern: String,
    monitoring_pattern: String,
    time_cost_pattern: String,
}

impl KeySpace {
    fn new(global: &str, namespace: &str) -> Self {
        let prefix = |region: Region| format!("{global}{SEP}{namespace}{SEP}{region}{SEP}");
        let cache_prefix = prefix(Region::Cache);
        let monitoring_prefix = prefix(Region::Monitoring);

        // The counters aggregate every key, hence the literal `*` in their names.
        let hits_key = format!("{monitoring_prefix}*{SEP}{HITS_SUFFIX}");
        let misses_key = format!("{monitoring_prefix}*{SEP}{MISSES_SUFFIX}");

        Self {
            cache_pattern: escape(&cache_prefix),
            monitoring_pattern: escape(&monitoring_prefix),
            time_cost_pattern: format!("{}*{SEP}{TIME_COST_SUFFIX}", escape(&monitoring_prefix)),
            cache_prefix,
            monitoring_prefix,
            hits_key,
            misses_key,
        }
    }

    fn prefix(&self, region: Region) -> &str {
        match region {
            Region::Cache => &self.cache_prefix,
            Region::Monitoring => &self.monitoring_prefix,
        }
    }
}

/// Confines cache entries and counters to one namespace of a shared store.
///
/// Physical keys have the form `global:namespace:region:key[:suffix]`. Every [`get`](Self::get)
/// bumps the namespace's hit or miss counter, which live as ordinary entries in the
/// monitoring region.
///
/// Cloning is cheap and clones share the same store.
///
/// # Examples
///
/// ```
/// use recall::{Namespace, SetOptions};
///
/// let ns = Namespace::builder("orders").build()?;
/// ns.set("42", b"shipped", &SetOptions::new())?;
///
/// assert_eq!(ns.get("42")?, Some(b"shipped".to_vec()));
/// assert_eq!(ns.get("43")?, None);
/// assert_eq!(ns.hit_rate()?, 0.5);
/// assert_eq!(ns.keys("*")?, vec!["42".to_string()]);
/// # Ok::<(), recall::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct Namespace {
    inner: Arc<NamespaceInner>,
}

#[derive(Debug)]
struct NamespaceInner {
    namespace: String,
    global_namespace: String,
    default_expiry: Option<Duration>,
    store: Arc<dyn Store>,
    keys: KeySpace,
}

/// Builder for [`Namespace`].
#[derive(Debug)]
pub struct NamespaceBuilder {
    namespace: String,
    global_namespace: String,
    default_expiry: Option<Duration>,
    store: Option<Arc<dyn Store>>,
}

impl NamespaceBuilder {
    /// Sets the global namespace shared by all namespaces of one application.
    ///
    /// Defaults to [`DEFAULT_GLOBAL_NAMESPACE`].
    #[must_use]
    pub fn global_namespace(mut self, global_namespace: impl Into<String>) -> Self {
        self.global_namespace = global_namespace.into();
        self
    }

    /// Sets the ttl applied to writes that do not carry one.
    #[must_use]
    pub fn default_expiry(mut self, expiry: Duration) -> Self {
        self.default_expiry = Some(expiry);
        self
    }

    /// Sets or clears the ttl applied to writes that do not carry one.
    #[must_use]
    pub fn with_default_expiry(mut self, expiry: Option<Duration>) -> Self {
        self.default_expiry = expiry;
        self
    }

    /// Sets the backing store. Defaults to a new [`MemoryStore`].
    #[must_use]
    pub fn store(mut self, store: Arc<dyn Store>) -> Self {
        self.store = Some(store);
        self
    }

    /// Builds the namespace.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Namespace`] if the namespace is empty or the reserved `default`.
    pub fn build(self) -> Result<Namespace> {
        if self.namespace.is_empty() || self.namespace == RESERVED_NAMESPACE {
            return Err(Error::Namespace {
                namespace: self.namespace,
            });
        }

        let keys = KeySpace::new(&self.global_namespace, &self.namespace);
        Ok(Namespace {
            inner: Arc::new(NamespaceInner {
                store: self.store.unwrap_or_else(|| Arc::new(MemoryStore::new())),
                namespace: self.namespace,
                global_namespace: self.global_namespace,
                default_expiry: self.default_expiry,
                keys,
            }),
        })
    }
}

impl Namespace {
    /// Starts building a namespace.
    #[must_use]
    pub fn builder(namespace: impl Into<String>) -> NamespaceBuilder {
        NamespaceBuilder {
            namespace: namespace.into(),
            global_namespace: DEFAULT_GLOBAL_NAMESPACE.to_string(),
            default_expiry: None,
            store: None,
        }
    }

    /// Returns the namespace name.
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.inner.namespace
    }

    /// Returns the global namespace.
    #[must_use]
    pub fn global_namespace(&self) -> &str {
        &self.inner.global_namespace
    }

    /// Returns the ttl applied to writes that do not carry one.
    #[must_use]
    pub fn default_expiry(&self) -> Option<Duration> {
        self.inner.default_expiry
    }

    /// Returns the backing store.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn Store> {
        &self.inner.store
    }

    /// Returns the key the store sees for `key` in `region`.
    ///
    /// ```
    /// use recall::{Namespace, Region};
    ///
    /// let ns = Namespace::builder("orders").global_namespace("shop").build()?;
    /// assert_eq!(ns.physical_key(Region::Cache, "42"), "shop:orders:cache:42");
    /// # Ok::<(), recall::Error>(())
    /// ```
    #[must_use]
    pub fn physical_key(&self, region: Region, key: &str) -> String {
        format!("{}{key}", self.inner.keys.prefix(region))
    }

    pub(crate) fn time_cost_key(&self, key: &str) -> String {
        format!("{}{key}{SEP}{TIME_COST_SUFFIX}", self.inner.keys.monitoring_prefix)
    }

    pub(crate) fn time_cost_pattern(&self) -> &str {
        &self.inner.keys.time_cost_pattern
    }

    /// Gets the value cached under `key`, counting a hit or a miss.
    ///
    /// # Errors
    ///
    /// Returns a client error if the store fails.
    pub fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let value = self.inner.store.get(&self.physical_key(Region::Cache, key))?;
        let (counter, activity) = if value.is_some() {
            (&self.inner.keys.hits_key, CacheActivity::Hit)
        } else {
            (&self.inner.keys.misses_key, CacheActivity::Miss)
        };
        self.inner.store.increase(counter, 1)?;
        telemetry::record(self.namespace(), CacheOperation::Get, activity, None);
        Ok(value)
    }

    /// Caches `value` under `key`.
    ///
    /// Without a ttl in `options` the namespace's default expiry applies.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parameter`] for conflicting conditions, or a client error if the
    /// store fails.
    pub fn set(&self, key: &str, value: &[u8], options: &SetOptions) -> Result<bool> {
        let options = self.effective_options(options);
        self.inner.store.set(&self.physical_key(Region::Cache, key), value, &options)
    }

    pub(crate) fn effective_options(&self, options: &SetOptions) -> SetOptions {
        match options.ttl() {
            Some(_) => *options,
            None => options.with_expiry(self.inner.default_expiry),
        }
    }

    /// Deletes the given keys, returning how many were present.
    ///
    /// # Errors
    ///
    /// Returns a client error if the store fails.
    pub fn delete<K: AsRef<str>>(&self, keys: &[K]) -> Result<usize> {
        let physical: Vec<String> = keys
            .iter()
            .map(|key| self.physical_key(Region::Cache, key.as_ref()))
            .collect();
        self.inner.store.delete(&physical)
    }

    /// Lists the cached keys matching `pattern`, with the namespace stripped.
    ///
    /// The pattern is matched against the key as passed to [`set`](Self::set).
    ///
    /// # Errors
    ///
    /// Returns a client error if the store fails.
    pub fn keys(&self, pattern: &str) -> Result<Vec<String>> {
        let prefix = &self.inner.keys.cache_prefix;
        Ok(self
            .physical_keys(pattern)?
            .into_iter()
            .map(|key| key.strip_prefix(prefix.as_str()).map_or_else(|| key.clone(), ToString::to_string))
            .collect())
    }

    fn physical_keys(&self, pattern: &str) -> Result<Vec<String>> {
        self.inner
            .store
            .keys(&format!("{}{pattern}", self.inner.keys.cache_pattern))
    }

    /// Removes every cached value of this namespace and resets its counters, returning how
    /// many values were removed.
    ///
    /// Cost samples go too, so [`hit_rate`](Self::hit_rate) reads zero until the next
    /// [`get`](Self::get).
    ///
    /// # Errors
    ///
    /// Returns a client error if the store fails.
    pub fn clear(&self) -> Result<usize> {
        let cleared = self.inner.store.clear(&format!("{}*", self.inner.keys.cache_pattern))?;
        self.clear_region(&self.inner.keys.monitoring_pattern)?;
        telemetry::record(self.namespace(), CacheOperation::Clear, CacheActivity::Cleared, None);
        Ok(cleared)
    }

    /// Removes the counters and cost samples of this namespace, keeping cached values.
    ///
    /// # Errors
    ///
    /// Returns a client error if the store fails.
    pub fn clear_monitoring(&self) -> Result<usize> {
        let cleared = self.clear_region(&self.inner.keys.monitoring_pattern)?;
        telemetry::record(self.namespace(), CacheOperation::Clear, CacheActivity::Cleared, None);
        Ok(cleared)
    }

    fn clear_region(&self, region_pattern: &str) -> Result<usize> {
        self.inner.store.clear(&format!("{region_pattern}*"))
    }

    /// Returns how many [`get`](Self::get) calls found a value.
    ///
    /// # Errors
    ///
    /// Returns a client error if the store fails or the counter was overwritten with
    /// something other than an integer.
    pub fn hits(&self) -> Result<u64> {
        self.counter(&self.inner.keys.hits_key)
    }

    /// Returns how many [`get`](Self::get) calls found nothing.
    ///
    /// # Errors
    ///
    /// Returns a client error if the store fails or the counter was overwritten with
    /// something other than an integer.
    pub fn misses(&self) -> Result<u64> {
        self.counter(&self.inner.keys.misses_key)
    }

    /// Returns `hits / (hits + misses)`, or zero before the first [`get`](Self::get).
    ///
    /// # Errors
    ///
    /// Returns a client error if either counter cannot be read.
    #[expect(clippy::cast_precision_loss, reason = "a rate does not need exact counts")]
    pub fn hit_rate(&self) -> Result<f64> {
        let hits = self.hits()?;
        let total = hits + self.misses()?;
        if total == 0 {
            return Ok(0.0);
        }
        Ok(hits as f64 / total as f64)
    }

    /// Approximates the bytes used by the cached values of this namespace.
    ///
    /// # Errors
    ///
    /// Returns a client error if the store fails.
    pub fn memory_size(&self) -> Result<usize> {
        let keys = self.physical_keys("*")?;
        self.inner.store.memory_size(&keys)
    }

    fn counter(&self, key: &str) -> Result<u64> {
        let Some(raw) = self.inner.store.get(key)? else {
            return Ok(0);
        };
        std::str::from_utf8(&raw)
            .ok()
            .and_then(|text| text.parse().ok())
            .ok_or_else(|| {
                ClientError::new(
                    self.inner.store.backend(),
                    ClientErrorKind::NotAnInteger,
                    format!("counter `{key}` does not hold a count"),
                )
                .into()
            })
    }
}

#[cfg(test)]
mod tests {
    use recall_store::testing::MockStore;

    use super::*;

    #[test]
    fn empty_and_reserved_namespaces_are_rejected() {
        for name in ["", "default"] {
            let err = Namespace::builder(name).build().unwrap_err();
            assert!(matches!(err, Error::Namespace { namespace } if namespace == name));
        }
    }

    #[test]
    fn key_space_layout() {
        let keys = KeySpace::new("g", "ns");
        assert_eq!(keys.cache_prefix, "g:ns:cache:");
        assert_eq!(keys.monitoring_prefix, "g:ns:monitoring:");
        assert_eq!(keys.hits_key, "g:ns:monitoring:*:hits");
        assert_eq!(keys.misses_key, "g:ns:monitoring:*:misses");
        assert_eq!(keys.time_cost_pattern, "g:ns:monitoring:*:time_cost");
    }

    #[test]
    fn glob_characters_in_namespace_are_escaped() {
        let keys = KeySpace::new("g", "team[a]*");
        assert_eq!(keys.cache_pattern, r"g:team\[a\]\*:cache:");
    }

    #[test]
    fn defaults() {
        let ns = Namespace::builder("n").build().unwrap();
        assert_eq!(ns.global_namespace(), DEFAULT_GLOBAL_NAMESPACE);
        assert_eq!(ns.default_expiry(), None);
        assert_eq!(ns.physical_key(Region::Monitoring, "x"), "recall:n:monitoring:x");
        assert_eq!(ns.time_cost_key("x"), "recall:n:monitoring:x:time_cost");
    }

    #[test]
    fn set_applies_default_expiry_only_without_ttl() {
        let store = MockStore::new();
        let ns = Namespace::builder("n")
            .default_expiry(Duration::from_secs(60))
            .store(Arc::new(store.clone()))
            .build()
            .unwrap();

        ns.set("a", b"1", &SetOptions::new()).unwrap();
        ns.set("b", b"1", &SetOptions::new().with_ttl(Duration::from_secs(5))).unwrap();

        assert_eq!(store.entry("recall:n:cache:a").unwrap().ttl(), Some(Duration::from_secs(60)));
        assert_eq!(store.entry("recall:n:cache:b").unwrap().ttl(), Some(Duration::from_secs(5)));
    }

    #[test]
    fn corrupt_counter_is_reported() {
        let store = MockStore::new();
        let ns = Namespace::builder("n").store(Arc::new(store.clone())).build().unwrap();
        store.set("recall:n:monitoring:*:hits", b"many", &SetOptions::new()).unwrap();

        let err = ns.hits().unwrap_err();
        assert_eq!(err.as_client().map(ClientError::kind), Some(ClientErrorKind::NotAnInteger));
    }
}
