use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

use crate::config::MirrorConfig;

/// Backend failures stay inside the cache layer, the provider never sees
/// them. See `ResourceCache` for the fail-open behavior.
#[derive(Debug, Error)]
#[error("cache backend failure: {0}")]
pub struct CacheError(pub String);

/// Expiring byte store the resource cache writes through. The backend owns
/// its memory and eviction policy.
pub trait CacheBackend: Send + Sync {
    /// Returns the payload stored under `key`, or `None` when absent or
    /// expired.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError>;

    fn put(&self, key: &str, value: Vec<u8>, expires_at: Instant) -> Result<(), CacheError>;
}

/// HashMap backed cache store. Clones share the same underlying map.
#[derive(Clone, Default)]
pub struct InMemoryCacheBackend {
    entries: Arc<RwLock<HashMap<String, (Vec<u8>, Instant)>>>,
}

impl InMemoryCacheBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CacheBackend for InMemoryCacheBackend {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let entries = self
            .entries
            .read()
            .map_err(|_| CacheError("failed to acquire read lock".to_string()))?;
        let value = match entries.get(key) {
            Some((value, expires_at)) if *expires_at > Instant::now() => Some(value.clone()),
            _ => None,
        };
        log::debug!("CACHE GET: key='{}', hit={}", key, value.is_some());
        Ok(value)
    }

    fn put(&self, key: &str, value: Vec<u8>, expires_at: Instant) -> Result<(), CacheError> {
        log::debug!("CACHE PUT: key='{}', size={} bytes", key, value.len());
        let mut entries = self
            .entries
            .write()
            .map_err(|_| CacheError("failed to acquire write lock".to_string()))?;
        let now = Instant::now();
        entries.retain(|_, (_, expiry)| *expiry > now);
        entries.insert(key.to_string(), (value, expires_at));
        Ok(())
    }
}

/// Cache-aside provider for one concrete resource type, keyed by
/// `service :: TypeName :: identifier`. Values live for the configured TTL
/// (3600 seconds unless overridden per put).
///
/// Caching is an optimization only. Every failure, whether serialization or
/// backend, is logged and turned into a miss so the caller's primary
/// operation never fails on account of the cache.
#[derive(Clone)]
pub struct ResourceCache<T> {
    service_name: String,
    default_ttl: Duration,
    backend: Arc<dyn CacheBackend>,
    _resource: PhantomData<fn() -> T>,
}

impl<T: Serialize + DeserializeOwned> ResourceCache<T> {
    pub fn new(config: &MirrorConfig, backend: Arc<dyn CacheBackend>) -> Self {
        Self {
            service_name: config.service_name.clone(),
            default_ttl: config.cache_ttl,
            backend,
            _resource: PhantomData,
        }
    }

    /// Returns the cached resource under `identifier`, or `None` on absence,
    /// expiry, or any failure.
    pub fn get(&self, identifier: &str) -> Option<T> {
        let key = self.full_key(identifier);
        let payload = match self.backend.get(&key) {
            Ok(Some(payload)) => payload,
            Ok(None) => return None,
            Err(e) => {
                log::error!("Cache get has failed for key '{}': {}", key, e);
                return None;
            }
        };

        match serde_json::from_slice(&payload) {
            Ok(value) => Some(value),
            Err(e) => {
                log::error!("Parsing of a cached payload for '{}' has failed: {}", key, e);
                None
            }
        }
    }

    /// Stores the resource under `identifier` for `ttl`, or the configured
    /// default lifetime when none is given. Best effort, never fails the
    /// caller.
    pub fn put(&self, identifier: &str, value: &T, ttl: Option<Duration>) {
        let key = self.full_key(identifier);
        let payload = match serde_json::to_vec(value) {
            Ok(payload) => payload,
            Err(e) => {
                log::error!("Serialization has failed for key '{}': {}", key, e);
                return;
            }
        };

        let expires_at = Instant::now() + ttl.unwrap_or(self.default_ttl);
        if let Err(e) = self.backend.put(&key, payload, expires_at) {
            log::error!("Cache put has failed for key '{}': {}", key, e);
        }
    }

    fn full_key(&self, identifier: &str) -> String {
        format!(
            "{}::{}::{}",
            self.service_name,
            Self::resource_name(),
            identifier
        )
    }

    /// Bare type name of the cached resource, without the module path.
    fn resource_name() -> &'static str {
        let full_name = std::any::type_name::<T>();
        full_name.split("::").last().unwrap_or(full_name)
    }
}
