use std::sync::Arc;

use crate::account::{AccountRef, AccountSnapshot};
use crate::cache::{CacheBackend, ResourceCache};
use crate::config::MirrorConfig;
use crate::error::Result;

/// Boundary to the remote identity service.
///
/// Implementations resolve the account by its unique ID when the reference
/// carries one, otherwise by the login email, and authenticate the call on
/// behalf of the reference's email and identity ID. An absent account is
/// reported as [`Error::NotFound`], anything else as [`Error::Fetch`].
pub trait RemoteAccountFetch: Send + Sync {
    fn fetch(&self, reference: &AccountRef) -> Result<AccountSnapshot>;
}

/// Cache-aside wrapper around a remote fetcher. A cache hit skips the remote
/// call entirely; a miss fetches and best-effort populates the cache. The
/// cache is never invalidated when the mirror is updated, a bounded
/// staleness window is accepted.
pub struct CachedAccountFetch<F> {
    inner: F,
    cache: ResourceCache<AccountSnapshot>,
}

impl<F: RemoteAccountFetch> CachedAccountFetch<F> {
    pub fn new(inner: F, config: &MirrorConfig, backend: Arc<dyn CacheBackend>) -> Self {
        Self {
            inner,
            cache: ResourceCache::new(config, backend),
        }
    }
}

impl<F: RemoteAccountFetch> RemoteAccountFetch for CachedAccountFetch<F> {
    fn fetch(&self, reference: &AccountRef) -> Result<AccountSnapshot> {
        let identifier = reference.cache_identifier();
        if let Some(snapshot) = self.cache.get(&identifier) {
            log::debug!("Remote account '{}' served from cache", identifier);
            return Ok(snapshot);
        }

        let snapshot = self.inner.fetch(reference)?;
        self.cache.put(&identifier, &snapshot, None);
        Ok(snapshot)
    }
}
