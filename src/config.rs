use std::time::Duration;

/// Service level settings shared by the cache and the account provider.
#[derive(Debug, Clone)]
pub struct MirrorConfig {
    /// Namespace prefix of every cache key, keeps entries of several
    /// services apart when they share a backend.
    pub service_name: String,
    /// Fallback IANA time-zone ID used when the remote account carries none.
    pub default_zone: String,
    /// How long a cached resource stays valid unless the caller says otherwise.
    pub cache_ttl: Duration,
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self {
            service_name: "origin".to_string(),
            default_zone: "Europe/Paris".to_string(),
            cache_ttl: Duration::from_secs(3600),
        }
    }
}
