use thiserror::Error;

/// Failure taxonomy of the mirror core.
///
/// Cache failures never show up here. The resource cache is best effort and
/// absorbs its own serialization and backend errors, see `cache`.
#[derive(Debug, Error)]
pub enum Error {
    /// The remote account does not exist for the given identity.
    #[error("remote account not found for {0}")]
    NotFound(String),

    /// An inbound change message or an identifying reference is incomplete
    /// or malformed.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The remote fetch failed for a reason other than a missing account.
    #[error("remote account fetch failed: {0}")]
    Fetch(String),

    #[error("store operation failed: {0}")]
    Store(#[from] rusqlite::Error),

    #[error("schema migration failed: {0}")]
    Migration(#[from] rusqlite_migration::Error),

    #[error("row mapping failed: {0}")]
    Mapping(#[from] serde_rusqlite::Error),

    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("store lock poisoned")]
    LockPoisoned,
}

pub type Result<T> = std::result::Result<T, Error>;
