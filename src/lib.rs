pub mod account;
pub mod cache;
pub mod config;
pub mod error;
pub mod provider;
pub mod remote;
pub mod store;
pub mod subscription;

pub use account::{AccountRef, AccountSnapshot, LocalAccount};
pub use cache::{CacheBackend, InMemoryCacheBackend, ResourceCache};
pub use config::MirrorConfig;
pub use error::{Error, Result};
pub use provider::{DbLocalAccountProvider, LocalAccountProvider};
pub use remote::{CachedAccountFetch, RemoteAccountFetch};
pub use store::MirrorStore;
pub use subscription::{AccountChangeSubscription, ChangeCommand, ChangeMessage};
pub use rusqlite;
