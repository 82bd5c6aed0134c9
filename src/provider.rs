use std::sync::Arc;

use crate::account::{AccountRef, LocalAccount};
use crate::config::MirrorConfig;
use crate::error::{Error, Result};
use crate::remote::RemoteAccountFetch;
use crate::store::MirrorStore;

/// The dedicated provider to handle local account initialization and
/// retrieval.
pub trait LocalAccountProvider: Send + Sync {
    /// Returns the mirror record identified by the login email, if any.
    fn get_by_email(&self, email: &str) -> Result<Option<LocalAccount>>;

    /// Returns the mirror record identified by the account unique ID, if any.
    fn get_by_id(&self, id: i64) -> Result<Option<LocalAccount>>;

    /// Returns the mirror record, creating it on first access.
    ///
    /// An existing record is returned unchanged and no remote call happens.
    /// Otherwise the authoritative account is fetched on behalf of the
    /// reference's email and identity ID, its fields are copied, and the new
    /// record is persisted once. Fails with [`Error::NotFound`] when the
    /// remote account cannot be resolved; nothing is persisted on failure.
    fn init_get(&self, reference: &AccountRef) -> Result<LocalAccount>;

    /// Persists the record in a single transactional write.
    fn save(&self, account: &LocalAccount) -> Result<()>;
}

/// [`LocalAccountProvider`] backed by the [`MirrorStore`] and a remote
/// account fetcher.
///
/// First creation is not mutually exclusive across concurrent callers: two
/// concurrent misses for the same email may both fetch and save. That race
/// is harmless, both writers derive identical fields from the same remote
/// source and the later write is an idempotent overwrite.
pub struct DbLocalAccountProvider {
    store: MirrorStore,
    remote: Arc<dyn RemoteAccountFetch>,
    default_zone: String,
}

impl DbLocalAccountProvider {
    pub fn new(
        store: MirrorStore,
        remote: Arc<dyn RemoteAccountFetch>,
        config: &MirrorConfig,
    ) -> Self {
        Self {
            store,
            remote,
            default_zone: config.default_zone.clone(),
        }
    }
}

impl LocalAccountProvider for DbLocalAccountProvider {
    fn get_by_email(&self, email: &str) -> Result<Option<LocalAccount>> {
        self.store.get_by_email(email)
    }

    fn get_by_id(&self, id: i64) -> Result<Option<LocalAccount>> {
        self.store.get_by_id(id)
    }

    fn init_get(&self, reference: &AccountRef) -> Result<LocalAccount> {
        if reference.email.is_empty() {
            return Err(Error::Validation("account email is mandatory".to_string()));
        }
        if reference.identity_id.is_empty() {
            return Err(Error::Validation(
                "account identity ID is mandatory".to_string(),
            ));
        }

        let existing = match reference.account_id {
            Some(id) => self.store.get_by_id(id)?,
            None => self.store.get_by_email(&reference.email)?,
        };
        if let Some(account) = existing {
            return Ok(account);
        }

        let snapshot = self.remote.fetch(reference)?;
        let account = LocalAccount::from_remote(reference, &snapshot, &self.default_zone);
        self.store.save(&account)?;
        log::info!("Local account just has been created: {:?}", account);

        Ok(account)
    }

    fn save(&self, account: &LocalAccount) -> Result<()> {
        self.store.save(account)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::AccountSnapshot;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct StubFetch {
        calls: AtomicUsize,
        result: Mutex<Result<AccountSnapshot>>,
    }

    impl StubFetch {
        fn returning(snapshot: AccountSnapshot) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                result: Mutex::new(Ok(snapshot)),
            }
        }

        fn failing(error: Error) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                result: Mutex::new(Err(error)),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl RemoteAccountFetch for StubFetch {
        fn fetch(&self, reference: &AccountRef) -> Result<AccountSnapshot> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &*self.result.lock().unwrap() {
                Ok(snapshot) => Ok(snapshot.clone()),
                Err(Error::NotFound(_)) => Err(Error::NotFound(reference.cache_identifier())),
                Err(_) => Err(Error::Fetch("remote call failed".to_string())),
            }
        }
    }

    fn snapshot() -> AccountSnapshot {
        AccountSnapshot {
            id: 985,
            email: "my.account@turnonline.biz".to_string(),
            identity_id: "Wh23h9kl".to_string(),
            locale: Some("en".to_string()),
            zone_id: None,
        }
    }

    fn provider(fetch: Arc<StubFetch>) -> Result<DbLocalAccountProvider> {
        Ok(DbLocalAccountProvider::new(
            MirrorStore::open_memory()?,
            fetch,
            &MirrorConfig::default(),
        ))
    }

    #[test]
    fn init_get_creates_on_first_access() -> anyhow::Result<()> {
        let fetch = Arc::new(StubFetch::returning(snapshot()));
        let provider = provider(fetch.clone())?;

        let reference = AccountRef::new("my.account@turnonline.biz", "Wh23h9kl");
        let account = provider.init_get(&reference)?;

        assert_eq!(account.id, 985);
        assert_eq!(account.email, "my.account@turnonline.biz");
        assert_eq!(account.identity_id, "Wh23h9kl");
        // The snapshot carried no zone, the fallback takes over.
        assert_eq!(account.zone, "Europe/Paris");
        assert_eq!(fetch.calls(), 1);

        // The record is durable and retrievable both ways.
        assert_eq!(provider.get_by_id(985)?, Some(account.clone()));
        assert_eq!(
            provider.get_by_email("my.account@turnonline.biz")?,
            Some(account)
        );
        Ok(())
    }

    #[test]
    fn init_get_hit_path_performs_no_fetch() -> anyhow::Result<()> {
        let fetch = Arc::new(StubFetch::returning(snapshot()));
        let provider = provider(fetch.clone())?;

        let reference = AccountRef::new("my.account@turnonline.biz", "Wh23h9kl");
        let created = provider.init_get(&reference)?;
        let again = provider.init_get(&reference)?;

        assert_eq!(created, again);
        assert_eq!(fetch.calls(), 1);

        // The id-primary variant hits the same record without a fetch.
        let by_id = reference.with_account_id(985);
        assert_eq!(provider.init_get(&by_id)?, created);
        assert_eq!(fetch.calls(), 1);
        Ok(())
    }

    #[test]
    fn init_get_propagates_not_found_without_partial_record() -> anyhow::Result<()> {
        let fetch = Arc::new(StubFetch::failing(Error::NotFound("985".to_string())));
        let provider = provider(fetch.clone())?;

        let reference =
            AccountRef::new("my.account@turnonline.biz", "Wh23h9kl").with_account_id(985);
        assert!(matches!(
            provider.init_get(&reference),
            Err(Error::NotFound(_))
        ));
        assert!(provider.get_by_id(985)?.is_none());
        assert!(provider.get_by_email("my.account@turnonline.biz")?.is_none());
        Ok(())
    }

    #[test]
    fn init_get_rejects_incomplete_reference() -> anyhow::Result<()> {
        let fetch = Arc::new(StubFetch::returning(snapshot()));
        let provider = provider(fetch.clone())?;

        let no_email = AccountRef::new("", "Wh23h9kl");
        assert!(matches!(
            provider.init_get(&no_email),
            Err(Error::Validation(_))
        ));

        let no_identity = AccountRef::new("my.account@turnonline.biz", "");
        assert!(matches!(
            provider.init_get(&no_identity),
            Err(Error::Validation(_))
        ));

        assert_eq!(fetch.calls(), 0);
        Ok(())
    }
}
