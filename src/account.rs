use serde::{Deserialize, Serialize};

/// Language substituted at read time when the account carries no locale.
/// Never persisted.
const DEFAULT_LOCALE: &str = "en";

/// The authoritative account record as published by the remote identity
/// service. Field names follow the upstream wire format.
#[derive(Serialize, Deserialize, Clone, Default, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AccountSnapshot {
    pub id: i64,
    pub email: String,
    pub identity_id: String,
    #[serde(default)]
    pub locale: Option<String>,
    #[serde(default)]
    pub zone_id: Option<String>,
}

/// The identifying triple for account resolution. The remote fetch is
/// authenticated on behalf of `email` and `identity_id`; `account_id` is
/// carried when the caller already knows the remote unique ID.
#[derive(Clone, Default, Debug, PartialEq)]
pub struct AccountRef {
    pub account_id: Option<i64>,
    pub email: String,
    pub identity_id: String,
}

impl AccountRef {
    pub fn new(email: &str, identity_id: &str) -> Self {
        Self {
            account_id: None,
            email: email.to_string(),
            identity_id: identity_id.to_string(),
        }
    }

    pub fn with_account_id(mut self, account_id: i64) -> Self {
        self.account_id = Some(account_id);
        self
    }

    /// Cache identifier of the account this reference points at, the unique
    /// ID when known, otherwise the login email.
    pub fn cache_identifier(&self) -> String {
        match self.account_id {
            Some(id) => id.to_string(),
            None => self.email.clone(),
        }
    }
}

/// The service local lightweight account.
///
/// A local representation of an account owned by the remote identity
/// service, intended to act as an owner of other local entities. The `id`
/// is the remote account's unique ID, the mirror never issues its own.
#[derive(Serialize, Deserialize, Clone, Default, Debug, PartialEq)]
pub struct LocalAccount {
    pub id: i64,
    pub email: String,
    pub identity_id: String,
    pub zone: String,
    pub locale: Option<String>,
}

impl LocalAccount {
    /// Builds the mirror record from a freshly fetched snapshot. The ID is
    /// taken from the reference when present, otherwise from the snapshot;
    /// `default_zone` fills in when the snapshot carries no zone.
    pub fn from_remote(
        reference: &AccountRef,
        snapshot: &AccountSnapshot,
        default_zone: &str,
    ) -> Self {
        let zone = match snapshot.zone_id.as_deref() {
            Some(zone) if !zone.is_empty() => zone.to_string(),
            _ => default_zone.to_string(),
        };

        Self {
            id: reference.account_id.unwrap_or(snapshot.id),
            email: reference.email.clone(),
            identity_id: snapshot.identity_id.clone(),
            zone,
            locale: snapshot.locale.clone(),
        }
    }

    /// Returns the account language, always a value. Falls back to the
    /// service default when none has been stored.
    pub fn resolved_locale(&self) -> String {
        match self.locale.as_deref() {
            Some(locale) if !locale.is_empty() => locale.to_string(),
            _ => {
                log::warn!("Using service default locale: {}", DEFAULT_LOCALE);
                DEFAULT_LOCALE.to_string()
            }
        }
    }
}
