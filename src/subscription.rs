use std::collections::HashMap;
use std::sync::Arc;

use crate::account::{AccountRef, AccountSnapshot, LocalAccount};
use crate::error::Result;
use crate::provider::LocalAccountProvider;

/// Attribute names of an inbound change message.
pub const DATA_TYPE: &str = "DataType";
pub const ENCODED_UNIQUE_KEY: &str = "EncodedUniqueKey";
pub const ACCOUNT_UNIQUE_ID: &str = "AccountUniqueId";
pub const ACCOUNT_EMAIL: &str = "AccountEmail";
pub const ACCOUNT_IDENTITY_ID: &str = "AccountIdentityId";
pub const ACCOUNT_SIGN_UP: &str = "AccountSignUp";

/// The one data type this subscription understands.
const ACCOUNT_DATA_TYPE: &str = "Account";

const MANDATORY: [&str; 5] = [
    DATA_TYPE,
    ENCODED_UNIQUE_KEY,
    ACCOUNT_UNIQUE_ID,
    ACCOUNT_EMAIL,
    ACCOUNT_IDENTITY_ID,
];

/// An inbound change notification as handed over by the delivery transport:
/// string attributes plus the serialized snapshot payload.
#[derive(Clone, Default, Debug)]
pub struct ChangeMessage {
    pub attributes: HashMap<String, String>,
    pub data: Vec<u8>,
}

impl ChangeMessage {
    pub fn new(data: Vec<u8>) -> Self {
        Self {
            attributes: HashMap::new(),
            data,
        }
    }

    pub fn with_attribute(mut self, name: &str, value: &str) -> Self {
        self.attributes.insert(name.to_string(), value.to_string());
        self
    }
}

/// Typed view over a [`ChangeMessage`]'s attributes.
pub struct ChangeCommand<'a> {
    message: &'a ChangeMessage,
}

impl<'a> ChangeCommand<'a> {
    pub fn new(message: &'a ChangeMessage) -> Self {
        Self { message }
    }

    /// True only if every listed attribute is present and non-empty.
    pub fn validate(&self, mandatory: &[&str]) -> bool {
        mandatory.iter().all(|name| {
            self.message
                .attributes
                .get(*name)
                .map(|value| !value.is_empty())
                .unwrap_or(false)
        })
    }

    pub fn data_type(&self) -> Option<&str> {
        self.attribute(DATA_TYPE)
    }

    pub fn account_email(&self) -> Option<&str> {
        self.attribute(ACCOUNT_EMAIL)
    }

    pub fn account_identity_id(&self) -> Option<&str> {
        self.attribute(ACCOUNT_IDENTITY_ID)
    }

    /// The remote account unique ID, `None` when absent or not numeric.
    pub fn account_id(&self) -> Option<i64> {
        self.attribute(ACCOUNT_UNIQUE_ID)?.parse().ok()
    }

    pub fn encoded_unique_key(&self) -> Option<&str> {
        self.attribute(ENCODED_UNIQUE_KEY)
    }

    pub fn is_account_sign_up(&self) -> bool {
        self.attribute(ACCOUNT_SIGN_UP)
            .map(|value| value == "true")
            .unwrap_or(false)
    }

    fn attribute(&self, name: &str) -> Option<&str> {
        self.message.attributes.get(name).map(String::as_str)
    }
}

/// The 'account.changes' subscription listener.
///
/// Per message: validates the attributes, resolves the mirror record
/// (creating it on first contact), then updates zone, login email and locale
/// from the remote snapshot when any of those values has actually changed.
/// A message that changes nothing writes nothing, so at-least-once
/// redelivery is a store no-op.
pub struct AccountChangeSubscription {
    provider: Arc<dyn LocalAccountProvider>,
}

impl AccountChangeSubscription {
    pub fn new(provider: Arc<dyn LocalAccountProvider>) -> Self {
        Self { provider }
    }

    /// Handles one inbound message. Malformed or uninteresting messages are
    /// logged and dropped without side effects; fetch and store failures
    /// propagate to the delivery transport.
    pub fn on_message(&self, message: &ChangeMessage, subscription: &str) -> Result<()> {
        let command = ChangeCommand::new(message);
        if !command.validate(&MANDATORY) {
            log::error!(
                "Some of the mandatory attributes {:?} are missing, incoming attributes: {:?}",
                MANDATORY,
                message.attributes
            );
            return Ok(());
        }

        let data_type = command.data_type().unwrap_or_default();
        if data_type != ACCOUNT_DATA_TYPE {
            log::info!("Uninterested data type '{}'", data_type);
            return Ok(());
        }

        let account_id = match command.account_id() {
            Some(id) => id,
            None => {
                log::error!(
                    "Attribute {} is not a valid account ID: {:?}",
                    ACCOUNT_UNIQUE_ID,
                    command.attribute(ACCOUNT_UNIQUE_ID)
                );
                return Ok(());
            }
        };

        log::info!(
            "[{}] {} has been received with length: {} and unique ID: '{}'. Is new account sign-up: {}",
            subscription,
            data_type,
            message.data.len(),
            account_id,
            command.is_account_sign_up()
        );

        let snapshot: AccountSnapshot = match serde_json::from_slice(&message.data) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                log::error!(
                    "Undecodable {} payload for unique ID '{}': {}",
                    data_type,
                    account_id,
                    e
                );
                return Ok(());
            }
        };

        let reference = AccountRef::new(
            command.account_email().unwrap_or_default(),
            command.account_identity_id().unwrap_or_default(),
        )
        .with_account_id(account_id);

        let local = self.provider.init_get(&reference)?;
        self.reconcile(local, &snapshot)
    }

    /// Diffs the three reconciled fields and persists at most once.
    fn reconcile(&self, mut local: LocalAccount, remote: &AccountSnapshot) -> Result<()> {
        let mut changed = false;

        // Zone, only when the remote value is present.
        if let Some(zone) = remote.zone_id.as_deref() {
            if !zone.is_empty() && zone != local.zone {
                log::info!("Zone ID has changed from '{}' to '{}'", local.zone, zone);
                local.zone = zone.to_string();
                changed = true;
            }
        }

        // Login email, compared case-insensitively but stored with the
        // remote's exact casing.
        if !remote.email.eq_ignore_ascii_case(&local.email) {
            log::info!(
                "Login email has changed from '{}' to '{}'",
                local.email,
                remote.email
            );
            local.email = remote.email.clone();
            changed = true;
        }

        // Locale, only when the remote value is present; compared against
        // the resolved value so the read-time default never causes a write.
        if let Some(locale) = remote.locale.as_deref() {
            if !locale.is_empty() && locale != local.resolved_locale() {
                log::info!(
                    "Account locale has changed from '{}' to '{}'",
                    local.resolved_locale(),
                    locale
                );
                local.locale = Some(locale.to_string());
                changed = true;
            }
        }

        if changed {
            self.provider.save(&local)?;
        }
        Ok(())
    }
}
