//! Wallet session management.
//!
//! A [`Session`] is an authorized binding between the client and the
//! accounts the wallet controls. The session state machine has two states,
//! Disconnected and Connected: the application holds `Option<Session>`, and
//! `Some` means Connected. A session is created only by a successful
//! authorization request and destroyed only by logout; there is no partial
//! state in between.

use tracing::info;

use crate::provider::Provider;
use crate::types::Address;
use crate::wallet::WalletError;

/// An authorized wallet session.
///
/// Holds the ordered account addresses granted by the wallet. A `Session`
/// always has at least one account: an authorization that yields zero
/// accounts does not create a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    accounts: Vec<Address>,
}

impl Session {
    /// Requests account access from the provider and establishes a session.
    ///
    /// Returns `Ok(None)` when the wallet reports zero accounts: the
    /// session remains disconnected without an error, matching a user who
    /// dismissed the authorization request.
    ///
    /// # Errors
    ///
    /// Returns `WalletError` if the wallet rejected the request or its key
    /// material could not be loaded. No session is created on failure.
    pub fn establish(provider: &Provider) -> Result<Option<Self>, WalletError> {
        let accounts = provider.request_accounts()?;

        if accounts.is_empty() {
            info!("Wallet returned zero accounts; staying disconnected");
            return Ok(None);
        }

        info!(accounts = accounts.len(), "Session established");
        Ok(Some(Self { accounts }))
    }

    /// Returns the ordered accounts granted to this session.
    #[must_use]
    pub fn accounts(&self) -> &[Address] {
        &self.accounts
    }

    /// Returns the primary (first) account.
    #[must_use]
    pub fn primary_account(&self) -> &Address {
        // Construction guarantees at least one account.
        &self.accounts[0]
    }
}
