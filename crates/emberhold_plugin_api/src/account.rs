//! # Account Slice
//!
//! Thin contract over the host's external account store: the event fired
//! when an account is created, plus the two login failures plugins can
//! observe. Neither failure is recoverable plugin-side — the host's
//! top-level handler logs it and translates it into a client-facing
//! disconnect.

use crate::types::{require_non_empty, ClientId, ValidationError};
use crate::utils::current_timestamp;
use serde::{Deserialize, Serialize};

/// Login failures surfaced by the host's account layer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AccountError {
    /// The account is already in use by another connected client.
    #[error("account '{account_name}' is already in use by another client")]
    AccountInUse { account_name: String },
    /// The client is already authenticated on this session.
    #[error("client {client_id} is already logged in")]
    AlreadyLoggedIn { client_id: ClientId },
}

impl AccountError {
    pub fn account_in_use(account_name: impl Into<String>) -> Self {
        Self::AccountInUse {
            account_name: account_name.into(),
        }
    }

    pub fn already_logged_in(client_id: ClientId) -> Self {
        Self::AlreadyLoggedIn { client_id }
    }

    /// The offending account name, when the failure carries one.
    pub fn account_name(&self) -> Option<&str> {
        match self {
            Self::AccountInUse { account_name } => Some(account_name),
            Self::AlreadyLoggedIn { .. } => None,
        }
    }
}

/// Fired when the host's account store creates a new account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountCreatedEvent {
    account_name: String,
    timestamp: u64,
}

impl AccountCreatedEvent {
    pub fn new(account_name: impl Into<String>) -> Result<Self, ValidationError> {
        let account_name = account_name.into();
        require_non_empty("account_name", &account_name)?;
        Ok(Self {
            account_name,
            timestamp: current_timestamp(),
        })
    }

    pub fn account_name(&self) -> &str {
        &self.account_name
    }

    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }
}
