//! Refresh-token slot adapter
//!
//! Each account holds at most one live refresh token. This module is the
//! only place the auth flows touch that slot, so they never deal with the
//! storage technology directly.

use std::sync::Arc;

use crate::db::AccountStore;
use crate::error::{Error, Result};

/// How many refresh tokens an account may hold at once
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPolicy {
    /// One slot per account. A new login overwrites it, signing out any
    /// other session for the same account.
    SingleSlot,
}

/// Active session policy
pub const SESSION_POLICY: SessionPolicy = SessionPolicy::SingleSlot;

#[derive(Clone)]
pub struct SessionStore {
    accounts: Arc<dyn AccountStore>,
}

impl SessionStore {
    pub fn new(accounts: Arc<dyn AccountStore>) -> Self {
        Self { accounts }
    }

    /// Overwrite (or clear, with `None`) the stored refresh token
    pub async fn set_refresh_token(&self, account_id: &str, token: Option<&str>) -> Result<()> {
        self.accounts.set_refresh_token(account_id, token).await
    }

    /// Read the stored refresh token. `Ok(None)` means no active session.
    pub async fn get_refresh_token(&self, account_id: &str) -> Result<Option<String>> {
        let account = self
            .accounts
            .find_by_id(account_id)
            .await?
            .ok_or_else(|| Error::not_found(format!("Account {} not found", account_id)))?;
        Ok(account.refresh_token)
    }

    /// Swap `expected` for `next` atomically. `false` means the slot no longer
    /// held `expected`, so another caller rotated or cleared it first.
    pub async fn rotate_refresh_token(&self, account_id: &str, expected: &str, next: &str) -> Result<bool> {
        self.accounts
            .replace_refresh_token_if(account_id, expected, next)
            .await
    }
}
