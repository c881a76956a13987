//! Auth service - registration, login, refresh rotation and logout
//!
//! Session lifecycle per account:
//!
//! ```text
//! Anonymous --login--> Authenticated --refresh--> Authenticated' (slot rotated)
//!     ^                     |   |
//!     +------logout---------+   +--stale/reused token--> Rejected (log in again)
//! ```
//!
//! The service keeps no mutable state of its own; the account store is the
//! single source of truth, and the refresh slot is rotated with a
//! compare-and-swap so two concurrent refreshes can never both win.

use std::path::Path;
use std::sync::Arc;

use crate::auth::{PasswordGate, TokenCodec, TokenError};
use crate::db::AccountStore;
use crate::error::{Error, Result};
use crate::models::{
    AccountResponse, LoginRequest, LoginResponse, NewAccount, RegisterRequest, TokenKind,
    TokenPair,
};
use crate::services::session::{SessionPolicy, SessionStore, SESSION_POLICY};
use crate::services::upload::UploadService;

const MSG_INVALID_CREDENTIALS: &str = "Invalid user credentials";
const MSG_REFRESH_MISSING: &str = "Unauthorized request: refresh token missing";
const MSG_REFRESH_INVALID_OR_EXPIRED: &str = "Invalid or expired refresh token";
const MSG_REFRESH_INVALID: &str = "Invalid refresh token";
const MSG_REFRESH_USED: &str = "Refresh token is expired or used";
const MSG_ACCESS_INVALID: &str = "Invalid access token";

pub struct AuthService {
    accounts: Arc<dyn AccountStore>,
    sessions: SessionStore,
    uploads: Arc<dyn UploadService>,
    tokens: TokenCodec,
    passwords: PasswordGate,
}

impl AuthService {
    pub fn new(
        accounts: Arc<dyn AccountStore>,
        uploads: Arc<dyn UploadService>,
        tokens: TokenCodec,
        passwords: PasswordGate,
    ) -> Self {
        let sessions = SessionStore::new(accounts.clone());
        Self {
            accounts,
            sessions,
            uploads,
            tokens,
            passwords,
        }
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Register a new account
    pub async fn register(&self, req: RegisterRequest) -> Result<AccountResponse> {
        let full_name = trimmed(req.full_name.as_deref());
        let email = trimmed(req.email.as_deref());
        let user_name = trimmed(req.user_name.as_deref());
        let password = req.password.as_deref().filter(|p| !p.trim().is_empty());

        let missing: Vec<&str> = [
            ("fullName", full_name.is_none()),
            ("email", email.is_none()),
            ("userName", user_name.is_none()),
            ("password", password.is_none()),
        ]
        .into_iter()
        .filter_map(|(field, is_missing)| is_missing.then_some(field))
        .collect();

        let (Some(full_name), Some(email), Some(user_name), Some(password)) =
            (full_name, email, user_name, password)
        else {
            return Err(Error::validation(format!(
                "All fields are required: {}",
                missing.join(", ")
            )));
        };

        let user_name = user_name.to_lowercase();

        if self
            .accounts
            .find_by_identifier(Some(&user_name), Some(email))
            .await?
            .is_some()
        {
            return Err(Error::conflict("User with email or username already exists"));
        }

        let avatar_path = req
            .avatar
            .as_deref()
            .ok_or_else(|| Error::validation("Avatar file is required"))?;

        let avatar_url = self.upload_avatar(avatar_path).await?;
        let cover_image_url = match req.cover_image.as_deref() {
            Some(path) => self.upload_cover_image(path).await,
            None => String::new(),
        };

        let password_hash = self.passwords.hash(password).await?;

        let created = self
            .accounts
            .create(NewAccount {
                full_name: full_name.to_string(),
                user_name,
                email: email.to_string(),
                password_hash,
                avatar_url,
                cover_image_url,
            })
            .await?;

        let account = self
            .accounts
            .find_by_id(&created.id)
            .await?
            .ok_or_else(|| Error::persistence("Something went wrong while registering the user"))?;

        log::info!("[auth] Registered account {} ({})", account.user_name, account.id);
        Ok(AccountResponse::from(account))
    }

    async fn upload_avatar(&self, path: &Path) -> Result<String> {
        match self.uploads.upload(path).await {
            Ok(file) => Ok(file.url),
            Err(err) => {
                log::error!("[auth] Avatar upload failed: {}", err);
                Err(Error::upload("Avatar file upload failed"))
            }
        }
    }

    /// Cover images are optional, so a failed upload only costs the image
    async fn upload_cover_image(&self, path: &Path) -> String {
        match self.uploads.upload(path).await {
            Ok(file) => file.url,
            Err(err) => {
                log::warn!("[auth] Cover image upload failed, continuing without it: {}", err);
                String::new()
            }
        }
    }

    /// Log in with a user name and/or email
    pub async fn login(&self, req: LoginRequest) -> Result<LoginResponse> {
        let user_name = trimmed(req.user_name.as_deref()).map(str::to_lowercase);
        let email = trimmed(req.email.as_deref());

        if user_name.is_none() && email.is_none() {
            return Err(Error::validation("Username or email is required"));
        }

        let account = self
            .accounts
            .find_by_identifier(user_name.as_deref(), email)
            .await?
            .ok_or_else(|| Error::not_found("User does not exist"))?;

        if !self.passwords.verify(&req.password, &account.password_hash).await? {
            log::debug!("[auth] Password mismatch for {}", account.id);
            return Err(Error::unauthorized(MSG_INVALID_CREDENTIALS));
        }

        let pair = self.issue_pair(&account.id)?;
        match SESSION_POLICY {
            SessionPolicy::SingleSlot => {
                self.sessions
                    .set_refresh_token(&account.id, Some(&pair.refresh_token))
                    .await?
            }
        }

        log::info!("[auth] Account {} logged in", account.id);
        Ok(LoginResponse {
            user: AccountResponse::from(account),
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
        })
    }

    /// Exchange the live refresh token for a new pair, rotating the slot
    pub async fn refresh(&self, presented: Option<&str>) -> Result<TokenPair> {
        let presented = trimmed(presented).ok_or_else(|| Error::unauthorized(MSG_REFRESH_MISSING))?;

        let claims = self
            .tokens
            .verify(presented, TokenKind::Refresh)
            .map_err(|err| {
                match err {
                    TokenError::Expired => log::debug!("[auth] Refresh token expired"),
                    other => log::warn!("[auth] Refresh token rejected: {}", other),
                }
                Error::unauthorized(MSG_REFRESH_INVALID_OR_EXPIRED)
            })?;

        let stored = match self.sessions.get_refresh_token(&claims.sub).await {
            Ok(stored) => stored,
            Err(Error::NotFound(_)) => return Err(Error::unauthorized(MSG_REFRESH_INVALID)),
            Err(err) => return Err(err),
        };

        if stored.as_deref() != Some(presented) {
            log::warn!(
                "[auth] Superseded refresh token presented for account {}",
                claims.sub
            );
            return Err(Error::unauthorized(MSG_REFRESH_USED));
        }

        let pair = self.issue_pair(&claims.sub)?;
        if !self
            .sessions
            .rotate_refresh_token(&claims.sub, presented, &pair.refresh_token)
            .await?
        {
            log::warn!(
                "[auth] Lost refresh rotation race for account {}",
                claims.sub
            );
            return Err(Error::unauthorized(MSG_REFRESH_USED));
        }

        log::debug!("[auth] Rotated refresh token for account {}", claims.sub);
        Ok(pair)
    }

    /// Clear the account's refresh slot. Clearing an empty slot is fine.
    pub async fn logout(&self, account_id: &str) -> Result<()> {
        self.sessions.set_refresh_token(account_id, None).await?;
        log::info!("[auth] Account {} logged out", account_id);
        Ok(())
    }

    /// Resolve an access token to the account it was issued for
    pub async fn authenticate(&self, access_token: &str) -> Result<AccountResponse> {
        let claims = self
            .tokens
            .verify(access_token, TokenKind::Access)
            .map_err(|err| {
                log::debug!("[auth] Access token rejected: {}", err);
                Error::unauthorized(MSG_ACCESS_INVALID)
            })?;

        let account = self
            .accounts
            .find_by_id(&claims.sub)
            .await?
            .ok_or_else(|| Error::unauthorized(MSG_ACCESS_INVALID))?;

        Ok(AccountResponse::from(account))
    }

    fn issue_pair(&self, account_id: &str) -> Result<TokenPair> {
        Ok(TokenPair {
            access_token: self.tokens.issue(account_id, TokenKind::Access)?,
            refresh_token: self.tokens.issue(account_id, TokenKind::Refresh)?,
        })
    }
}

fn trimmed(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
