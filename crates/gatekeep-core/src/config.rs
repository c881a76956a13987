//! Token configuration
//!
//! Signing secrets and validity windows are handed to the token codec at
//! construction. Nothing here reads process-wide state.

use chrono::Duration;
use rand::Rng;

use crate::error::{Error, Result};
use crate::models::TokenKind;

/// Default access token lifetime
pub const ACCESS_TOKEN_TTL_MINUTES: i64 = 15;
/// Default refresh token lifetime
pub const REFRESH_TOKEN_TTL_DAYS: i64 = 10;
/// Longest lifetime accepted for either token kind
pub const MAX_TOKEN_TTL_DAYS: i64 = 3650;

const RECOMMENDED_SECRET_LEN: usize = 32;
const GENERATED_SECRET_LEN: usize = 64;

/// Secrets and lifetimes for both token kinds
#[derive(Clone)]
pub struct TokenConfig {
    access_secret: Vec<u8>,
    refresh_secret: Vec<u8>,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl std::fmt::Debug for TokenConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenConfig")
            .field("access_secret", &"<redacted>")
            .field("refresh_secret", &"<redacted>")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish()
    }
}

impl TokenConfig {
    /// Build a config from explicit secrets using the default lifetimes.
    ///
    /// Fails if either secret is empty or both secrets are identical.
    pub fn new(access_secret: impl Into<Vec<u8>>, refresh_secret: impl Into<Vec<u8>>) -> Result<Self> {
        let access_secret = access_secret.into();
        let refresh_secret = refresh_secret.into();

        if access_secret.is_empty() || refresh_secret.is_empty() {
            return Err(Error::config("Token signing secrets must not be empty"));
        }
        if access_secret == refresh_secret {
            return Err(Error::config(
                "Access and refresh tokens must be signed with different secrets",
            ));
        }
        for (name, secret) in [("access", &access_secret), ("refresh", &refresh_secret)] {
            if secret.len() < RECOMMENDED_SECRET_LEN {
                log::warn!(
                    "[config] The {} token secret is shorter than {} bytes. Consider using a longer secret.",
                    name,
                    RECOMMENDED_SECRET_LEN
                );
            }
        }

        Ok(Self {
            access_secret,
            refresh_secret,
            access_ttl: Duration::minutes(ACCESS_TOKEN_TTL_MINUTES),
            refresh_ttl: Duration::days(REFRESH_TOKEN_TTL_DAYS),
        })
    }

    /// Build a config from optional secrets, generating a random secret for
    /// each one that is missing. Generated secrets only live for this process,
    /// so tokens will not survive a restart.
    pub fn from_optional_secrets(access: Option<String>, refresh: Option<String>) -> Result<Self> {
        let access = resolve_secret(access, "access");
        let refresh = resolve_secret(refresh, "refresh");
        Self::new(access, refresh)
    }

    /// Override the access token lifetime
    pub fn with_access_ttl(mut self, ttl: Duration) -> Result<Self> {
        self.access_ttl = check_ttl(ttl, "Access")?;
        Ok(self)
    }

    /// Override the refresh token lifetime
    pub fn with_refresh_ttl(mut self, ttl: Duration) -> Result<Self> {
        self.refresh_ttl = check_ttl(ttl, "Refresh")?;
        Ok(self)
    }

    pub fn secret(&self, kind: TokenKind) -> &[u8] {
        match kind {
            TokenKind::Access => &self.access_secret,
            TokenKind::Refresh => &self.refresh_secret,
        }
    }

    pub fn ttl(&self, kind: TokenKind) -> Duration {
        match kind {
            TokenKind::Access => self.access_ttl,
            TokenKind::Refresh => self.refresh_ttl,
        }
    }
}

fn check_ttl(ttl: Duration, name: &str) -> Result<Duration> {
    if ttl <= Duration::zero() {
        return Err(Error::config(format!("{} token lifetime must be positive", name)));
    }
    if ttl > Duration::days(MAX_TOKEN_TTL_DAYS) {
        return Err(Error::config(format!(
            "{} token lifetime must not exceed {} days",
            name, MAX_TOKEN_TTL_DAYS
        )));
    }
    Ok(ttl)
}

fn resolve_secret(secret: Option<String>, name: &str) -> Vec<u8> {
    match secret {
        Some(secret) if !secret.is_empty() => secret.into_bytes(),
        _ => {
            log::warn!(
                "[config] No {} token secret configured. Generating a random secret. Tokens won't persist across restarts.",
                name
            );
            let mut rng = rand::thread_rng();
            (0..GENERATED_SECRET_LEN).map(|_| rng.gen::<u8>()).collect()
        }
    }
}
