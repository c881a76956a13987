//! Data models for Gatekeep

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Account model
///
/// `password_hash` and `refresh_token` never leave the core; callers only
/// ever see [`AccountResponse`].
#[derive(Debug, Clone, FromRow)]
pub struct Account {
    pub id: String,
    pub full_name: String,
    pub user_name: String, // always lowercase
    pub email: String,
    pub password_hash: String,
    pub avatar_url: String,
    pub cover_image_url: String, // empty when no cover image
    pub refresh_token: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Account response (without sensitive fields)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountResponse {
    pub id: String,
    pub full_name: String,
    pub user_name: String,
    pub email: String,
    pub avatar_url: String,
    pub cover_image_url: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Account> for AccountResponse {
    fn from(account: Account) -> Self {
        Self {
            id: account.id,
            full_name: account.full_name,
            user_name: account.user_name,
            email: account.email,
            avatar_url: account.avatar_url,
            cover_image_url: account.cover_image_url,
            created_at: account.created_at,
            updated_at: account.updated_at,
        }
    }
}

/// Fields needed to insert a new account
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub full_name: String,
    pub user_name: String,
    pub email: String,
    pub password_hash: String,
    pub avatar_url: String,
    pub cover_image_url: String,
}

/// Registration input. Image sources are local file paths handed to the
/// upload service.
#[derive(Debug, Clone, Default)]
pub struct RegisterRequest {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub user_name: Option<String>,
    pub password: Option<String>,
    pub avatar: Option<PathBuf>,
    pub cover_image: Option<PathBuf>,
}

/// Login input. At least one identifier must be present.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub password: String,
}

/// Which credential family a token belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// JWT claims
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // account id
    pub iat: i64,
    pub exp: i64,
    pub jti: String, // random per token so reissues never collide
    pub kind: TokenKind,
}

/// An access/refresh pair handed to a caller at login or refresh
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Result of a successful login
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub user: AccountResponse,
    pub access_token: String,
    pub refresh_token: String,
}
