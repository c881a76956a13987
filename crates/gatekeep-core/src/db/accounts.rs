//! Account storage layer
//!
//! [`AccountStore`] is the seam between the auth flows and whatever keeps
//! account records. [`SqliteAccountStore`] is the SQLite implementation.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use super::Database;
use crate::error::{Error, Result};
use crate::models::{Account, NewAccount};

/// Keyed account storage
#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn find_by_id(&self, id: &str) -> Result<Option<Account>>;

    /// Find the account matching `user_name` OR `email`. Values are compared
    /// exactly as stored.
    async fn find_by_identifier(
        &self,
        user_name: Option<&str>,
        email: Option<&str>,
    ) -> Result<Option<Account>>;

    /// Insert a new account with an empty refresh slot. A uniqueness clash on
    /// user name or email is a [`Error::Conflict`].
    async fn create(&self, account: NewAccount) -> Result<Account>;

    /// Overwrite the refresh slot. [`Error::NotFound`] when `id` is unknown.
    async fn set_refresh_token(&self, id: &str, token: Option<&str>) -> Result<()>;

    /// Write `next` only if the slot currently holds `expected`. Returns
    /// whether the write happened.
    async fn replace_refresh_token_if(&self, id: &str, expected: &str, next: &str) -> Result<bool>;
}

/// SQLite-backed account store
#[derive(Clone)]
pub struct SqliteAccountStore {
    pool: SqlitePool,
}

impl SqliteAccountStore {
    /// Create a new store with the given database pool
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl From<&Database> for SqliteAccountStore {
    fn from(db: &Database) -> Self {
        Self::new(db.pool.clone())
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.is_unique_violation())
}

#[async_trait]
impl AccountStore for SqliteAccountStore {
    async fn find_by_id(&self, id: &str) -> Result<Option<Account>> {
        let account: Option<Account> = sqlx::query_as("SELECT * FROM accounts WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(account)
    }

    async fn find_by_identifier(
        &self,
        user_name: Option<&str>,
        email: Option<&str>,
    ) -> Result<Option<Account>> {
        if user_name.is_none() && email.is_none() {
            return Ok(None);
        }

        // A NULL bind never matches, so a single query covers both identifiers
        let account: Option<Account> = sqlx::query_as(
            "SELECT * FROM accounts WHERE user_name = ? OR email = ? ORDER BY created_at LIMIT 1",
        )
        .bind(user_name)
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(account)
    }

    async fn create(&self, account: NewAccount) -> Result<Account> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO accounts (id, full_name, user_name, email, password_hash, avatar_url, cover_image_url, refresh_token, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, NULL, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&account.full_name)
        .bind(&account.user_name)
        .bind(&account.email)
        .bind(&account.password_hash)
        .bind(&account.avatar_url)
        .bind(&account.cover_image_url)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => {}
            Err(err) if is_unique_violation(&err) => {
                log::debug!("[store] Unique constraint rejected account {}", account.user_name);
                return Err(Error::conflict("User with email or username already exists"));
            }
            Err(err) => return Err(err.into()),
        }

        log::info!("[store] Created account {} ({})", account.user_name, id);

        Ok(Account {
            id,
            full_name: account.full_name,
            user_name: account.user_name,
            email: account.email,
            password_hash: account.password_hash,
            avatar_url: account.avatar_url,
            cover_image_url: account.cover_image_url,
            refresh_token: None,
            created_at: now,
            updated_at: now,
        })
    }

    async fn set_refresh_token(&self, id: &str, token: Option<&str>) -> Result<()> {
        let result = sqlx::query("UPDATE accounts SET refresh_token = ?, updated_at = ? WHERE id = ?")
            .bind(token)
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(Error::not_found(format!("Account {} not found", id)));
        }
        Ok(())
    }

    async fn replace_refresh_token_if(&self, id: &str, expected: &str, next: &str) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE accounts SET refresh_token = ?, updated_at = ? WHERE id = ? AND refresh_token = ?",
        )
        .bind(next)
        .bind(Utc::now())
        .bind(id)
        .bind(expected)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}
