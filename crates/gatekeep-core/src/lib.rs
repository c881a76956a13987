//! # gatekeep-core
//!
//! Core session credential logic for Gatekeep, shared by every front end.
//!
//! This crate provides:
//! - Token issuing and verification (`auth::token`)
//! - Password hashing (`auth::password`)
//! - Account persistence (`db` module)
//! - Data models (`models` module)
//! - Upload collaborators, the refresh slot adapter and the auth state machine (`services` module)
//! - Unified error handling (`error` module)

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;

// Re-exports for convenience
pub use auth::{PasswordGate, TokenCodec, TokenError};
pub use config::TokenConfig;
pub use db::{AccountStore, Database, SqliteAccountStore};
pub use error::{Error, ErrorKind, Result};

pub use models::{
    Account, AccountResponse, Claims, LoginRequest, LoginResponse, NewAccount, RegisterRequest,
    TokenKind, TokenPair,
};

pub use services::{
    AuthService, HttpUploadService, LocalUploadService, SessionPolicy, SessionStore,
    UploadService, UploadedFile, SESSION_POLICY,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Returns the library version
pub fn version() -> &'static str {
    VERSION
}
