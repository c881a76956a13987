//! Authentication module - token codec and password hashing

pub mod password;
pub mod token;

pub use password::{hash_password, verify_password, PasswordGate};
pub use token::{TokenCodec, TokenError};
