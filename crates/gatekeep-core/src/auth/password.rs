//! Password hashing
//!
//! bcrypt salts every hash and compares in constant time. Hashing is CPU
//! bound, so [`PasswordGate`] runs it on the blocking pool.

use crate::error::{Error, Result};

/// Hash a password
pub fn hash_password(password: &str, cost: u32) -> std::result::Result<String, bcrypt::BcryptError> {
    bcrypt::hash(password, cost)
}

/// Verify a password against a hash
pub fn verify_password(password: &str, hash: &str) -> std::result::Result<bool, bcrypt::BcryptError> {
    bcrypt::verify(password, hash)
}

/// Async wrapper around bcrypt used by the registration and login flows
#[derive(Debug, Clone, Copy)]
pub struct PasswordGate {
    cost: u32,
}

impl Default for PasswordGate {
    fn default() -> Self {
        Self {
            cost: bcrypt::DEFAULT_COST,
        }
    }
}

impl PasswordGate {
    /// Create a gate with an explicit bcrypt cost (4..=31)
    pub fn new(cost: u32) -> Result<Self> {
        if !(4..=31).contains(&cost) {
            return Err(Error::config(format!(
                "bcrypt cost must be between 4 and 31, got {}",
                cost
            )));
        }
        Ok(Self { cost })
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }

    /// Produce a salted digest. Two calls with the same input give different digests.
    pub async fn hash(&self, plaintext: &str) -> Result<String> {
        let plaintext = plaintext.to_string();
        let cost = self.cost;
        let digest = tokio::task::spawn_blocking(move || hash_password(&plaintext, cost)).await??;
        Ok(digest)
    }

    /// Check a password. A wrong password is `Ok(false)`; only a corrupt
    /// digest is an error.
    pub async fn verify(&self, plaintext: &str, digest: &str) -> Result<bool> {
        let plaintext = plaintext.to_string();
        let digest = digest.to_string();
        let valid = tokio::task::spawn_blocking(move || verify_password(&plaintext, &digest)).await??;
        Ok(valid)
    }
}
