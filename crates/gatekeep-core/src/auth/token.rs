//! Token codec - signed, expiring JWTs for access and refresh credentials

use chrono::{DateTime, Utc};
use jsonwebtoken::errors::ErrorKind as JwtErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use crate::config::TokenConfig;
use crate::error::{Error, Result};
use crate::models::{Claims, TokenKind};

/// Why a presented token was rejected
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenError {
    /// Signed with another key, or belongs to the other token family.
    #[error("token signature is invalid")]
    InvalidSignature,

    /// Well formed and correctly signed, but past `exp`.
    #[error("token has expired")]
    Expired,

    #[error("token is malformed")]
    Malformed,
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            JwtErrorKind::ExpiredSignature => TokenError::Expired,
            JwtErrorKind::InvalidSignature | JwtErrorKind::InvalidAlgorithm => {
                TokenError::InvalidSignature
            }
            _ => TokenError::Malformed,
        }
    }
}

struct Keys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl Keys {
    fn from_secret(secret: &[u8]) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        }
    }
}

/// Issues and verifies HS256 tokens. Each kind has its own secret.
pub struct TokenCodec {
    config: TokenConfig,
    access: Keys,
    refresh: Keys,
    validation: Validation,
}

impl TokenCodec {
    pub fn new(config: TokenConfig) -> Self {
        let access = Keys::from_secret(config.secret(TokenKind::Access));
        let refresh = Keys::from_secret(config.secret(TokenKind::Refresh));

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            config,
            access,
            refresh,
            validation,
        }
    }

    fn keys(&self, kind: TokenKind) -> &Keys {
        match kind {
            TokenKind::Access => &self.access,
            TokenKind::Refresh => &self.refresh,
        }
    }

    /// Create a token for `subject` valid from now
    pub fn issue(&self, subject: &str, kind: TokenKind) -> Result<String> {
        self.issue_at(subject, kind, Utc::now())
    }

    /// Create a token as if it had been issued at `issued_at`
    pub fn issue_at(&self, subject: &str, kind: TokenKind, issued_at: DateTime<Utc>) -> Result<String> {
        let expires_at = issued_at
            .checked_add_signed(self.config.ttl(kind))
            .ok_or_else(|| Error::internal("Token expiry is out of range"))?;

        let claims = Claims {
            sub: subject.to_string(),
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
            jti: Uuid::new_v4().to_string(),
            kind,
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.keys(kind).encoding)?;
        Ok(token)
    }

    /// Verify a token of the given kind and return its claims
    pub fn verify(&self, token: &str, kind: TokenKind) -> std::result::Result<Claims, TokenError> {
        if token.trim().is_empty() {
            return Err(TokenError::Malformed);
        }

        let data = decode::<Claims>(token, &self.keys(kind).decoding, &self.validation)?;

        if data.claims.kind != kind {
            return Err(TokenError::InvalidSignature);
        }
        if data.claims.sub.is_empty() {
            return Err(TokenError::Malformed);
        }

        Ok(data.claims)
    }
}
