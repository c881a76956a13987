//! Services module - business logic
//!
//! - `auth` - registration, login, refresh rotation and logout
//! - `session` - the single refresh-token slot on each account
//! - `upload` - profile image upload collaborators

pub mod auth;
pub mod session;
pub mod upload;

pub use auth::AuthService;
pub use session::{SessionPolicy, SessionStore, SESSION_POLICY};
pub use upload::{HttpUploadService, LocalUploadService, UploadService, UploadedFile};
