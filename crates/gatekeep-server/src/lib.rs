//! # gatekeep-server
//!
//! HTTP front end for Gatekeep. Parses requests and cookies, delegates to
//! [`gatekeep_core::AuthService`] and renders the outcome as a JSON envelope
//! plus `accessToken` / `refreshToken` cookies.

pub mod api;
pub mod config;
pub mod state;

pub use api::create_router;
pub use config::{HttpSettings, ServerArgs};
pub use state::AppState;
