//! Access-token extractor for authenticated routes

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use gatekeep_core::AccountResponse;
use tower_cookies::Cookies;

use super::cookies::{cookie_value, ACCESS_TOKEN_COOKIE};
use super::response::ApiError;
use crate::state::AppState;

/// The account behind a verified access token.
///
/// The token is read from the `accessToken` cookie, falling back to an
/// `Authorization: Bearer` header.
#[derive(Debug, Clone)]
pub struct AuthUser(pub AccountResponse);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let from_cookie = match Cookies::from_request_parts(parts, state).await {
            Ok(cookies) => cookie_value(&cookies, ACCESS_TOKEN_COOKIE),
            Err(_) => {
                log::error!("[api] Cookie layer missing, falling back to Authorization header");
                None
            }
        };

        let token = from_cookie
            .or_else(|| bearer_token(parts))
            .ok_or_else(|| ApiError::unauthorized("Unauthorized request"))?;

        let account = state.auth.authenticate(&token).await?;
        Ok(AuthUser(account))
    }
}

fn bearer_token(parts: &Parts) -> Option<String> {
    parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}
