//! User session routes

use axum::{
    body::Bytes,
    extract::{
        multipart::MultipartRejection, rejection::JsonRejection, DefaultBodyLimit, Multipart,
        State,
    },
    http::StatusCode,
    routing::post,
    Json, Router,
};
use gatekeep_core::{AccountResponse, LoginRequest, LoginResponse, TokenPair};
use serde::Deserialize;
use serde_json::{json, Value};
use tower_cookies::Cookies;

use super::cookies::{clear_session_cookies, cookie_value, set_session_cookies, REFRESH_TOKEN_COOKIE};
use super::extract::AuthUser;
use super::multipart::RegisterForm;
use super::response::{ApiError, ApiResponse};
use crate::state::AppState;

/// User routes
pub fn routes(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route(
            "/register",
            post(register).layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/refresh-token", post(refresh_token))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    #[serde(default)]
    pub refresh_token: Option<String>,
}

/// Register a new account from a multipart form
async fn register(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<ApiResponse<AccountResponse>, ApiError> {
    let multipart = multipart.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let form = RegisterForm::read(multipart).await?;

    let account = state.auth.register(form.to_request()).await?;

    Ok(ApiResponse::new(
        StatusCode::CREATED,
        account,
        "User registered successfully",
    ))
}

/// Log in and receive both tokens, in the body and as cookies
async fn login(
    State(state): State<AppState>,
    cookies: Cookies,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<ApiResponse<LoginResponse>, ApiError> {
    let Json(req) = body.map_err(|e| ApiError::bad_request(e.body_text()))?;

    let login = state.auth.login(req).await?;
    set_session_cookies(&cookies, &login.access_token, &login.refresh_token);

    Ok(ApiResponse::new(
        StatusCode::OK,
        login,
        "User logged in successfully",
    ))
}

/// End the caller's session
async fn logout(
    State(state): State<AppState>,
    cookies: Cookies,
    AuthUser(account): AuthUser,
) -> Result<ApiResponse<Value>, ApiError> {
    state.auth.logout(&account.id).await?;
    clear_session_cookies(&cookies);

    Ok(ApiResponse::new(StatusCode::OK, json!({}), "User logged out"))
}

/// Rotate the refresh token. The cookie wins over the body field.
async fn refresh_token(
    State(state): State<AppState>,
    cookies: Cookies,
    body: Bytes,
) -> Result<ApiResponse<TokenPair>, ApiError> {
    let presented = cookie_value(&cookies, REFRESH_TOKEN_COOKIE).or_else(|| {
        serde_json::from_slice::<RefreshRequest>(&body)
            .ok()
            .and_then(|req| req.refresh_token)
    });

    let pair = state.auth.refresh(presented.as_deref()).await?;
    set_session_cookies(&cookies, &pair.access_token, &pair.refresh_token);

    Ok(ApiResponse::new(StatusCode::OK, pair, "Access token refreshed"))
}
