//! API module - Axum routes

pub mod cookies;
pub mod extract;
pub mod multipart;
pub mod response;
pub mod users;

use axum::{
    http::{header, HeaderValue, Method},
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use tower_cookies::CookieManagerLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub use extract::AuthUser;
pub use response::{ApiError, ApiResponse};

/// Create the API router with all routes
pub fn create_router(state: AppState) -> Router {
    let mut router = Router::new()
        .route("/health", get(health))
        .nest("/api/v1/users", users::routes(state.settings.max_upload_bytes));

    if let Some(media_dir) = &state.settings.media_dir {
        router = router.nest_service("/media", ServeDir::new(media_dir));
    }

    router
        .layer(CookieManagerLayer::new())
        .layer(cors_layer(state.settings.cors_origin.as_deref()))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Credentialed CORS needs an explicit origin; without one, fall back to a
/// permissive policy that does not expose cookies.
fn cors_layer(origin: Option<&str>) -> CorsLayer {
    let origin = origin.and_then(|origin| match origin.parse::<HeaderValue>() {
        Ok(value) => Some(value),
        Err(_) => {
            log::warn!("[api] Ignoring invalid CORS origin: {}", origin);
            None
        }
    });

    match origin {
        Some(origin) => CorsLayer::new()
            .allow_origin(origin)
            .allow_credentials(true)
            .allow_methods([Method::GET, Method::POST])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]),
        None => CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any),
    }
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
