//! Integration tests for the HTTP routes
//!
//! Requests are driven straight through the router with `oneshot`.

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, Response, StatusCode},
    Router,
};
use gatekeep_core::{
    Account, AccountStore, AuthService, Database, LocalUploadService, NewAccount, PasswordGate,
    SqliteAccountStore, TokenCodec, TokenConfig,
};
use gatekeep_server::{create_router, AppState, HttpSettings};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

const BOUNDARY: &str = "gatekeep-test-boundary";

/// Store that loses every row right after writing it
struct UnreadableStore {
    inner: SqliteAccountStore,
}

#[async_trait]
impl AccountStore for UnreadableStore {
    async fn find_by_id(&self, _id: &str) -> gatekeep_core::Result<Option<Account>> {
        Ok(None)
    }

    async fn find_by_identifier(
        &self,
        user_name: Option<&str>,
        email: Option<&str>,
    ) -> gatekeep_core::Result<Option<Account>> {
        self.inner.find_by_identifier(user_name, email).await
    }

    async fn create(&self, account: NewAccount) -> gatekeep_core::Result<Account> {
        self.inner.create(account).await
    }

    async fn set_refresh_token(&self, id: &str, token: Option<&str>) -> gatekeep_core::Result<()> {
        self.inner.set_refresh_token(id, token).await
    }

    async fn replace_refresh_token_if(
        &self,
        id: &str,
        expected: &str,
        next: &str,
    ) -> gatekeep_core::Result<bool> {
        self.inner.replace_refresh_token_if(id, expected, next).await
    }
}

async fn create_test_app() -> (Router, TempDir) {
    create_test_app_with(|db| Arc::new(SqliteAccountStore::from(db)) as Arc<dyn AccountStore>).await
}

async fn create_test_app_with(
    accounts: impl FnOnce(&Database) -> Arc<dyn AccountStore>,
) -> (Router, TempDir) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db = Database::open(temp_dir.path().join("test.db"))
        .await
        .expect("Failed to create test database");
    let media_dir = temp_dir.path().join("media");

    let auth = AuthService::new(
        accounts(&db),
        Arc::new(LocalUploadService::new(&media_dir, "http://localhost/media")),
        TokenCodec::new(
            TokenConfig::new("api-test-access-secret-0123456789", "api-test-refresh-secret-0123456789")
                .unwrap(),
        ),
        PasswordGate::new(4).unwrap(),
    );
    let settings = HttpSettings {
        media_dir: Some(media_dir),
        ..Default::default()
    };

    (create_router(AppState::new(auth, settings)), temp_dir)
}

fn multipart_body(fields: &[(&str, &str)], files: &[(&str, &str)]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    for (name, file_name) in files {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\nContent-Type: image/png\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(b"fake-image-bytes");
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn register_request(fields: &[(&str, &str)], files: &[(&str, &str)]) -> Request<Body> {
    Request::post("/api/v1/users/register")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(fields, files)))
        .unwrap()
}

const ANN: &[(&str, &str)] = &[
    ("fullName", "Ann Lee"),
    ("email", "ann@x.com"),
    ("userName", "AnnL"),
    ("password", "p@ss"),
];

fn json_request(uri: &str, body: Value) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn set_cookies(response: &Response<Body>) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .collect()
}

fn find_cookie<'a>(cookies: &'a [String], name: &str) -> &'a str {
    cookies
        .iter()
        .find(|c| c.starts_with(&format!("{}=", name)))
        .unwrap_or_else(|| panic!("missing {} cookie in {:?}", name, cookies))
}

async fn register_ann(app: &Router) -> Value {
    let response = app
        .clone()
        .oneshot(register_request(ANN, &[("avatar", "me.png")]))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await
}

async fn login_ann(app: &Router) -> (Value, Vec<String>) {
    let response = app
        .clone()
        .oneshot(json_request(
            "/api/v1/users/login",
            json!({"userName": "annl", "password": "p@ss"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let cookies = set_cookies(&response);
    (body_json(response).await, cookies)
}

// =============================================================================
// Register
// =============================================================================

#[tokio::test]
async fn test_register_returns_redacted_account() {
    let (app, _temp_dir) = create_test_app().await;
    let body = register_ann(&app).await;

    assert_eq!(body["statusCode"], 201);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["userName"], "annl");
    assert!(body["data"]["avatarUrl"]
        .as_str()
        .unwrap()
        .starts_with("http://localhost/media/"));
    assert!(body["data"].get("passwordHash").is_none());
    assert!(body["data"].get("refreshToken").is_none());
}

#[tokio::test]
async fn test_registered_avatar_is_served() {
    let (app, _temp_dir) = create_test_app().await;
    let body = register_ann(&app).await;
    let url = body["data"]["avatarUrl"].as_str().unwrap();
    let path = url.trim_start_matches("http://localhost");

    let response = app
        .clone()
        .oneshot(Request::get(path).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&bytes[..], b"fake-image-bytes");
}

#[tokio::test]
async fn test_register_conflict() {
    let (app, _temp_dir) = create_test_app().await;
    register_ann(&app).await;

    let response = app
        .clone()
        .oneshot(register_request(ANN, &[("avatar", "me.png")]))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["statusCode"], 409);
}

#[tokio::test]
async fn test_register_requires_avatar() {
    let (app, _temp_dir) = create_test_app().await;
    let response = app.clone().oneshot(register_request(ANN, &[])).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_register_rejects_blank_fields() {
    let (app, _temp_dir) = create_test_app().await;
    let fields = [("fullName", " "), ("email", "ann@x.com"), ("userName", "annl")];
    let response = app
        .clone()
        .oneshot(register_request(&fields, &[("avatar", "me.png")]))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    let message = body["message"].as_str().unwrap();
    assert!(message.contains("fullName"));
    assert!(message.contains("password"));
}

#[tokio::test]
async fn test_register_rejects_second_avatar() {
    let (app, _temp_dir) = create_test_app().await;
    let response = app
        .clone()
        .oneshot(register_request(
            ANN,
            &[("avatar", "one.png"), ("avatar", "two.png")],
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_register_unreadable_account_is_server_error() {
    let (app, _temp_dir) = create_test_app_with(|db| {
        Arc::new(UnreadableStore {
            inner: SqliteAccountStore::from(db),
        }) as Arc<dyn AccountStore>
    })
    .await;

    let response = app
        .clone()
        .oneshot(register_request(ANN, &[("avatar", "me.png")]))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert_eq!(body["statusCode"], 500);
    assert_eq!(body["success"], false);
    assert_eq!(
        body["message"],
        "Something went wrong while registering the user"
    );
}

#[tokio::test]
async fn test_register_rejects_json_body() {
    let (app, _temp_dir) = create_test_app().await;
    let response = app
        .clone()
        .oneshot(json_request("/api/v1/users/register", json!({"userName": "annl"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// =============================================================================
// Login
// =============================================================================

#[tokio::test]
async fn test_login_sets_secure_cookies() {
    let (app, _temp_dir) = create_test_app().await;
    register_ann(&app).await;
    let (body, cookies) = login_ann(&app).await;

    let access = body["data"]["accessToken"].as_str().unwrap();
    let refresh = body["data"]["refreshToken"].as_str().unwrap();
    assert!(!access.is_empty());
    assert!(!refresh.is_empty());
    assert_eq!(body["data"]["user"]["userName"], "annl");

    for (name, value) in [("accessToken", access), ("refreshToken", refresh)] {
        let cookie = find_cookie(&cookies, name);
        assert!(cookie.starts_with(&format!("{}={}", name, value)));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Secure"));
    }
}

#[tokio::test]
async fn test_login_failures() {
    let (app, _temp_dir) = create_test_app().await;
    register_ann(&app).await;

    let cases = [
        (json!({"userName": "annl", "password": "nope"}), StatusCode::UNAUTHORIZED),
        (json!({"email": "nobody@x.com", "password": "p@ss"}), StatusCode::NOT_FOUND),
        (json!({"password": "p@ss"}), StatusCode::BAD_REQUEST),
    ];
    for (payload, expected) in cases {
        let response = app
            .clone()
            .oneshot(json_request("/api/v1/users/login", payload))
            .await
            .unwrap();
        assert_eq!(response.status(), expected);
        assert!(set_cookies(&response).is_empty());
    }

    let response = app
        .clone()
        .oneshot(
            Request::post("/api/v1/users/login")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// =============================================================================
// Refresh
// =============================================================================

fn refresh_with_cookie(token: &str) -> Request<Body> {
    Request::post("/api/v1/users/refresh-token")
        .header(header::COOKIE, format!("refreshToken={}", token))
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn test_refresh_rotates_and_rejects_replay() {
    let (app, _temp_dir) = create_test_app().await;
    register_ann(&app).await;
    let (body, _) = login_ann(&app).await;
    let t1 = body["data"]["refreshToken"].as_str().unwrap().to_string();

    let response = app.clone().oneshot(refresh_with_cookie(&t1)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let cookies = set_cookies(&response);
    let body = body_json(response).await;
    let t2 = body["data"]["refreshToken"].as_str().unwrap().to_string();
    assert_ne!(t1, t2);
    assert!(find_cookie(&cookies, "refreshToken").starts_with(&format!("refreshToken={}", t2)));

    // Replay through the body fallback
    let response = app
        .clone()
        .oneshot(json_request(
            "/api/v1/users/refresh-token",
            json!({ "refreshToken": t1 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app.clone().oneshot(refresh_with_cookie(&t2)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_refresh_without_token() {
    let (app, _temp_dir) = create_test_app().await;
    let response = app
        .clone()
        .oneshot(
            Request::post("/api/v1/users/refresh-token")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

// =============================================================================
// Logout
// =============================================================================

#[tokio::test]
async fn test_logout_clears_cookies_and_revokes_refresh() {
    let (app, _temp_dir) = create_test_app().await;
    register_ann(&app).await;
    let (body, _) = login_ann(&app).await;
    let access = body["data"]["accessToken"].as_str().unwrap().to_string();
    let refresh = body["data"]["refreshToken"].as_str().unwrap().to_string();

    let response = app
        .clone()
        .oneshot(
            Request::post("/api/v1/users/logout")
                .header(header::AUTHORIZATION, format!("Bearer {}", access))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let cookies = set_cookies(&response);
    for name in ["accessToken", "refreshToken"] {
        let cookie = find_cookie(&cookies, name);
        assert!(cookie.starts_with(&format!("{}=;", name)));
        assert!(cookie.contains("Max-Age=0"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Secure"));
    }

    let response = app.clone().oneshot(refresh_with_cookie(&refresh)).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_logout_with_access_cookie() {
    let (app, _temp_dir) = create_test_app().await;
    register_ann(&app).await;
    let (body, _) = login_ann(&app).await;
    let access = body["data"]["accessToken"].as_str().unwrap();

    let response = app
        .clone()
        .oneshot(
            Request::post("/api/v1/users/logout")
                .header(header::COOKIE, format!("accessToken={}", access))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_logout_requires_access_token() {
    let (app, _temp_dir) = create_test_app().await;
    register_ann(&app).await;
    let (body, _) = login_ann(&app).await;
    let refresh = body["data"]["refreshToken"].as_str().unwrap();

    let response = app
        .clone()
        .oneshot(Request::post("/api/v1/users/logout").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // A refresh token is not an access token
    let response = app
        .clone()
        .oneshot(
            Request::post("/api/v1/users/logout")
                .header(header::AUTHORIZATION, format!("Bearer {}", refresh))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_health() {
    let (app, _temp_dir) = create_test_app().await;
    let response = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({"status": "ok"}));
}
