//! Session cookies
//!
//! Both tokens travel as `HttpOnly; Secure; Path=/` cookies. Logout sends
//! removal cookies with the same attributes so browsers drop them.

use tower_cookies::{Cookie, Cookies};

pub const ACCESS_TOKEN_COOKIE: &str = "accessToken";
pub const REFRESH_TOKEN_COOKIE: &str = "refreshToken";

fn session_cookie(name: &'static str, value: String) -> Cookie<'static> {
    Cookie::build((name, value))
        .http_only(true)
        .secure(true)
        .path("/")
        .build()
}

pub fn set_session_cookies(cookies: &Cookies, access_token: &str, refresh_token: &str) {
    cookies.add(session_cookie(ACCESS_TOKEN_COOKIE, access_token.to_string()));
    cookies.add(session_cookie(REFRESH_TOKEN_COOKIE, refresh_token.to_string()));
}

pub fn clear_session_cookies(cookies: &Cookies) {
    for name in [ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE] {
        let mut cookie = session_cookie(name, String::new());
        cookie.make_removal();
        cookies.add(cookie);
    }
}

/// Non-empty cookie value, if present
pub fn cookie_value(cookies: &Cookies, name: &str) -> Option<String> {
    cookies
        .get(name)
        .map(|cookie| cookie.value().to_string())
        .filter(|value| !value.is_empty())
}
