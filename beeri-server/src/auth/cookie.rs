//! Session cookie `Set-Cookie` values

use chrono::Duration;

pub const SESSION_COOKIE: &str = "auth-token";

/// HttpOnly session cookie. `secure` is off only for plain-http development.
pub fn session_cookie(token: &str, ttl: Duration, secure: bool) -> String {
    build(token, ttl.num_seconds().max(0), secure)
}

/// Expired cookie that makes the browser drop the session.
pub fn clear_session_cookie(secure: bool) -> String {
    build("", 0, secure)
}

fn build(value: &str, max_age: i64, secure: bool) -> String {
    let mut cookie = format!("{SESSION_COOKIE}={value}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age}");
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}
