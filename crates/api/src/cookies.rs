//! Credential transport over HTTP-only cookies.

use axum_extra::extract::CookieJar;
use axum_extra::extract::cookie::{Cookie, SameSite};
use time::Duration;

use elearn_auth::IssuedSession;

pub const ACCESS_COOKIE: &str = "access_token";
pub const REFRESH_COOKIE: &str = "refresh_token";

/// Add both credential cookies for a freshly issued pair.
pub fn set_session_cookies(jar: CookieJar, issued: &IssuedSession, secure: bool) -> CookieJar {
    jar.add(credential_cookie(
        ACCESS_COOKIE,
        &issued.access_token,
        issued.access_ttl,
        secure,
    ))
    .add(credential_cookie(
        REFRESH_COOKIE,
        &issued.refresh_token,
        issued.refresh_ttl,
        secure,
    ))
}

/// Overwrite both credential cookies with empty, immediately expiring ones.
pub fn clear_session_cookies(jar: CookieJar) -> CookieJar {
    jar.add(removal_cookie(ACCESS_COOKIE)).add(removal_cookie(REFRESH_COOKIE))
}

/// Non-empty cookie value, if present.
pub fn read(jar: &CookieJar, name: &str) -> Option<String> {
    jar.get(name)
        .map(|c| c.value().trim().to_string())
        .filter(|v| !v.is_empty())
}

fn credential_cookie(name: &'static str, value: &str, ttl: chrono::Duration, secure: bool) -> Cookie<'static> {
    Cookie::build((name, value.to_string()))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(Duration::seconds(ttl.num_seconds()))
        .build()
}

fn removal_cookie(name: &'static str) -> Cookie<'static> {
    Cookie::build((name, ""))
        .http_only(true)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(Duration::ZERO)
        .build()
}
