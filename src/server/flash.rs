//! Carries notices across a redirect in a short-lived `flash` cookie.

use crate::captures::Notices;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use tracing::debug;

pub const FLASH_COOKIE_KEY: &str = "flash";

/// Notices left by the previous response. A malformed cookie counts as empty.
pub fn pending_notices(jar: &CookieJar) -> Notices {
    let raw = match jar.get(FLASH_COOKIE_KEY) {
        Some(cookie) => cookie.value().to_string(),
        None => return Notices::new(),
    };
    let decoded = match urlencoding::decode(&raw) {
        Ok(decoded) => decoded,
        Err(err) => {
            debug!("Discarding undecodable flash cookie: {}", err);
            return Notices::new();
        }
    };
    serde_json::from_str(&decoded).unwrap_or_else(|err| {
        debug!("Discarding malformed flash cookie: {}", err);
        Notices::new()
    })
}

/// Replaces the flash cookie with `notices`, or removes it when there are none.
pub fn store_flash(jar: CookieJar, notices: &Notices) -> CookieJar {
    if notices.is_empty() {
        return clear_flash(jar);
    }
    let json = match serde_json::to_string(notices) {
        Ok(json) => json,
        Err(err) => {
            debug!("Could not encode notices: {}", err);
            return clear_flash(jar);
        }
    };
    jar.add(
        Cookie::build((FLASH_COOKIE_KEY, urlencoding::encode(&json).into_owned()))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax),
    )
}

pub fn clear_flash(jar: CookieJar) -> CookieJar {
    if jar.get(FLASH_COOKIE_KEY).is_none() {
        return jar;
    }
    jar.remove(Cookie::build(FLASH_COOKIE_KEY).path("/"))
}
