//! Short-lived user notices carried in a cookie across the post/redirect/get cycle.
//!
//! The notice text is signed with the session key, then percent-encoded for the
//! `Set-Cookie` header. actix percent-decodes request cookies once, which yields
//! the signed text again.

use actix_web::HttpRequest;
use actix_web::cookie::{Cookie, CookieJar, Key, SameSite, time};
use tracing::warn;

/// Cookie holding pending notices.
pub const FLASH_COOKIE: &str = "flash";

/// Notices older than this are dropped by the browser.
const FLASH_MAX_AGE_SECS: i64 = 3600;

/// Budget for the encoded notice text; the signature takes the rest of the
/// common 4KB per-cookie limit.
const MAX_ENCODED_LEN: usize = 3400;

/// Build a signed cookie carrying `messages`.
///
/// If the messages do not fit, the tail is replaced by a count of what was dropped.
pub fn flash_cookie(key: &Key, messages: &[String]) -> Cookie<'static> {
    let mut jar = CookieJar::new();
    jar.signed_mut(key).add(Cookie::new(FLASH_COOKIE, fit(messages)));
    let signed = jar
        .get(FLASH_COOKIE)
        .map(|c| c.value().to_string())
        .unwrap_or_default();

    Cookie::build(FLASH_COOKIE, urlencoding::encode(&signed).into_owned())
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::seconds(FLASH_MAX_AGE_SECS))
        .finish()
}

/// Cookie that clears any pending notices.
pub fn removal_cookie() -> Cookie<'static> {
    let mut cookie = Cookie::build(FLASH_COOKIE, "").path("/").finish();
    cookie.make_removal();
    cookie
}

/// Read pending notices from the request, if any.
///
/// A cookie whose signature does not verify is ignored.
pub fn read(req: &HttpRequest, key: &Key) -> Vec<String> {
    let Some(cookie) = req.cookie(FLASH_COOKIE) else {
        return Vec::new();
    };
    if cookie.value().is_empty() {
        return Vec::new();
    }

    let mut jar = CookieJar::new();
    jar.add_original(cookie);
    match jar.signed(key).get(FLASH_COOKIE) {
        Some(verified) => split(verified.value()),
        None => {
            warn!("Discarding flash cookie with invalid signature");
            Vec::new()
        }
    }
}

/// Join `messages` with newlines, dropping the tail once the encoded text
/// would exceed the cookie budget.
fn fit(messages: &[String]) -> String {
    let mut kept: Vec<&str> = Vec::with_capacity(messages.len());
    let mut text = String::new();

    for (i, message) in messages.iter().enumerate() {
        kept.push(message);
        let candidate = kept.join("\n");
        if urlencoding::encode(&candidate).len() > MAX_ENCODED_LEN {
            kept.pop();
            let dropped = format!("... and {} more", messages.len() - i);
            kept.push(&dropped);
            return kept.join("\n");
        }
        text = candidate;
    }

    text
}

fn split(text: &str) -> Vec<String> {
    text.split('\n')
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
