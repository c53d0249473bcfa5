//! One-shot banners carried across a redirect.
//!
//! A form post that changes state answers with a redirect; the outcome of the
//! post is stored in the [`FLASH_COOKIE`] and shown (then cleared) by the next
//! page that is rendered.

use axum_extra::extract::{
    CookieJar,
    cookie::{Cookie, SameSite},
};
use serde::{Deserialize, Serialize};

pub const FLASH_COOKIE: &str = "flash";

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FlashKind {
    Success,
    Error,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Flash {
    pub kind: FlashKind,
    pub text: String,
}

impl Flash {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Success,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Error,
            text: text.into(),
        }
    }

    /// The payload is url-encoded so that it only contains characters which
    /// are valid inside a cookie value.
    pub fn to_cookie(&self) -> Cookie<'static> {
        let value = serde_urlencoded::to_string(self).unwrap_or_default();
        Cookie::build((FLASH_COOKIE, value))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .build()
    }

    pub fn from_cookie_value(value: &str) -> Option<Self> {
        serde_urlencoded::from_str(value).ok()
    }
}

/// Removes the pending banner (if any) from the jar, returning it. A cookie
/// which cannot be decoded is dropped.
pub fn take_flash(jar: CookieJar) -> (CookieJar, Option<Flash>) {
    let Some(cookie) = jar.get(FLASH_COOKIE) else {
        return (jar, None);
    };
    let flash = Flash::from_cookie_value(cookie.value());

    (jar.remove(Cookie::build(FLASH_COOKIE).path("/")), flash)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cookie_value_survives_punctuation() {
        let flash = Flash::error("Exactly 5 teams are needed; found 4, sorry.");
        let cookie = flash.to_cookie();

        assert!(!cookie.value().contains(' '));
        assert!(!cookie.value().contains(';'));
        assert_eq!(Flash::from_cookie_value(cookie.value()), Some(flash));
    }

    #[test]
    fn garbage_cookie_is_ignored() {
        let jar = CookieJar::new().add(Cookie::new(FLASH_COOKIE, "nonsense"));
        let (jar, flash) = take_flash(jar);
        assert!(flash.is_none());
        assert!(jar.get(FLASH_COOKIE).is_none());
    }
}
