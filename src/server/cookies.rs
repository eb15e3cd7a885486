//! Session cookie formatting and parsing

use super::state::CookieSettings;
use crate::core::auth::SESSION_COOKIE;
use axum::http::HeaderMap;
use axum::http::header::COOKIE;

/// `Set-Cookie` value carrying a fresh session token
pub fn session_cookie(token: &str, settings: &CookieSettings) -> String {
    build(token, settings.max_age_secs, settings.secure)
}

/// `Set-Cookie` value that makes the browser drop the session
pub fn clear_session_cookie(settings: &CookieSettings) -> String {
    build("", 0, settings.secure)
}

fn build(value: &str, max_age: u64, secure: bool) -> String {
    let mut cookie =
        format!("{SESSION_COOKIE}={value}; Path=/; HttpOnly; SameSite=Strict; Max-Age={max_age}");
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// Value of cookie `name` across all `Cookie` headers
pub fn read_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim_matches('"').to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    const SETTINGS: CookieSettings = CookieSettings {
        secure: true,
        max_age_secs: 86_400,
    };

    #[test]
    fn test_session_cookie_attributes() {
        let cookie = session_cookie("abc.def", &SETTINGS);
        assert!(cookie.starts_with("admin_token=abc.def;"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Strict"));
        assert!(cookie.contains("Path=/"));
        assert!(cookie.contains("Max-Age=86400"));
        assert!(cookie.ends_with("; Secure"));
    }

    #[test]
    fn test_insecure_cookie_for_local_http() {
        let cookie = session_cookie(
            "t",
            &CookieSettings {
                secure: false,
                ..SETTINGS
            },
        );
        assert!(!cookie.contains("Secure"));
    }

    #[test]
    fn test_clear_cookie() {
        let cookie = clear_session_cookie(&SETTINGS);
        assert!(cookie.starts_with("admin_token=;"));
        assert!(cookie.contains("Max-Age=0"));
    }

    #[test]
    fn test_read_cookie_among_others() {
        let mut headers = HeaderMap::new();
        headers.append(COOKIE, HeaderValue::from_static("theme=dark; lang=ar"));
        headers.append(COOKIE, HeaderValue::from_static("admin_token=tok.sig; other=1"));

        assert_eq!(read_cookie(&headers, "admin_token").as_deref(), Some("tok.sig"));
        assert_eq!(read_cookie(&headers, "lang").as_deref(), Some("ar"));
        assert_eq!(read_cookie(&headers, "missing"), None);
    }
}
