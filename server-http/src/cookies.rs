use axum::http::{header, HeaderMap};

pub const SESSION_COOKIE: &str = "session_id";

/// Extracts the session id from the `Cookie` header, if present.
pub fn session_cookie_value(headers: &HeaderMap) -> Option<String> {
    let raw = headers.get(header::COOKIE)?.to_str().ok()?;
    raw.split(';').find_map(|part| {
        let (name, value) = part.trim().split_once('=')?;
        (name == SESSION_COOKIE).then(|| value.to_string())
    })
}

/// `Set-Cookie` value binding the session id to the browser: HttpOnly and
/// SameSite=Strict, expiring with the cache entry.
pub fn session_set_cookie(session_id: &str, max_age_secs: u64) -> String {
    format!(
        "{SESSION_COOKIE}={session_id}; HttpOnly; SameSite=Strict; Max-Age={max_age_secs}; Path=/"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn finds_the_session_cookie_among_others() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; session_id=abc123; lang=en"),
        );
        assert_eq!(session_cookie_value(&headers), Some("abc123".to_string()));
    }

    #[test]
    fn absent_cookie_is_none() {
        assert_eq!(session_cookie_value(&HeaderMap::new()), None);

        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("theme=dark"));
        assert_eq!(session_cookie_value(&headers), None);
    }

    #[test]
    fn set_cookie_carries_the_protocol_attributes() {
        let value = session_set_cookie("deadbeef", 120);
        assert!(value.starts_with("session_id=deadbeef;"));
        assert!(value.contains("HttpOnly"));
        assert!(value.contains("SameSite=Strict"));
        assert!(value.contains("Max-Age=120"));
    }
}
