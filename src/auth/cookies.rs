use axum::http::{header::SET_COOKIE, HeaderMap, HeaderValue};

pub const ACCESS_COOKIE: &str = "accessToken";
pub const REFRESH_COOKIE: &str = "refreshToken";

/// HTTP-only auth cookie, valid for `max_age_secs`.
pub fn auth_cookie(name: &str, value: &str, max_age_secs: u64) -> String {
    format!(
        "{}={}; HttpOnly; Secure; SameSite=None; Path=/; Max-Age={}",
        name, value, max_age_secs
    )
}

/// Cookie that instructs the client to drop the named cookie.
pub fn expired_cookie(name: &str) -> String {
    format!("{}=; HttpOnly; Secure; SameSite=None; Path=/; Max-Age=0", name)
}

pub fn append_cookie(headers: &mut HeaderMap, cookie: &str) {
    if let Ok(v) = HeaderValue::from_str(cookie) {
        headers.append(SET_COOKIE, v);
    }
}

/// Value of a named cookie from a `Cookie:` request header.
pub fn cookie_value<'a>(cookie_header: &'a str, name: &str) -> Option<&'a str> {
    cookie_header.split(';').find_map(|pair| {
        let (k, v) = pair.trim().split_once('=')?;
        (k == name).then_some(v)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_cookie_shape() {
        let c = auth_cookie(ACCESS_COOKIE, "tok123", 3600);
        assert_eq!(
            c,
            "accessToken=tok123; HttpOnly; Secure; SameSite=None; Path=/; Max-Age=3600"
        );
    }

    #[test]
    fn expired_cookie_has_zero_max_age() {
        assert!(expired_cookie(REFRESH_COOKIE).contains("Max-Age=0"));
    }

    #[test]
    fn cookie_value_parses_pairs() {
        let header = "accessToken=abc; refreshToken=def; theme=dark";
        assert_eq!(cookie_value(header, "accessToken"), Some("abc"));
        assert_eq!(cookie_value(header, "refreshToken"), Some("def"));
        assert_eq!(cookie_value(header, "missing"), None);
    }

    #[test]
    fn cookie_value_handles_single_pair() {
        assert_eq!(cookie_value("accessToken=only", "accessToken"), Some("only"));
    }
}
