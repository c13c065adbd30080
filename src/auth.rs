//! HTTP Basic authentication for the door switch.

use base64::{engine::general_purpose::STANDARD, Engine};

/// Longest decoded `user:password` accepted.
const MAX_CREDENTIALS_LEN: usize = 128;

#[derive(Debug, Clone, Copy)]
pub struct Credentials<'a> {
    pub user: &'a str,
    pub password: &'a str,
}

impl<'a> Credentials<'a> {
    /// Returns `None` when `user` is empty, which disables authentication.
    pub fn from_config(user: &'a str, password: &'a str) -> Option<Credentials<'a>> {
        if user.is_empty() {
            return None;
        }
        Some(Credentials { user, password })
    }

    fn matches(&self, decoded: &[u8]) -> bool {
        let Some(colon) = decoded.iter().position(|&b| b == b':') else {
            return false;
        };
        let (user, password) = (&decoded[..colon], &decoded[colon + 1..]);
        constant_time_eq(user, self.user.as_bytes())
            & constant_time_eq(password, self.password.as_bytes())
    }
}

/// Checks an `Authorization` header value against the expected credentials.
pub fn check_basic(credentials: &Credentials<'_>, authorization: Option<&str>) -> bool {
    let Some(authorization) = authorization else {
        return false;
    };
    let Some((scheme, token)) = authorization.trim().split_once(' ') else {
        return false;
    };
    if !scheme.eq_ignore_ascii_case("Basic") {
        return false;
    }

    let mut decoded = [0u8; MAX_CREDENTIALS_LEN];
    match STANDARD.decode_slice(token.trim(), &mut decoded) {
        Ok(len) => credentials.matches(&decoded[..len]),
        Err(_) => false,
    }
}

/// Whether a request may use a protected action. `None` disables auth.
pub fn authorize(credentials: Option<&Credentials<'_>>, authorization: Option<&str>) -> bool {
    credentials.map_or(true, |credentials| check_basic(credentials, authorization))
}

/// Compares without returning early on the first differing byte.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADMIN: Credentials<'static> = Credentials {
        user: "admin",
        password: "s3cret",
    };

    #[test]
    fn empty_user_disables_auth() {
        assert!(Credentials::from_config("", "whatever").is_none());
        assert!(Credentials::from_config("admin", "").is_some());
    }

    #[test]
    fn accepts_matching_credentials() {
        assert!(check_basic(&ADMIN, Some("Basic YWRtaW46czNjcmV0")));
        assert!(check_basic(&ADMIN, Some("basic  YWRtaW46czNjcmV0 ")));
    }

    #[test]
    fn rejects_wrong_or_missing_credentials() {
        // admin:wrong
        assert!(!check_basic(&ADMIN, Some("Basic YWRtaW46d3Jvbmc=")));
        assert!(!check_basic(&ADMIN, None));
        assert!(!check_basic(&ADMIN, Some("Bearer YWRtaW46czNjcmV0")));
        assert!(!check_basic(&ADMIN, Some("Basic !!!not-base64!!!")));
        // "admins3cret", no colon
        assert!(!check_basic(&ADMIN, Some("Basic YWRtaW5zM2NyZXQ=")));
    }

    #[test]
    fn rejects_oversized_token() {
        let token = "QUFB".repeat(64);
        let header = ["Basic ", token.as_str()].concat();
        assert!(!check_basic(&ADMIN, Some(&header)));
    }

    #[test]
    fn authorize_checks_only_when_configured() {
        assert!(authorize(None, None));
        assert!(authorize(None, Some("Basic YWRtaW46d3Jvbmc=")));
        assert!(!authorize(Some(&ADMIN), None));
        assert!(authorize(Some(&ADMIN), Some("Basic YWRtaW46czNjcmV0")));
    }
}
