// src/server/session.rs: HMAC-signed session tokens carried in a cookie
//
// Token layout: `<expires_unix>.<nonce>.<base64 tag>` where the tag signs
// `<expires_unix>.<nonce>`. Nothing is stored server side.

use crate::core::config::AuthConfig;
use crate::core::constants::SESSION_COOKIE;
use actix_web::cookie::{time, Cookie, SameSite};
use base64::Engine;
use chrono::{DateTime, Utc};
use ring::hmac;

/// Request-scoped proof of login, placed in request extensions by the middleware.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthenticatedSession {
    pub nonce: String,
    pub expires_at: DateTime<Utc>,
}

pub struct SessionManager {
    key: hmac::Key,
    ttl: chrono::Duration,
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl SessionManager {
    pub fn new(secret: &str, ttl: std::time::Duration) -> Self {
        Self {
            key: hmac::Key::new(hmac::HMAC_SHA256, secret.as_bytes()),
            ttl: chrono::Duration::from_std(ttl).unwrap_or_else(|_| chrono::Duration::hours(12)),
        }
    }

    pub fn from_config(auth: &AuthConfig) -> Self {
        Self::new(&auth.session_secret, auth.session_ttl)
    }

    pub fn issue(&self) -> String {
        self.issue_at(Utc::now())
    }

    fn issue_at(&self, now: DateTime<Utc>) -> String {
        let expires = (now + self.ttl).timestamp();
        let nonce = uuid::Uuid::new_v4().simple().to_string();
        let payload = format!("{}.{}", expires, nonce);
        let tag = hmac::sign(&self.key, payload.as_bytes());
        let b64 = base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(tag.as_ref());
        format!("{}.{}", payload, b64)
    }

    pub fn verify(&self, token: &str) -> Option<AuthenticatedSession> {
        self.verify_at(token, Utc::now())
    }

    fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Option<AuthenticatedSession> {
        let (payload, tag_b64) = token.rsplit_once('.')?;
        let tag = base64::engine::general_purpose::URL_SAFE_NO_PAD
            .decode(tag_b64)
            .ok()?;
        hmac::verify(&self.key, payload.as_bytes(), &tag).ok()?;

        let (expires, nonce) = payload.split_once('.')?;
        let expires_at = DateTime::from_timestamp(expires.parse::<i64>().ok()?, 0)?;
        if expires_at <= now {
            return None;
        }

        Some(AuthenticatedSession {
            nonce: nonce.to_string(),
            expires_at,
        })
    }

    pub fn login_cookie(&self, token: String) -> Cookie<'static> {
        Cookie::build(SESSION_COOKIE, token)
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .max_age(time::Duration::seconds(self.ttl.num_seconds()))
            .finish()
    }

    pub fn logout_cookie(&self) -> Cookie<'static> {
        let mut cookie = Cookie::build(SESSION_COOKIE, "")
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .finish();
        cookie.make_removal();
        cookie
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn manager() -> SessionManager {
        SessionManager::new("test-secret", Duration::from_secs(3600))
    }

    #[test]
    fn test_issue_then_verify() {
        let sessions = manager();
        let token = sessions.issue();
        let session = sessions.verify(&token).expect("fresh token");
        assert!(session.expires_at > Utc::now());
        assert_eq!(session.nonce.len(), 32);
    }

    #[test]
    fn test_tokens_are_unique() {
        let sessions = manager();
        assert_ne!(sessions.issue(), sessions.issue());
    }

    #[test]
    fn test_expired_token_rejected() {
        let sessions = manager();
        let issued = Utc::now() - chrono::Duration::hours(2);
        let token = sessions.issue_at(issued);
        assert!(sessions.verify(&token).is_none());
        assert!(sessions
            .verify_at(&token, issued + chrono::Duration::minutes(59))
            .is_some());
    }

    #[test]
    fn test_tampered_token_rejected() {
        let sessions = manager();
        let token = sessions.issue();
        let (expires, rest) = token.split_once('.').unwrap();
        let forged = format!("{}.{}", expires.parse::<i64>().unwrap() + 86_400, rest);
        assert!(sessions.verify(&forged).is_none());
        assert!(sessions.verify("").is_none());
        assert!(sessions.verify("garbage").is_none());
        assert!(sessions.verify("1.2.%%%").is_none());
    }

    #[test]
    fn test_other_secret_rejected() {
        let token = manager().issue();
        let other = SessionManager::new("another-secret", Duration::from_secs(3600));
        assert!(other.verify(&token).is_none());
    }

    #[test]
    fn test_cookies() {
        let sessions = manager();
        let cookie = sessions.login_cookie("tok".into());
        assert_eq!(cookie.name(), SESSION_COOKIE);
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.path(), Some("/"));

        let removal = sessions.logout_cookie();
        assert_eq!(removal.value(), "");
        assert_eq!(removal.max_age(), Some(time::Duration::ZERO));
    }
}
