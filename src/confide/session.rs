//! Server-side session records and the cookie carrying their token.
//!
//! The token handed to the browser is 32 random bytes, URL-safe base64. The
//! server keeps only `SHA-256(secret ‖ token)` as the map key, so the
//! configured session secret must match for a presented token to resolve and
//! a leaked map yields no usable tokens.

use anyhow::{Context, Result};
use axum::http::{
    header::{InvalidHeaderValue, COOKIE},
    HeaderMap, HeaderValue,
};
use base64::Engine;
use rand::{rngs::OsRng, RngCore};
use secrecy::{ExposeSecret, SecretString};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use uuid::Uuid;

pub const SESSION_COOKIE_NAME: &str = "confide_session";

pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(60 * 60 * 24);

struct SessionEntry {
    user_id: Uuid,
    created_at: Instant,
}

/// Issues, resolves, and destroys session tokens.
///
/// All state is behind one lock; every binding expires `ttl` after creation.
pub struct SessionManager {
    secret: SecretString,
    ttl: Duration,
    sessions: Mutex<HashMap<Vec<u8>, SessionEntry>>,
}

impl SessionManager {
    #[must_use]
    pub fn new(secret: SecretString, ttl: Duration) -> Self {
        Self {
            secret,
            ttl,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Bind a fresh token to `user_id` and return the raw token.
    ///
    /// The raw value is only ever returned here, for the cookie; the map
    /// keeps the keyed hash.
    ///
    /// # Errors
    /// Returns an error if the system RNG fails.
    pub async fn create(&self, user_id: Uuid) -> Result<String> {
        let mut bytes = [0u8; 32];
        OsRng
            .try_fill_bytes(&mut bytes)
            .context("failed to generate session token")?;
        let token = base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes);

        let mut sessions = self.sessions.lock().await;
        sessions.retain(|_, entry| entry.created_at.elapsed() < self.ttl);
        sessions.insert(
            self.hash_token(&token),
            SessionEntry {
                user_id,
                created_at: Instant::now(),
            },
        );

        Ok(token)
    }

    /// Resolve a token to the bound user id.
    ///
    /// `None` when the token is unknown or expired; expired entries are
    /// dropped on the way out.
    pub async fn resolve(&self, token: &str) -> Option<Uuid> {
        let key = self.hash_token(token);
        let mut sessions = self.sessions.lock().await;
        match sessions.get(&key) {
            Some(entry) if entry.created_at.elapsed() < self.ttl => Some(entry.user_id),
            Some(_) => {
                sessions.remove(&key);
                None
            }
            None => None,
        }
    }

    /// Remove the binding. Destroying an unknown token is not an error.
    pub async fn destroy(&self, token: &str) {
        let key = self.hash_token(token);
        self.sessions.lock().await.remove(&key);
    }

    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn hash_token(&self, token: &str) -> Vec<u8> {
        let mut hasher = Sha256::new();
        hasher.update(self.secret.expose_secret().as_bytes());
        hasher.update(token.as_bytes());
        hasher.finalize().to_vec()
    }
}

/// Build the `HttpOnly` cookie carrying the session token.
pub fn session_cookie(token: &str, ttl: Duration) -> Result<HeaderValue, InvalidHeaderValue> {
    let max_age = ttl.as_secs();
    HeaderValue::from_str(&format!(
        "{SESSION_COOKIE_NAME}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age}"
    ))
}

pub fn clear_session_cookie() -> Result<HeaderValue, InvalidHeaderValue> {
    HeaderValue::from_str(&format!(
        "{SESSION_COOKIE_NAME}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0"
    ))
}

/// Pull the session token out of the request's cookie header, if any.
pub fn extract_session_token(headers: &HeaderMap) -> Option<String> {
    let header = headers.get(COOKIE)?;
    let value = header.to_str().ok()?;
    for pair in value.split(';') {
        let trimmed = pair.trim();
        let mut parts = trimmed.splitn(2, '=');
        let key = parts.next()?.trim();
        let val = parts.next()?.trim();
        if key == SESSION_COOKIE_NAME && !val.is_empty() {
            return Some(val.to_string());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager(ttl: Duration) -> SessionManager {
        SessionManager::new(SecretString::from("test-secret"), ttl)
    }

    #[tokio::test]
    async fn create_resolve_destroy() {
        let sessions = manager(DEFAULT_SESSION_TTL);
        let user_id = Uuid::new_v4();

        let token = sessions.create(user_id).await.unwrap();
        assert_eq!(sessions.resolve(&token).await, Some(user_id));

        sessions.destroy(&token).await;
        assert_eq!(sessions.resolve(&token).await, None);

        // Destroy is idempotent.
        sessions.destroy(&token).await;
    }

    #[tokio::test]
    async fn unknown_token_does_not_resolve() {
        let sessions = manager(DEFAULT_SESSION_TTL);
        assert_eq!(sessions.resolve("no-such-token").await, None);
    }

    #[tokio::test]
    async fn expired_token_does_not_resolve() {
        let sessions = manager(Duration::ZERO);
        let token = sessions.create(Uuid::new_v4()).await.unwrap();
        assert_eq!(sessions.resolve(&token).await, None);
    }

    #[tokio::test]
    async fn tokens_are_unique_per_session() {
        let sessions = manager(DEFAULT_SESSION_TTL);
        let first = sessions.create(Uuid::new_v4()).await.unwrap();
        let second = sessions.create(Uuid::new_v4()).await.unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn cookie_round_trip() {
        let cookie = session_cookie("tok123", DEFAULT_SESSION_TTL).unwrap();

        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_str(&format!(
                "other=1; {}",
                cookie.to_str().unwrap().split(';').next().unwrap()
            ))
            .unwrap(),
        );

        assert_eq!(extract_session_token(&headers), Some("tok123".to_string()));
    }

    #[test]
    fn missing_or_empty_cookie_yields_none() {
        let headers = HeaderMap::new();
        assert_eq!(extract_session_token(&headers), None);

        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("confide_session="));
        assert_eq!(extract_session_token(&headers), None);
    }

    #[test]
    fn clear_cookie_names_the_session_cookie() {
        let set = session_cookie("tok123", DEFAULT_SESSION_TTL).unwrap();
        let clear = clear_session_cookie().unwrap();

        // Both paths name the same cookie, so clearing always hits the one
        // that was set.
        let name = |value: &HeaderValue| {
            value
                .to_str()
                .unwrap()
                .split('=')
                .next()
                .unwrap()
                .to_string()
        };
        assert_eq!(name(&set), name(&clear));
        assert!(clear
            .to_str()
            .unwrap()
            .starts_with(&format!("{SESSION_COOKIE_NAME}=;")));
        assert!(clear.to_str().unwrap().contains("Max-Age=0"));
    }
}
