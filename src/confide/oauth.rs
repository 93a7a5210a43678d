//! Google OAuth bridge: consent redirect, code exchange, and the
//! find-or-create mapping from a provider subject to a local user.

use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::sync::Arc;
use url::Url;

use super::error::AuthError;
use super::store::{NewUser, StoreError, User, UserStore};
use crate::APP_USER_AGENT;

const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const GOOGLE_USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v3/userinfo";

/// What the provider tells us about a signed-in subject.
#[derive(Debug)]
pub struct ProviderProfile {
    pub id: String,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Deserialize)]
struct UserInfo {
    sub: String,
}

pub struct GoogleOauth {
    client_id: String,
    client_secret: SecretString,
    callback_url: String,
    auth_url: String,
    token_url: String,
    userinfo_url: String,
}

impl GoogleOauth {
    #[must_use]
    pub fn new(client_id: String, client_secret: SecretString, callback_url: String) -> Self {
        Self {
            client_id,
            client_secret,
            callback_url,
            auth_url: GOOGLE_AUTH_URL.to_string(),
            token_url: GOOGLE_TOKEN_URL.to_string(),
            userinfo_url: GOOGLE_USERINFO_URL.to_string(),
        }
    }

    /// Point the endpoints somewhere else (tests, fake providers).
    #[must_use]
    pub fn with_endpoints(
        mut self,
        auth_url: String,
        token_url: String,
        userinfo_url: String,
    ) -> Self {
        self.auth_url = auth_url;
        self.token_url = token_url;
        self.userinfo_url = userinfo_url;
        self
    }

    /// Consent-screen URL the login page sends the browser to.
    ///
    /// # Errors
    /// `ProviderUnavailable` if the configured endpoint is not a valid URL.
    pub fn authorize_url(&self) -> Result<String, AuthError> {
        let mut url = Url::parse(&self.auth_url)
            .map_err(|err| AuthError::ProviderUnavailable(err.to_string()))?;
        url.query_pairs_mut()
            .append_pair("response_type", "code")
            .append_pair("client_id", &self.client_id)
            .append_pair("redirect_uri", &self.callback_url)
            .append_pair("scope", "profile");
        Ok(String::from(url))
    }

    /// Exchange the callback code for the provider profile.
    ///
    /// One awaited call covering token exchange and the userinfo fetch.
    ///
    /// # Errors
    /// `ProviderUnavailable` for transport failures, `ProviderRejected` when
    /// the provider answers with a non-success status or a malformed body.
    pub async fn exchange_code(&self, code: &str) -> Result<ProviderProfile, AuthError> {
        let client = Client::builder()
            .user_agent(APP_USER_AGENT)
            .build()
            .map_err(|err| AuthError::ProviderUnavailable(err.to_string()))?;

        let params = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.expose_secret()),
            ("redirect_uri", self.callback_url.as_str()),
        ];

        let response = client
            .post(&self.token_url)
            .form(&params)
            .send()
            .await
            .map_err(|err| AuthError::ProviderUnavailable(err.to_string()))?;

        if !response.status().is_success() {
            return Err(AuthError::ProviderRejected(format!(
                "token exchange returned {}",
                response.status()
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|err| AuthError::ProviderRejected(err.to_string()))?;

        let response = client
            .get(&self.userinfo_url)
            .bearer_auth(&token.access_token)
            .send()
            .await
            .map_err(|err| AuthError::ProviderUnavailable(err.to_string()))?;

        if !response.status().is_success() {
            return Err(AuthError::ProviderRejected(format!(
                "userinfo returned {}",
                response.status()
            )));
        }

        let info: UserInfo = response
            .json()
            .await
            .map_err(|err| AuthError::ProviderRejected(err.to_string()))?;

        Ok(ProviderProfile { id: info.sub })
    }
}

/// Map a provider subject to a local user, creating one on first login.
///
/// Atomic with respect to concurrent identical logins: the store's unique
/// constraint on `oauth_id` decides the winner, and the loser re-reads the
/// winner's record instead of failing.
///
/// # Errors
/// `StoreUnavailable` on store failure.
pub async fn find_or_create_by_provider_id(
    store: &Arc<dyn UserStore>,
    provider_id: &str,
) -> Result<User, AuthError> {
    if let Some(user) = store.find_by_oauth_id(provider_id).await? {
        return Ok(user);
    }

    match store
        .create(NewUser::External {
            oauth_id: provider_id.to_string(),
        })
        .await
    {
        Ok(user) => Ok(user),
        // Lost the create race; the conflicting row is the user we want.
        Err(StoreError::DuplicateOauthId) => store
            .find_by_oauth_id(provider_id)
            .await?
            .ok_or_else(|| AuthError::StoreUnavailable("oauth id vanished after conflict".into())),
        Err(err) => Err(err.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::confide::store::MemoryStore;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};
    use uuid::Uuid;

    fn bridge() -> GoogleOauth {
        GoogleOauth::new(
            "client-id".to_string(),
            SecretString::from("client-secret"),
            "http://localhost:3000/auth/google/secrets".to_string(),
        )
    }

    #[test]
    fn authorize_url_carries_the_oauth_parameters() {
        let url = bridge().authorize_url().unwrap();
        assert!(url.starts_with(GOOGLE_AUTH_URL));
        assert!(url.contains("response_type=code"));
        assert!(url.contains("client_id=client-id"));
        assert!(url.contains("scope=profile"));
        assert!(url.contains(
            "redirect_uri=http%3A%2F%2Flocalhost%3A3000%2Fauth%2Fgoogle%2Fsecrets"
        ));
    }

    /// Serve a stand-in provider on an ephemeral local port.
    async fn serve_provider(app: axum::Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind provider");
        let addr = listener.local_addr().expect("provider addr");
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn exchange_code_round_trip_against_stand_in_provider() {
        use axum::{
            routing::{get, post},
            Json, Router,
        };
        use serde_json::json;

        let app = Router::new()
            .route(
                "/token",
                post(|| async { Json(json!({"access_token": "tok", "token_type": "Bearer"})) }),
            )
            .route("/userinfo", get(|| async { Json(json!({"sub": "g-456"})) }));
        let base = serve_provider(app).await;

        let oauth = bridge().with_endpoints(
            format!("{base}/auth"),
            format!("{base}/token"),
            format!("{base}/userinfo"),
        );

        let profile = oauth.exchange_code("good-code").await.unwrap();
        assert_eq!(profile.id, "g-456");
    }

    #[tokio::test]
    async fn rejected_code_exchange_is_provider_rejected() {
        use axum::{http::StatusCode, routing::post, Router};

        let app = Router::new().route("/token", post(|| async { StatusCode::UNAUTHORIZED }));
        let base = serve_provider(app).await;

        let oauth = bridge().with_endpoints(
            format!("{base}/auth"),
            format!("{base}/token"),
            format!("{base}/userinfo"),
        );

        let err = oauth.exchange_code("bad-code").await.unwrap_err();
        assert!(matches!(err, AuthError::ProviderRejected(_)));
    }

    #[tokio::test]
    async fn malformed_token_body_is_provider_rejected() {
        use axum::{routing::post, Router};

        let app = Router::new().route("/token", post(|| async { "not json" }));
        let base = serve_provider(app).await;

        let oauth = bridge().with_endpoints(
            format!("{base}/auth"),
            format!("{base}/token"),
            format!("{base}/userinfo"),
        );

        let err = oauth.exchange_code("code").await.unwrap_err();
        assert!(matches!(err, AuthError::ProviderRejected(_)));
    }

    #[tokio::test]
    async fn unreachable_provider_is_provider_unavailable() {
        // Port 1 on loopback refuses connections; the exchange never gets an
        // HTTP response.
        let oauth = bridge().with_endpoints(
            "http://127.0.0.1:1/auth".to_string(),
            "http://127.0.0.1:1/token".to_string(),
            "http://127.0.0.1:1/userinfo".to_string(),
        );

        let err = oauth.exchange_code("code").await.unwrap_err();
        assert!(matches!(err, AuthError::ProviderUnavailable(_)));
    }

    #[tokio::test]
    async fn find_or_create_returns_existing_user() {
        let store: Arc<dyn UserStore> = Arc::new(MemoryStore::new());
        let first = find_or_create_by_provider_id(&store, "g-123").await.unwrap();
        let second = find_or_create_by_provider_id(&store, "g-123").await.unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(first.oauth_id.as_deref(), Some("g-123"));
    }

    #[tokio::test]
    async fn concurrent_first_logins_yield_one_user() {
        let store: Arc<dyn UserStore> = Arc::new(MemoryStore::new());

        let left = tokio::spawn({
            let store = store.clone();
            async move { find_or_create_by_provider_id(&store, "g-123").await }
        });
        let right = tokio::spawn({
            let store = store.clone();
            async move { find_or_create_by_provider_id(&store, "g-123").await }
        });

        let left = left.await.unwrap().unwrap();
        let right = right.await.unwrap().unwrap();
        assert_eq!(left.id, right.id);
    }

    /// Store that pretends the user does not exist on the first lookup, so
    /// the bridge hits the create-conflict-reread path.
    struct RacyStore {
        inner: MemoryStore,
        raced: AtomicBool,
    }

    #[async_trait]
    impl UserStore for RacyStore {
        async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
            self.inner.find_by_username(username).await
        }

        async fn find_by_oauth_id(&self, oauth_id: &str) -> Result<Option<User>, StoreError> {
            if !self.raced.swap(true, Ordering::SeqCst) {
                return Ok(None);
            }
            self.inner.find_by_oauth_id(oauth_id).await
        }

        async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
            self.inner.find_by_id(id).await
        }

        async fn create(&self, user: NewUser) -> Result<User, StoreError> {
            self.inner.create(user).await
        }

        async fn upsert_secret(&self, id: Uuid, secret: &str) -> Result<(), StoreError> {
            self.inner.upsert_secret(id, secret).await
        }

        async fn list_secrets(&self) -> Result<Vec<String>, StoreError> {
            self.inner.list_secrets().await
        }
    }

    #[tokio::test]
    async fn lost_create_race_rereads_the_winner() {
        let inner = MemoryStore::new();
        let winner = inner
            .create(NewUser::External {
                oauth_id: "g-123".to_string(),
            })
            .await
            .unwrap();

        let store: Arc<dyn UserStore> = Arc::new(RacyStore {
            inner,
            raced: AtomicBool::new(false),
        });

        let resolved = find_or_create_by_provider_id(&store, "g-123").await.unwrap();
        assert_eq!(resolved.id, winner.id);
    }
}
