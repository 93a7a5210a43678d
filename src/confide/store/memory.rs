//! In-memory engine for the user store.
//!
//! Backs `--dsn`-less dev runs and the test suite. Uniqueness checks run
//! under the map lock, so `create` has the same atomicity guarantee the
//! Postgres indexes provide.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{NewUser, StoreError, User, UserStore};

#[derive(Default)]
pub struct MemoryStore {
    users: Mutex<HashMap<Uuid, User>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let users = self.users.lock().await;
        Ok(users
            .values()
            .find(|user| user.username.as_deref() == Some(username))
            .cloned())
    }

    async fn find_by_oauth_id(&self, oauth_id: &str) -> Result<Option<User>, StoreError> {
        let users = self.users.lock().await;
        Ok(users
            .values()
            .find(|user| user.oauth_id.as_deref() == Some(oauth_id))
            .cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let users = self.users.lock().await;
        Ok(users.get(&id).cloned())
    }

    async fn create(&self, user: NewUser) -> Result<User, StoreError> {
        let mut users = self.users.lock().await;

        let user = match user {
            NewUser::Local {
                username,
                password_hash,
            } => {
                if users
                    .values()
                    .any(|existing| existing.username.as_deref() == Some(username.as_str()))
                {
                    return Err(StoreError::DuplicateUsername);
                }
                User {
                    id: Uuid::new_v4(),
                    username: Some(username),
                    password_hash: Some(password_hash),
                    oauth_id: None,
                    secret: None,
                }
            }
            NewUser::External { oauth_id } => {
                if users
                    .values()
                    .any(|existing| existing.oauth_id.as_deref() == Some(oauth_id.as_str()))
                {
                    return Err(StoreError::DuplicateOauthId);
                }
                User {
                    id: Uuid::new_v4(),
                    username: None,
                    password_hash: None,
                    oauth_id: Some(oauth_id),
                    secret: None,
                }
            }
        };

        users.insert(user.id, user.clone());

        Ok(user)
    }

    async fn upsert_secret(&self, id: Uuid, secret: &str) -> Result<(), StoreError> {
        let mut users = self.users.lock().await;
        match users.get_mut(&id) {
            Some(user) => {
                user.secret = Some(secret.to_string());
                Ok(())
            }
            None => Err(StoreError::Unavailable(format!("no user with id {id}"))),
        }
    }

    async fn list_secrets(&self) -> Result<Vec<String>, StoreError> {
        let users = self.users.lock().await;
        Ok(users.values().filter_map(|user| user.secret.clone()).collect())
    }
}
