//! User records and the storage contract behind them.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

pub mod memory;
pub mod postgres;

pub use self::memory::MemoryStore;
pub use self::postgres::PgUserStore;

/// The sole persisted entity.
///
/// `username`/`password_hash` are set for locally registered users,
/// `oauth_id` for users created by a provider login. At least one credential
/// is always present; [`NewUser`] makes that unrepresentable at creation and
/// the Postgres schema enforces it with a CHECK constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    pub username: Option<String>,
    pub password_hash: Option<String>,
    pub oauth_id: Option<String>,
    pub secret: Option<String>,
}

/// Creation request for a [`User`].
#[derive(Debug, Clone)]
pub enum NewUser {
    Local {
        username: String,
        password_hash: String,
    },
    External {
        oauth_id: String,
    },
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("username already taken")]
    DuplicateUsername,
    #[error("oauth id already registered")]
    DuplicateOauthId,
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Storage contract for user records.
///
/// Uniqueness of `username` and `oauth_id` is the store's responsibility:
/// `create` must be atomic with respect to concurrent inserts of the same
/// key and report conflicts as the matching `StoreError` variant. Users are
/// never deleted.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;

    async fn find_by_oauth_id(&self, oauth_id: &str) -> Result<Option<User>, StoreError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    async fn create(&self, user: NewUser) -> Result<User, StoreError>;

    /// Unconditional overwrite of the user's secret; the store keeps only the
    /// latest value.
    async fn upsert_secret(&self, id: Uuid, secret: &str) -> Result<(), StoreError>;

    /// All non-null secrets, content only. The returned strings carry no
    /// identity-linking field, which is what keeps the shared listing
    /// anonymous.
    async fn list_secrets(&self) -> Result<Vec<String>, StoreError>;
}
