//! Postgres engine for the user store.

use async_trait::async_trait;
use sqlx::{PgPool, Row};
use tracing::Instrument;
use uuid::Uuid;

use super::{NewUser, StoreError, User, UserStore};

pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn find_one(&self, query: &str, bind: &str) -> Result<Option<User>, StoreError> {
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );
        let row = sqlx::query(query)
            .bind(bind)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await
            .map_err(store_error)?;

        Ok(row.map(user_from_row))
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let query = "SELECT id, username, password_hash, oauth_id, secret FROM users WHERE username = $1";
        self.find_one(query, username).await
    }

    async fn find_by_oauth_id(&self, oauth_id: &str) -> Result<Option<User>, StoreError> {
        let query = "SELECT id, username, password_hash, oauth_id, secret FROM users WHERE oauth_id = $1";
        self.find_one(query, oauth_id).await
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let query =
            "SELECT id, username, password_hash, oauth_id, secret FROM users WHERE id = $1";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );
        let row = sqlx::query(query)
            .bind(id)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await
            .map_err(store_error)?;

        Ok(row.map(user_from_row))
    }

    async fn create(&self, user: NewUser) -> Result<User, StoreError> {
        let (username, password_hash, oauth_id) = match user {
            NewUser::Local {
                username,
                password_hash,
            } => (Some(username), Some(password_hash), None),
            NewUser::External { oauth_id } => (None, None, Some(oauth_id)),
        };

        let query = r"
            INSERT INTO users (username, password_hash, oauth_id)
            VALUES ($1, $2, $3)
            RETURNING id
        ";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "INSERT",
            db.statement = query
        );
        let row = sqlx::query(query)
            .bind(&username)
            .bind(&password_hash)
            .bind(&oauth_id)
            .fetch_one(&self.pool)
            .instrument(span)
            .await
            .map_err(store_error)?;

        Ok(User {
            id: row.get("id"),
            username,
            password_hash,
            oauth_id,
            secret: None,
        })
    }

    async fn upsert_secret(&self, id: Uuid, secret: &str) -> Result<(), StoreError> {
        let query = "UPDATE users SET secret = $2 WHERE id = $1";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "UPDATE",
            db.statement = query
        );
        sqlx::query(query)
            .bind(id)
            .bind(secret)
            .execute(&self.pool)
            .instrument(span)
            .await
            .map_err(store_error)?;

        Ok(())
    }

    async fn list_secrets(&self) -> Result<Vec<String>, StoreError> {
        let query = "SELECT secret FROM users WHERE secret IS NOT NULL";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );
        let rows = sqlx::query(query)
            .fetch_all(&self.pool)
            .instrument(span)
            .await
            .map_err(store_error)?;

        Ok(rows.into_iter().map(|row| row.get("secret")).collect())
    }
}

fn user_from_row(row: sqlx::postgres::PgRow) -> User {
    User {
        id: row.get("id"),
        username: row.get("username"),
        password_hash: row.get("password_hash"),
        oauth_id: row.get("oauth_id"),
        secret: row.get("secret"),
    }
}

/// Map a sqlx error onto the store taxonomy, discriminating unique
/// violations (SQLSTATE 23505) by the index that fired.
fn store_error(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.code().is_some_and(|code| code.as_ref() == "23505") {
            return match db_err.constraint() {
                Some(constraint) if constraint.contains("oauth") => StoreError::DuplicateOauthId,
                Some(constraint) if constraint.contains("username") => {
                    StoreError::DuplicateUsername
                }
                _ => StoreError::Unavailable(err.to_string()),
            };
        }
    }
    StoreError::Unavailable(err.to_string())
}
