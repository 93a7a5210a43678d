//! Credential hashing and verification.
//!
//! Argon2id everywhere; the PHC string embeds the salt. Hashing runs on the
//! blocking thread pool so the async runtime is never stalled by the
//! memory-hard function.

use anyhow::{anyhow, Context, Result};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use std::sync::{Arc, OnceLock};

use super::error::AuthError;
use super::store::{NewUser, User, UserStore};

static DUMMY_HASH: OnceLock<String> = OnceLock::new();

/// Derive a salted Argon2id hash for a new password.
///
/// # Errors
/// Returns an error if hashing fails or the blocking task is cancelled.
pub async fn hash_password(password: &str) -> Result<String> {
    let password = password.to_string();
    tokio::task::spawn_blocking(move || {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|err| anyhow!("failed to hash password: {err}"))
    })
    .await
    .context("password hashing task failed")?
}

/// Check a password against a stored PHC string.
///
/// The comparison of the derived hash against the stored one is the argon2
/// crate's constant-time verify. An unparsable stored hash verifies as false.
pub async fn verify_password(password: &str, stored: &str) -> bool {
    let password = password.to_string();
    let stored = stored.to_string();
    tokio::task::spawn_blocking(move || {
        PasswordHash::new(&stored).is_ok_and(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
    })
    .await
    .unwrap_or(false)
}

/// Burn the same hashing cost as a real verification.
///
/// Called when the username is unknown or carries no local credential, so
/// response timing does not reveal whether an account exists.
pub async fn verify_dummy(password: &str) {
    let password = password.to_string();
    let _ = tokio::task::spawn_blocking(move || {
        let dummy = DUMMY_HASH.get_or_init(|| {
            let salt = SaltString::generate(&mut OsRng);
            Argon2::default()
                .hash_password(b"confide-dummy-credential", &salt)
                .map(|hash| hash.to_string())
                .unwrap_or_default()
        });
        PasswordHash::new(dummy).is_ok_and(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
    })
    .await;
}

/// Register a local user.
///
/// # Errors
/// `DuplicateUsername` if the name is taken; `StoreUnavailable` on store
/// failure.
pub async fn register(
    store: &Arc<dyn UserStore>,
    username: &str,
    password: &str,
) -> Result<User, AuthError> {
    let password_hash = hash_password(password)
        .await
        .map_err(|err| AuthError::StoreUnavailable(err.to_string()))?;

    let user = store
        .create(NewUser::Local {
            username: username.to_string(),
            password_hash,
        })
        .await?;

    Ok(user)
}

/// Verify a username/password pair against the store.
///
/// # Errors
/// `NoSuchUser` for unknown usernames, `InvalidCredentials` for a wrong
/// password. Both paths pay the full hashing cost.
pub async fn verify(
    store: &Arc<dyn UserStore>,
    username: &str,
    password: &str,
) -> Result<User, AuthError> {
    let Some(user) = store.find_by_username(username).await? else {
        verify_dummy(password).await;
        return Err(AuthError::NoSuchUser);
    };

    let Some(stored) = user.password_hash.as_deref() else {
        // OAuth-only record; there is no local credential to match.
        verify_dummy(password).await;
        return Err(AuthError::InvalidCredentials);
    };

    if verify_password(password, stored).await {
        Ok(user)
    } else {
        Err(AuthError::InvalidCredentials)
    }
}
