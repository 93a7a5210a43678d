use thiserror::Error;

use crate::confide::store::StoreError;

/// Everything that can go wrong between a request and the user store.
///
/// Route handlers recover all of these into redirects; only
/// `StoreUnavailable` surfaces as a 500.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("username already taken")]
    DuplicateUsername,
    #[error("no such user")]
    NoSuchUser,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("not authenticated")]
    NotAuthenticated,
    #[error("identity provider unavailable: {0}")]
    ProviderUnavailable(String),
    #[error("identity provider rejected the login: {0}")]
    ProviderRejected(String),
    #[error("user store unavailable: {0}")]
    StoreUnavailable(String),
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateUsername => Self::DuplicateUsername,
            // A duplicate oauth id is consumed by find-or-create; one escaping
            // to this boundary means the retry itself failed.
            StoreError::DuplicateOauthId => {
                Self::StoreUnavailable("conflicting oauth id".to_string())
            }
            StoreError::Unavailable(msg) => Self::StoreUnavailable(msg),
        }
    }
}
