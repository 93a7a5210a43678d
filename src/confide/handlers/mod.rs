pub mod google;
pub mod health;
pub mod home;
pub mod login;
pub mod logout;
pub mod register;
pub mod secrets;
pub mod submit;

pub use self::google::{google, google_callback};
pub use self::health::health;
pub use self::home::home;
pub use self::login::{login, login_page};
pub use self::logout::logout;
pub use self::register::{register, register_page};
pub use self::secrets::secrets;
pub use self::submit::{submit, submit_page};

// common functions for the handlers
use axum::{
    http::{header::SET_COOKIE, HeaderMap, StatusCode},
    response::{IntoResponse, Redirect, Response},
};
use tracing::error;
use uuid::Uuid;

use super::error::AuthError;
use super::session::{extract_session_token, session_cookie};
use super::store::User;
use super::AppState;

/// Resolve the request's session cookie to a user record.
///
/// # Errors
/// `NotAuthenticated` when the cookie is missing, unknown, expired, or the
/// bound user no longer resolves; `StoreUnavailable` on store failure.
pub(crate) async fn current_user(
    headers: &HeaderMap,
    state: &AppState,
) -> Result<User, AuthError> {
    let token = extract_session_token(headers).ok_or(AuthError::NotAuthenticated)?;
    let user_id = state
        .sessions
        .resolve(&token)
        .await
        .ok_or(AuthError::NotAuthenticated)?;
    state
        .store
        .find_by_id(user_id)
        .await?
        .ok_or(AuthError::NotAuthenticated)
}

/// Bind a fresh session to `user_id`, set the cookie, and send the client to
/// the secrets listing.
pub(crate) async fn establish_session(state: &AppState, user_id: Uuid) -> Response {
    let token = match state.sessions.create(user_id).await {
        Ok(token) => token,
        Err(err) => {
            error!("Failed to create session: {err}");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    match session_cookie(&token, state.sessions.ttl()) {
        Ok(cookie) => {
            let mut headers = HeaderMap::new();
            headers.insert(SET_COOKIE, cookie);
            (headers, Redirect::to("/secrets")).into_response()
        }
        Err(err) => {
            error!("Failed to build session cookie: {err}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Store failures are logged server-side and surfaced as a bare 500; they are
/// never fatal to the process and never leak details to the client.
pub(crate) fn store_failure(context: &str, message: &str) -> Response {
    error!("{context}: {message}");
    StatusCode::INTERNAL_SERVER_ERROR.into_response()
}
