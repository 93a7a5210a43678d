use axum::{
    extract::Extension,
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

use super::{establish_session, store_failure};
use crate::confide::{error::AuthError, pages, password, AppState};

pub async fn register_page() -> Html<String> {
    Html(pages::register())
}

#[derive(Deserialize)]
pub struct Registration {
    username: String,
    password: String,
}

/// POST /register
///
/// A taken username lands back on the registration page; success establishes
/// a session immediately and redirects to the secrets listing.
pub async fn register(
    Extension(state): Extension<Arc<AppState>>,
    Form(registration): Form<Registration>,
) -> Response {
    match password::register(&state.store, &registration.username, &registration.password).await {
        Ok(user) => establish_session(&state, user.id).await,
        Err(AuthError::DuplicateUsername) => {
            debug!("Registration rejected: username taken");
            Redirect::to("/register").into_response()
        }
        Err(AuthError::StoreUnavailable(message)) => store_failure("Registration failed", &message),
        Err(err) => {
            debug!("Registration rejected: {err}");
            Redirect::to("/register").into_response()
        }
    }
}
