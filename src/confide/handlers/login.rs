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

pub async fn login_page() -> Html<String> {
    Html(pages::login())
}

#[derive(Deserialize)]
pub struct Credentials {
    username: String,
    password: String,
}

/// POST /login
///
/// Credentials are verified first; a session exists only after verification
/// succeeds. Verification failures land back on the login page.
pub async fn login(
    Extension(state): Extension<Arc<AppState>>,
    Form(credentials): Form<Credentials>,
) -> Response {
    match password::verify(&state.store, &credentials.username, &credentials.password).await {
        Ok(user) => establish_session(&state, user.id).await,
        Err(AuthError::StoreUnavailable(message)) => store_failure("Login failed", &message),
        Err(err) => {
            debug!("Login rejected: {err}");
            Redirect::to("/login").into_response()
        }
    }
}
