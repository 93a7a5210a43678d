use axum::{
    extract::Extension,
    http::HeaderMap,
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use serde::Deserialize;
use std::sync::Arc;

use super::{current_user, store_failure};
use crate::confide::{error::AuthError, pages, AppState};

/// GET /submit — the submission form, for authenticated users only.
pub async fn submit_page(
    headers: HeaderMap,
    Extension(state): Extension<Arc<AppState>>,
) -> Response {
    match current_user(&headers, &state).await {
        Ok(_) => Html(pages::submit()).into_response(),
        Err(AuthError::StoreUnavailable(message)) => store_failure("Submit page failed", &message),
        Err(_) => Redirect::to("/login").into_response(),
    }
}

#[derive(Deserialize)]
pub struct SecretForm {
    secret: String,
}

/// POST /submit
///
/// Overwrites the caller's secret unconditionally; the store keeps only the
/// latest value per user.
pub async fn submit(
    headers: HeaderMap,
    Extension(state): Extension<Arc<AppState>>,
    Form(form): Form<SecretForm>,
) -> Response {
    let user = match current_user(&headers, &state).await {
        Ok(user) => user,
        Err(AuthError::StoreUnavailable(message)) => {
            return store_failure("Submit failed", &message)
        }
        Err(_) => return Redirect::to("/login").into_response(),
    };

    match state.store.upsert_secret(user.id, &form.secret).await {
        Ok(()) => Redirect::to("/secrets").into_response(),
        Err(err) => store_failure("Failed to store secret", &err.to_string()),
    }
}
