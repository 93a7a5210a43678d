use axum::{
    extract::{Extension, Query},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, error};

use super::{establish_session, store_failure};
use crate::confide::{error::AuthError, oauth, AppState};

/// GET /auth/google — send the browser to the provider consent screen.
pub async fn google(Extension(state): Extension<Arc<AppState>>) -> Response {
    let Some(oauth) = &state.oauth else {
        debug!("Google OAuth not configured");
        return Redirect::to("/login").into_response();
    };

    match oauth.authorize_url() {
        Ok(url) => Redirect::to(&url).into_response(),
        Err(err) => {
            error!("Failed to build authorize URL: {err}");
            Redirect::to("/login").into_response()
        }
    }
}

#[derive(Deserialize)]
pub struct CallbackQuery {
    code: Option<String>,
}

/// GET /auth/google/secrets — the OAuth callback.
///
/// Exchanges the code, maps the provider subject to a local user (creating
/// one on first login), establishes a session, and lands on the secrets
/// listing. Any provider failure lands back on the login page.
pub async fn google_callback(
    Extension(state): Extension<Arc<AppState>>,
    Query(query): Query<CallbackQuery>,
) -> Response {
    let Some(oauth) = &state.oauth else {
        return Redirect::to("/login").into_response();
    };

    // No code means the user denied consent or the provider errored out.
    let Some(code) = query.code.as_deref() else {
        debug!("OAuth callback without a code");
        return Redirect::to("/login").into_response();
    };

    let profile = match oauth.exchange_code(code).await {
        Ok(profile) => profile,
        Err(err) => {
            error!("OAuth code exchange failed: {err}");
            return Redirect::to("/login").into_response();
        }
    };

    match oauth::find_or_create_by_provider_id(&state.store, &profile.id).await {
        Ok(user) => establish_session(&state, user.id).await,
        Err(AuthError::StoreUnavailable(message)) => {
            store_failure("OAuth find-or-create failed", &message)
        }
        Err(err) => {
            error!("OAuth login failed: {err}");
            Redirect::to("/login").into_response()
        }
    }
}
