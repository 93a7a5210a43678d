use axum::{
    extract::Extension,
    response::{Html, IntoResponse, Response},
};
use std::sync::Arc;

use super::store_failure;
use crate::confide::{pages, AppState};

/// GET /secrets — public, anonymized listing of every posted secret.
pub async fn secrets(Extension(state): Extension<Arc<AppState>>) -> Response {
    match state.store.list_secrets().await {
        Ok(secrets) => Html(pages::secrets(&secrets)).into_response(),
        Err(err) => store_failure("Failed to list secrets", &err.to_string()),
    }
}
