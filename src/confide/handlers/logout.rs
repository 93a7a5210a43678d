use axum::{
    extract::Extension,
    http::{header::SET_COOKIE, HeaderMap},
    response::{IntoResponse, Redirect, Response},
};
use std::sync::Arc;

use crate::confide::{
    session::{clear_session_cookie, extract_session_token},
    AppState,
};

/// GET /logout
///
/// Destroys whatever session the cookie names and sends the client home.
/// Works the same whether or not the caller was authenticated.
pub async fn logout(headers: HeaderMap, Extension(state): Extension<Arc<AppState>>) -> Response {
    if let Some(token) = extract_session_token(&headers) {
        state.sessions.destroy(&token).await;
    }

    // Always clear the cookie, even if the session record was missing.
    let mut response_headers = HeaderMap::new();
    if let Ok(cookie) = clear_session_cookie() {
        response_headers.insert(SET_COOKIE, cookie);
    }
    (response_headers, Redirect::to("/")).into_response()
}
