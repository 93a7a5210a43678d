use axum::response::Html;

use crate::confide::pages;

pub async fn home() -> Html<String> {
    Html(pages::home())
}
