use axum::{
    extract::State,
    http::header,
    response::{Html, IntoResponse},
    Json,
};
use serde::Deserialize;

use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderMarkdownRequest {
    pub content: String,
    pub class_name: Option<String>,
}

/// POST /render-markdown
///
/// Renders the submitted markdown and returns the HTML fragment.
pub async fn handle_render_markdown(
    State(state): State<AppState>,
    Json(request): Json<RenderMarkdownRequest>,
) -> impl IntoResponse {
    let html = state
        .markdown
        .render(&request.content, request.class_name.as_deref());

    ([(header::CACHE_CONTROL, "no-store")], Html(html))
}
