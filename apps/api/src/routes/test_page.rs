use axum::response::Html;

/// GET /test
/// Browser harness: posts JSON to /generate-pdf and downloads the result.
pub async fn test_page_handler() -> Html<&'static str> {
    Html(include_str!("../../static/test.html"))
}
