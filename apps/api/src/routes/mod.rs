pub mod health;
pub mod test_page;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, Method},
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};

use crate::estimate::handlers::{handle_generate_pdf, handle_preflight};
use crate::markdown::handlers::handle_render_markdown;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
        .expose_headers([header::CONTENT_DISPOSITION]);

    Router::new()
        .route("/health", get(health::health_handler))
        .route("/test", get(test_page::test_page_handler))
        // Estimate PDF API. `/api/generate-pdf` is kept for existing clients.
        .route(
            "/generate-pdf",
            post(handle_generate_pdf).options(handle_preflight),
        )
        .route(
            "/api/generate-pdf",
            post(handle_generate_pdf).options(handle_preflight),
        )
        .route("/render-markdown", post(handle_render_markdown))
        .layer(DefaultBodyLimit::max(state.config.max_body_bytes))
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
        response::Response,
    };
    use serde_json::Value;
    use tower::ServiceExt;

    use super::*;
    use crate::config::Config;
    use crate::markdown::MarkdownRenderer;
    use crate::models::estimate::EstimateRequest;
    use crate::pdf::{EstimatePdfGenerator, GenerationError, PdfGenerator};

    /// Records how often it was called and returns a fixed buffer.
    #[derive(Default)]
    struct CountingGenerator {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl PdfGenerator for CountingGenerator {
        async fn generate(&self, _estimate: &EstimateRequest) -> Result<Vec<u8>, GenerationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(b"%PDF-1.4 counted".to_vec())
        }
    }

    struct FailingGenerator;

    #[async_trait]
    impl PdfGenerator for FailingGenerator {
        async fn generate(&self, _estimate: &EstimateRequest) -> Result<Vec<u8>, GenerationError> {
            Err(GenerationError::Serialize("renderer exploded".to_string()))
        }
    }

    fn app_with(pdf: Arc<dyn PdfGenerator>) -> Router {
        build_router(AppState {
            config: Config::default(),
            pdf,
            markdown: MarkdownRenderer::new(),
        })
    }

    fn real_app() -> Router {
        let config = Config::default();
        app_with(Arc::new(EstimatePdfGenerator::new(
            config.issuer.clone(),
            config.pdf_max_pages,
        )))
    }

    fn json_request(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn multipart_request(fields: &[(&str, &str)]) -> Request<Body> {
        let boundary = "----estimate-test-boundary";
        let mut body = String::new();
        for (name, value) in fields {
            body.push_str(&format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            ));
        }
        body.push_str(&format!("--{boundary}--\r\n"));

        Request::builder()
            .method("POST")
            .uri("/generate-pdf")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    async fn body_bytes(response: Response) -> Vec<u8> {
        axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap()
            .to_vec()
    }

    async fn body_json(response: Response) -> Value {
        serde_json::from_slice(&body_bytes(response).await).unwrap()
    }

    const ONE_ITEM: &str = r#"[{"description":"A","units":1,"cost":10,"amount":10}]"#;

    #[tokio::test]
    async fn test_json_request_returns_pdf() {
        let body = r#"{
            "estimateNumber": "00031",
            "to": "Jane Smith\nABC Corporation",
            "items": [
                {"description": "Consultation services", "units": 10, "cost": 540, "amount": 5400},
                {"description": "Installation work", "units": 5, "cost": 200, "amount": 1000}
            ]
        }"#;
        let response = real_app()
            .oneshot(json_request("/generate-pdf", body))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let headers = response.headers().clone();
        assert_eq!(headers[header::CONTENT_TYPE], "application/pdf");
        assert_eq!(
            headers[header::CONTENT_DISPOSITION],
            "attachment; filename=\"estimate-00031.pdf\""
        );

        let bytes = body_bytes(response).await;
        assert!(bytes.starts_with(b"%PDF-"));
        assert_eq!(
            headers[header::CONTENT_LENGTH].to_str().unwrap(),
            bytes.len().to_string()
        );
    }

    #[tokio::test]
    async fn test_multipart_single_items_field_uses_default_number() {
        let response = real_app()
            .oneshot(multipart_request(&[("to", "X"), ("items", ONE_ITEM)]))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"estimate-00001.pdf\""
        );
        assert!(!body_bytes(response).await.is_empty());
    }

    #[tokio::test]
    async fn test_multipart_malformed_items_are_dropped_not_fatal() {
        let generator = Arc::new(CountingGenerator::default());
        let response = app_with(generator.clone())
            .oneshot(multipart_request(&[
                ("to", "X"),
                ("items[]", r#"{"description":"ok","amount":1}"#),
                ("items[]", r#"{"description": oops}"#),
            ]))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(generator.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_empty_items_is_400_and_generator_not_called() {
        let generator = Arc::new(CountingGenerator::default());
        let response = app_with(generator.clone())
            .oneshot(multipart_request(&[("to", "X"), ("items", "[]")]))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert!(body["error"]
            .as_str()
            .unwrap()
            .contains("Missing required fields"));
        assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_missing_recipient_is_400_and_generator_not_called() {
        let generator = Arc::new(CountingGenerator::default());
        let body = format!(r#"{{"items": {ONE_ITEM}}}"#);
        let response = app_with(generator.clone())
            .oneshot(json_request("/generate-pdf", &body))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_all_items_malformed_is_400_not_500() {
        let generator = Arc::new(CountingGenerator::default());
        let response = app_with(generator.clone())
            .oneshot(multipart_request(&[("to", "X"), ("items[]", "{nope"), ("items[]", "[")]))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_generation_failure_is_500_with_details() {
        let body = format!(r#"{{"to": "X", "items": {ONE_ITEM}}}"#);
        let response = app_with(Arc::new(FailingGenerator))
            .oneshot(json_request("/generate-pdf", &body))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["error"], "Failed to generate PDF");
        assert!(body["details"]
            .as_str()
            .unwrap()
            .contains("renderer exploded"));
    }

    #[tokio::test]
    async fn test_legacy_api_path_is_served() {
        let body = format!(r#"{{"to": "X", "items": {ONE_ITEM}}}"#);
        let response = app_with(Arc::new(CountingGenerator::default()))
            .oneshot(json_request("/api/generate-pdf", &body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_unsupported_content_type_is_415() {
        let request = Request::builder()
            .method("POST")
            .uri("/generate-pdf")
            .header(header::CONTENT_TYPE, "text/plain")
            .body(Body::from("to=X"))
            .unwrap();
        let response = real_app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    }

    #[tokio::test]
    async fn test_oversized_body_is_rejected() {
        let generator = Arc::new(CountingGenerator::default());
        let app = build_router(AppState {
            config: Config {
                max_body_bytes: 64,
                ..Config::default()
            },
            pdf: generator.clone(),
            markdown: MarkdownRenderer::new(),
        });
        let body = format!(r#"{{"to": "{}", "items": {ONE_ITEM}}}"#, "X".repeat(500));
        let response = app.oneshot(json_request("/generate-pdf", &body)).await.unwrap();

        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_oversized_multipart_body_is_413() {
        let generator = Arc::new(CountingGenerator::default());
        let app = build_router(AppState {
            config: Config {
                max_body_bytes: 256,
                ..Config::default()
            },
            pdf: generator.clone(),
            markdown: MarkdownRenderer::new(),
        });
        let recipient = "X".repeat(5000);
        let response = app
            .oneshot(multipart_request(&[("to", &recipient), ("items", ONE_ITEM)]))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_item_longer_than_a_page_still_returns_pdf() {
        let description = "word ".repeat(700);
        let body = format!(
            r#"{{"to": "X", "items": [{{"description": "{description}", "units": 1, "cost": 10, "amount": 10}}]}}"#
        );
        let response = real_app()
            .oneshot(json_request("/generate-pdf", &body))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/pdf");
        assert!(body_bytes(response).await.starts_with(b"%PDF-"));
    }

    #[tokio::test]
    async fn test_plain_options_returns_cors_headers() {
        let request = Request::builder()
            .method("OPTIONS")
            .uri("/generate-pdf")
            .body(Body::empty())
            .unwrap();
        let response = real_app().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        assert!(response
            .headers()
            .contains_key(header::ACCESS_CONTROL_ALLOW_METHODS));
        assert!(body_bytes(response).await.is_empty());
    }

    #[tokio::test]
    async fn test_browser_preflight_is_answered() {
        let request = Request::builder()
            .method("OPTIONS")
            .uri("/generate-pdf")
            .header(header::ORIGIN, "https://app.example.com")
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
            .body(Body::empty())
            .unwrap();
        let response = real_app().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        let methods = response.headers()[header::ACCESS_CONTROL_ALLOW_METHODS]
            .to_str()
            .unwrap()
            .to_string();
        assert!(methods.contains("POST"));
        assert!(body_bytes(response).await.is_empty());
    }

    #[tokio::test]
    async fn test_cross_origin_post_exposes_content_disposition() {
        let mut request = json_request(
            "/generate-pdf",
            &format!(r#"{{"to": "X", "items": {ONE_ITEM}}}"#),
        );
        request
            .headers_mut()
            .insert(header::ORIGIN, "https://app.example.com".parse().unwrap());
        let response = app_with(Arc::new(CountingGenerator::default()))
            .oneshot(request)
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let exposed = response.headers()[header::ACCESS_CONTROL_EXPOSE_HEADERS]
            .to_str()
            .unwrap()
            .to_ascii_lowercase();
        assert!(exposed.contains("content-disposition"));
    }

    #[tokio::test]
    async fn test_render_markdown_endpoint() {
        let response = real_app()
            .oneshot(json_request(
                "/render-markdown",
                r##"{"content": "# Hello\n\n*world*", "className": "extra"}"##,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers()[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/html"));
        let html = String::from_utf8(body_bytes(response).await).unwrap();
        assert!(html.contains("dark:prose-invert extra"));
        assert!(html.contains("<h1 class=\"text-xl font-bold mb-2\">Hello</h1>"));
    }

    #[tokio::test]
    async fn test_health_and_test_page() {
        let response = real_app()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let health = body_json(response).await;
        assert_eq!(health["status"], "ok");
        assert_eq!(health["pdf"]["maxPages"], 50);

        let response = real_app()
            .oneshot(Request::builder().uri("/test").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let html = String::from_utf8(body_bytes(response).await).unwrap();
        assert!(html.contains("/generate-pdf"));
    }
}
