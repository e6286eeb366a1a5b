//! Axum route handlers for the estimate PDF endpoint.

use std::time::Instant;

use axum::{
    body::{Body, Bytes},
    extract::{Request, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::errors::AppError;
use crate::estimate::payload::read_estimate_draft;
use crate::models::estimate::GeneratedDocument;
use crate::state::AppState;

/// POST /generate-pdf
///
/// Accepts JSON, multipart or URL-encoded estimate data and answers with the
/// rendered PDF as an attachment. Validation failures are 400 and never reach
/// the generator; generator failures are 500.
pub async fn handle_generate_pdf(
    State(state): State<AppState>,
    request: Request,
) -> Result<Response, AppError> {
    let request_id = Uuid::new_v4();

    async move {
        info!("PDF generation request received");

        let draft = read_estimate_draft(request).await?;
        let estimate = draft.validate().map_err(|e| {
            warn!("Validation failed: {e}");
            e
        })?;

        info!(
            items = estimate.items.len(),
            estimate_number = %estimate.estimate_number,
            "Validation passed, generating PDF"
        );

        let started = Instant::now();
        let bytes = state.pdf.generate(&estimate).await?;

        let document = GeneratedDocument {
            filename: estimate.filename(),
            bytes: Bytes::from(bytes),
        };
        info!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            size_bytes = document.bytes.len(),
            filename = %document.filename,
            "PDF generated"
        );

        pdf_response(document)
    }
    .instrument(info_span!("generate_pdf", %request_id))
    .await
}

/// Wraps the document in a download response.
pub fn pdf_response(document: GeneratedDocument) -> Result<Response, AppError> {
    let length = document.bytes.len();
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/pdf")
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", document.filename),
        )
        .header(header::CONTENT_LENGTH, length)
        .body(Body::from(document.bytes))
        .map_err(|e| AppError::Internal(anyhow::anyhow!("failed to build PDF response: {e}")))
}

/// OPTIONS /generate-pdf
///
/// Answers plain OPTIONS requests. Browser pre-flights are handled by the CORS
/// layer before they reach this handler.
pub async fn handle_preflight() -> impl IntoResponse {
    (
        StatusCode::OK,
        [
            (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
            (header::ACCESS_CONTROL_ALLOW_METHODS, "POST, OPTIONS"),
            (header::ACCESS_CONTROL_ALLOW_HEADERS, "Content-Type"),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pdf_response_headers() {
        let response = pdf_response(GeneratedDocument {
            filename: "estimate-00031.pdf".to_string(),
            bytes: Bytes::from_static(b"%PDF-1.4 fake"),
        })
        .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let headers = response.headers();
        assert_eq!(headers[header::CONTENT_TYPE], "application/pdf");
        assert_eq!(
            headers[header::CONTENT_DISPOSITION],
            "attachment; filename=\"estimate-00031.pdf\""
        );
        assert_eq!(headers[header::CONTENT_LENGTH], "13");
    }

    #[tokio::test]
    async fn test_preflight_is_empty_with_cors_headers() {
        let response = handle_preflight().await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_METHODS],
            "POST, OPTIONS"
        );
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert!(body.is_empty());
    }
}
