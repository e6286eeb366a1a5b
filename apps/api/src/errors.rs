use axum::{
    extract::multipart::{MultipartError, MultipartRejection},
    extract::rejection::{BytesRejection, FormRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

use crate::pdf::GenerationError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
///
/// Every variant renders as `{ "error": string, "details"?: string }`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    /// The body could not be read or decoded. Carries the status the axum
    /// rejection chose (400, 413, ...).
    #[error("Invalid request body: {message}")]
    Payload { status: StatusCode, message: String },

    #[error("Unsupported content type: {0}")]
    UnsupportedMediaType(String),

    #[error("PDF generation failed: {0}")]
    Generation(#[from] GenerationError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Payload { status, .. } => *status,
            AppError::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            AppError::Generation(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn body(&self) -> Value {
        match self {
            AppError::Validation(msg) => json!({ "error": msg }),
            AppError::Payload { message, .. } => json!({
                "error": "Invalid request body",
                "details": message
            }),
            AppError::UnsupportedMediaType(content_type) => json!({
                "error": "Unsupported content type: expected application/json or multipart/form-data",
                "details": content_type
            }),
            AppError::Generation(e) => {
                tracing::error!("PDF generation error: {e}");
                json!({
                    "error": "Failed to generate PDF",
                    "details": e.to_string()
                })
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                json!({ "error": "An internal server error occurred" })
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.status(), Json(self.body())).into_response()
    }
}

impl From<BytesRejection> for AppError {
    fn from(rejection: BytesRejection) -> Self {
        AppError::Payload {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl From<MultipartRejection> for AppError {
    fn from(rejection: MultipartRejection) -> Self {
        AppError::Payload {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

/// Field-level failures while streaming a multipart body. Carries 413 when
/// the body limit was hit mid-stream.
impl From<MultipartError> for AppError {
    fn from(e: MultipartError) -> Self {
        AppError::Payload {
            status: e.status(),
            message: e.body_text(),
        }
    }
}

impl From<FormRejection> for AppError {
    fn from(rejection: FormRejection) -> Self {
        AppError::Payload {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}
