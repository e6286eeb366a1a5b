//! PDF generation delegate.
//!
//! Handlers only see the `PdfGenerator` trait: a validated estimate goes in,
//! a complete PDF buffer (or an error) comes out. No retries, no partial
//! output. `AppState` holds an `Arc<dyn PdfGenerator>`; the default backend
//! is `EstimatePdfGenerator`.
//!
//! CPU-bound rendering runs inside `tokio::task::spawn_blocking`.

pub mod canvas;
pub mod font_metrics;
pub mod layout;
pub mod writer;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::config::IssuerConfig;
use crate::models::estimate::EstimateRequest;
use crate::pdf::layout::layout_estimate;
use crate::pdf::writer::{write_document, DocumentInfo};

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("document needs {pages} pages, limit is {limit}")]
    TooManyPages { pages: usize, limit: usize },

    #[error("pdf serialization failed: {0}")]
    Serialize(String),

    #[error("render task failed: {0}")]
    Task(String),
}

impl From<lopdf::Error> for GenerationError {
    fn from(e: lopdf::Error) -> Self {
        GenerationError::Serialize(e.to_string())
    }
}

/// The generation contract the endpoint depends on.
#[async_trait]
pub trait PdfGenerator: Send + Sync {
    async fn generate(&self, estimate: &EstimateRequest) -> Result<Vec<u8>, GenerationError>;
}

/// Built-in backend: lays the estimate out on US-letter pages with the
/// base-14 Helvetica faces.
pub struct EstimatePdfGenerator {
    issuer: IssuerConfig,
    max_pages: usize,
}

impl EstimatePdfGenerator {
    pub fn new(issuer: IssuerConfig, max_pages: usize) -> Self {
        Self { issuer, max_pages }
    }
}

#[async_trait]
impl PdfGenerator for EstimatePdfGenerator {
    async fn generate(&self, estimate: &EstimateRequest) -> Result<Vec<u8>, GenerationError> {
        let estimate = estimate.clone();
        let issuer = self.issuer.clone();
        let max_pages = self.max_pages;
        let created_at = Utc::now();

        tokio::task::spawn_blocking(move || render_pdf(&estimate, &issuer, max_pages, created_at))
            .await
            .map_err(|e| GenerationError::Task(e.to_string()))?
    }
}

/// Synchronous render: layout, then serialization.
pub fn render_pdf(
    estimate: &EstimateRequest,
    issuer: &IssuerConfig,
    max_pages: usize,
    created_at: DateTime<Utc>,
) -> Result<Vec<u8>, GenerationError> {
    let pages = layout_estimate(estimate, issuer, created_at.date_naive(), max_pages)?;
    let info = DocumentInfo {
        title: format!("Estimate {}", estimate.estimate_number.trim()),
        producer: format!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
        created_at,
    };
    write_document(&pages, &info)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::estimate::LineItem;

    fn sample_estimate() -> EstimateRequest {
        EstimateRequest {
            to: "Jane Smith\nABC Corporation\n789 Corporate Blvd".to_string(),
            email: None,
            items: vec![
                LineItem {
                    description: "Consultation services".to_string(),
                    units: 10.0,
                    cost: 540.0,
                    amount: 5400.0,
                },
                LineItem {
                    description: "Installation work".to_string(),
                    units: 5.0,
                    cost: 200.0,
                    amount: 1000.0,
                },
            ],
            estimate_number: "00031".to_string(),
        }
    }

    #[tokio::test]
    async fn test_generator_produces_pdf() {
        let generator = EstimatePdfGenerator::new(IssuerConfig::default(), 50);
        let bytes = generator.generate(&sample_estimate()).await.unwrap();
        assert!(bytes.starts_with(b"%PDF-"));
        assert!(bytes.len() > 500);
    }

    #[tokio::test]
    async fn test_generator_surfaces_page_limit() {
        let mut estimate = sample_estimate();
        estimate.items = estimate.items.iter().cycle().take(300).cloned().collect();
        let generator = EstimatePdfGenerator::new(IssuerConfig::default(), 1);
        let err = generator.generate(&estimate).await.unwrap_err();
        assert!(matches!(err, GenerationError::TooManyPages { .. }));
    }

    #[test]
    fn test_rendered_pdf_is_readable() {
        let bytes = render_pdf(&sample_estimate(), &IssuerConfig::default(), 50, Utc::now()).unwrap();
        let text = pdf_extract::extract_text_from_mem(&bytes).unwrap();
        assert!(text.contains("ESTIMATE"), "extracted text: {text}");
        assert!(text.contains("Consultation"), "extracted text: {text}");
        assert!(text.contains("Jane Smith"), "extracted text: {text}");
    }
}
