use std::sync::Arc;

use crate::config::Config;
use crate::markdown::MarkdownRenderer;
use crate::pdf::PdfGenerator;

/// Shared application state injected into all route handlers via Axum extractors.
/// Holds no per-request data; every request is handled independently.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Pluggable PDF backend. Default: EstimatePdfGenerator.
    pub pdf: Arc<dyn PdfGenerator>,
    pub markdown: MarkdownRenderer,
}
