use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::state::AppState;

/// GET /health
/// Liveness check. Echoes the limits the PDF endpoint is running with.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "pdf": {
            "maxPages": state.config.pdf_max_pages,
            "maxBodyBytes": state.config.max_body_bytes
        }
    }))
}
