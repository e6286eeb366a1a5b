//! Request normalizer: JSON, multipart and URL-encoded submissions all
//! become one `EstimateDraft`.

use axum::{
    body::Bytes,
    extract::{FromRequest, Multipart, Request},
    http::header::CONTENT_TYPE,
    Form,
};
use serde::Deserialize;
use tracing::debug;

use crate::errors::AppError;
use crate::estimate::items::{collect_item_fields, parse_items};
use crate::models::estimate::{EstimateDraft, LineItem};

/// Body shape of the JSON variant. Items are typed directly; a body that does
/// not match is rejected as a whole.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JsonEstimateBody {
    estimate_number: Option<String>,
    #[serde(default)]
    items: Vec<LineItem>,
    to: Option<String>,
    email: Option<String>,
}

impl From<JsonEstimateBody> for EstimateDraft {
    fn from(body: JsonEstimateBody) -> Self {
        EstimateDraft {
            to: body.to,
            email: body.email,
            items: body.items,
            estimate_number: body.estimate_number,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PayloadKind {
    Json,
    Multipart,
    UrlEncoded,
}

fn payload_kind(content_type: &str) -> Option<PayloadKind> {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    match essence.as_str() {
        "application/json" => Some(PayloadKind::Json),
        "multipart/form-data" => Some(PayloadKind::Multipart),
        "application/x-www-form-urlencoded" => Some(PayloadKind::UrlEncoded),
        other if other.starts_with("application/") && other.ends_with("+json") => {
            Some(PayloadKind::Json)
        }
        _ => None,
    }
}

/// Reads the request body according to its `Content-Type`.
pub async fn read_estimate_draft(request: Request) -> Result<EstimateDraft, AppError> {
    let content_type = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string();

    match payload_kind(&content_type) {
        Some(PayloadKind::Json) => {
            let body = Bytes::from_request(request, &()).await?;
            let parsed: JsonEstimateBody = serde_json::from_slice(&body).map_err(|e| {
                AppError::Payload {
                    status: axum::http::StatusCode::BAD_REQUEST,
                    message: format!("Malformed JSON body: {e}"),
                }
            })?;
            debug!("JSON body parsed: {} items", parsed.items.len());
            Ok(parsed.into())
        }
        Some(PayloadKind::Multipart) => {
            let mut multipart = Multipart::from_request(request, &()).await?;
            let mut fields = Vec::new();
            while let Some(field) = multipart.next_field().await? {
                let Some(name) = field.name().map(str::to_string) else {
                    continue;
                };
                let value = field.text().await?;
                fields.push((name, value));
            }
            Ok(draft_from_fields(&fields))
        }
        Some(PayloadKind::UrlEncoded) => {
            let Form(fields) = Form::<Vec<(String, String)>>::from_request(request, &()).await?;
            Ok(draft_from_fields(&fields))
        }
        None => Err(AppError::UnsupportedMediaType(if content_type.is_empty() {
            "missing Content-Type header".to_string()
        } else {
            content_type
        })),
    }
}

/// Builds a draft from flat form fields (`to`, `email`, `estimateNumber`,
/// `items[]` / `items`). Only the first occurrence of a scalar field counts.
pub fn draft_from_fields(fields: &[(String, String)]) -> EstimateDraft {
    let first = |name: &str| {
        fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value.clone())
    };

    let raw_items = collect_item_fields(fields);
    let items = parse_items(&raw_items);

    debug!(
        to = first("to").is_some(),
        email = first("email").is_some(),
        raw_items = raw_items.len(),
        parsed_items = items.len(),
        "Form fields extracted"
    );

    EstimateDraft {
        to: first("to"),
        email: first("email"),
        items,
        estimate_number: first("estimateNumber"),
    }
}
