use bytes::Bytes;
use serde::{Deserialize, Deserializer, Serialize};

use crate::errors::AppError;

/// Estimate number used when the submission does not carry one.
pub const DEFAULT_ESTIMATE_NUMBER: &str = "00001";

pub const MISSING_FIELDS_MESSAGE: &str = "Missing required fields: to and items are required";

/// One row of an estimate. `amount` is printed as given and never
/// reconciled against `units * cost`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    #[serde(default)]
    pub description: String,
    #[serde(default, deserialize_with = "lenient_number")]
    pub units: f64,
    #[serde(default, deserialize_with = "lenient_number")]
    pub cost: f64,
    #[serde(default, deserialize_with = "lenient_number")]
    pub amount: f64,
}

/// Accepts `12`, `12.5` and `"12.5"`. Form encoders often stringify numbers.
fn lenient_number<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrString {
        Number(f64),
        Text(String),
    }

    let value = match NumberOrString::deserialize(deserializer)? {
        NumberOrString::Number(n) => n,
        NumberOrString::Text(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                0.0
            } else {
                trimmed
                    .parse::<f64>()
                    .map_err(|_| serde::de::Error::custom(format!("'{s}' is not a number")))?
            }
        }
    };

    if value.is_finite() {
        Ok(value)
    } else {
        Err(serde::de::Error::custom("numbers must be finite"))
    }
}

/// What a payload parser extracts before any validation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EstimateDraft {
    pub to: Option<String>,
    pub email: Option<String>,
    pub items: Vec<LineItem>,
    pub estimate_number: Option<String>,
}

impl EstimateDraft {
    /// Enforces "recipient and at least one item" and fills defaults.
    pub fn validate(self) -> Result<EstimateRequest, AppError> {
        let to = non_blank(self.to);
        let (Some(to), false) = (to, self.items.is_empty()) else {
            return Err(AppError::Validation(MISSING_FIELDS_MESSAGE.to_string()));
        };

        Ok(EstimateRequest {
            to,
            email: non_blank(self.email),
            items: self.items,
            estimate_number: non_blank(self.estimate_number)
                .unwrap_or_else(|| DEFAULT_ESTIMATE_NUMBER.to_string()),
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// A validated estimate: the recipient is present and there is at least one item.
/// Lives for a single request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EstimateRequest {
    /// Free-form recipient block; may span several lines.
    pub to: String,
    pub email: Option<String>,
    pub items: Vec<LineItem>,
    pub estimate_number: String,
}

impl EstimateRequest {
    /// Sum of the item amounts as submitted.
    pub fn total(&self) -> f64 {
        self.items.iter().map(|item| item.amount).sum()
    }

    /// `estimate-<number>.pdf`, with the number reduced to characters that
    /// are safe inside a quoted `Content-Disposition` filename.
    pub fn filename(&self) -> String {
        let number: String = self
            .estimate_number
            .trim()
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        format!("estimate-{number}.pdf")
    }

    pub fn recipient_lines(&self) -> impl Iterator<Item = &str> {
        self.to.lines().map(str::trim).filter(|line| !line.is_empty())
    }
}

/// The rendered PDF, produced once per request and returned immediately.
#[derive(Debug, Clone)]
pub struct GeneratedDocument {
    pub filename: String,
    pub bytes: Bytes,
}
