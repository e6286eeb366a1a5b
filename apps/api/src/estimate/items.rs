//! Lenient line-item parsing for form submissions.
//!
//! Form clients send items in several shapes: a repeated `items[]` field with
//! one JSON object each, a single `items` field holding a JSON array, or a
//! single field holding comma-joined objects (`{..},{..}`) that is not valid
//! JSON on its own. Entries that cannot be parsed are dropped, never fatal.

use serde_json::Value;
use tracing::debug;

use crate::models::estimate::LineItem;

/// Picks the raw item strings out of the submitted form fields: every
/// `items[]` value, or failing that every `items` value.
pub fn collect_item_fields(fields: &[(String, String)]) -> Vec<String> {
    let repeated: Vec<String> = values_named(fields, "items[]");
    if !repeated.is_empty() {
        return repeated;
    }
    values_named(fields, "items")
}

fn values_named(fields: &[(String, String)], name: &str) -> Vec<String> {
    fields
        .iter()
        .filter(|(field, _)| field == name)
        .map(|(_, value)| value.clone())
        .collect()
}

/// Turns raw item strings into line items.
///
/// Strategies, first success wins:
/// 1. a single value that looks like an array is parsed as a JSON array;
/// 2. a single value is wrapped in `[` `]` and parsed as a JSON array;
/// 3. every value is parsed on its own, unparsable values are dropped.
pub fn parse_items(raw: &[String]) -> Vec<LineItem> {
    if let [single] = raw {
        let trimmed = single.trim();

        if trimmed.starts_with('[') {
            match serde_json::from_str::<Vec<Value>>(trimmed) {
                Ok(values) => {
                    let items = items_from_values(values);
                    debug!("Parsed items array directly: {} items", items.len());
                    return items;
                }
                Err(e) => debug!("Items field is not a JSON array: {e}"),
            }
        }

        match serde_json::from_str::<Vec<Value>>(&format!("[{trimmed}]")) {
            Ok(values) => {
                let items = items_from_values(values);
                debug!("Parsed comma-joined items as array: {} items", items.len());
                return items;
            }
            Err(e) => debug!("Items field is not comma-joined JSON: {e}"),
        }
    }

    raw.iter()
        .enumerate()
        .flat_map(|(index, value)| match serde_json::from_str::<Value>(value.trim()) {
            Ok(Value::Array(values)) => items_from_values(values),
            Ok(value) => items_from_values(vec![value]),
            Err(e) => {
                debug!("Item {} dropped, not valid JSON: {e}", index + 1);
                Vec::new()
            }
        })
        .collect()
}

/// Keeps the values that are line-item objects.
fn items_from_values(values: Vec<Value>) -> Vec<LineItem> {
    values
        .into_iter()
        .filter(Value::is_object)
        .filter_map(|value| match serde_json::from_value::<LineItem>(value) {
            Ok(item) => Some(item),
            Err(e) => {
                debug!("Item dropped, not a line item: {e}");
                None
            }
        })
        .collect()
}
