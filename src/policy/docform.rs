//! Helpers for the tagged document form shared by conditions and actions.
//!
//! Every condition/action serializes to a JSON object carrying its fields
//! plus a `type` tag, and parses back from the same shape with unknown
//! attributes rejected.

use crate::core::ValidationErrors;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

pub const TYPE_FIELD: &str = "type";

/// Serialize `value` and attach the `type` tag. Unit variants (no fields)
/// serialize to `null` and become a bare `{"type": ...}` object.
pub fn tagged_doc<T: Serialize>(tag: &str, value: &T) -> Value {
    let mut doc = serde_json::to_value(value).expect("document serialization cannot fail");
    if !doc.is_object() {
        doc = Value::Object(serde_json::Map::new());
    }
    doc.as_object_mut()
        .expect("doc is an object")
        .insert(TYPE_FIELD.to_string(), Value::String(tag.to_string()));
    doc
}

/// Parse the non-tag fields of a condition/action document. The `type` key
/// is stripped first; everything else must match the target struct exactly.
pub fn parse_fields<T: DeserializeOwned>(
    tag: &str,
    doc: &Value,
) -> std::result::Result<T, ValidationErrors> {
    let mut doc = doc.clone();
    if let Some(map) = doc.as_object_mut() {
        map.remove(TYPE_FIELD);
    }
    serde_json::from_value(doc).map_err(|e| {
        let mut errors = ValidationErrors::new();
        errors.add(tag, e.to_string());
        errors
    })
}
