//! Conversion between plain JSON and Firestore typed values.

use crate::types::Document;
use crate::{DocumentError, DocumentResult};
use serde_json::{json, Map, Value};

/// Encode a JSON value as a Firestore `Value`.
pub fn encode_value(value: &Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        Value::Number(n) => match n.as_i64() {
            Some(i) => json!({ "integerValue": i.to_string() }),
            None => json!({ "doubleValue": n.as_f64().unwrap_or(0.0) }),
        },
        Value::String(s) => json!({ "stringValue": s }),
        Value::Array(items) => {
            let values: Vec<Value> = items.iter().map(encode_value).collect();
            json!({ "arrayValue": { "values": values } })
        }
        Value::Object(map) => json!({ "mapValue": { "fields": encode_fields(map) } }),
    }
}

/// Encode the top-level fields of a document body.
pub fn encode_fields(fields: &Map<String, Value>) -> Map<String, Value> {
    fields
        .iter()
        .map(|(key, value)| (key.clone(), encode_value(value)))
        .collect()
}

/// Decode a Firestore `Value` into plain JSON.
///
/// Timestamps, references and bytes come back as strings, geo points as
/// `{latitude, longitude}` objects.
pub fn decode_value(value: &Value) -> DocumentResult<Value> {
    let Some(typed) = value.as_object() else {
        return Err(DocumentError::InvalidData(format!(
            "expected typed value, got {value}"
        )));
    };
    let Some((kind, inner)) = typed.iter().next() else {
        return Err(DocumentError::InvalidData("empty typed value".to_string()));
    };

    let decoded = match kind.as_str() {
        "nullValue" => Value::Null,
        "booleanValue" => Value::Bool(inner.as_bool().unwrap_or(false)),
        "integerValue" => {
            let parsed = match inner {
                Value::String(s) => s.parse::<i64>().ok(),
                Value::Number(n) => n.as_i64(),
                _ => None,
            };
            let parsed = parsed.ok_or_else(|| {
                DocumentError::InvalidData(format!("bad integerValue: {inner}"))
            })?;
            Value::from(parsed)
        }
        "doubleValue" => match inner {
            Value::Number(_) => inner.clone(),
            Value::String(s) => s
                .parse::<f64>()
                .ok()
                .map(Value::from)
                .unwrap_or(Value::Null),
            _ => Value::Null,
        },
        "stringValue" | "timestampValue" | "referenceValue" | "bytesValue" => inner.clone(),
        "geoPointValue" => inner.clone(),
        "arrayValue" => {
            let values = inner
                .get("values")
                .and_then(Value::as_array)
                .map(|items| items.iter().map(decode_value).collect::<DocumentResult<Vec<_>>>())
                .transpose()?
                .unwrap_or_default();
            Value::Array(values)
        }
        "mapValue" => {
            let fields = inner.get("fields").and_then(Value::as_object);
            Value::Object(match fields {
                Some(fields) => decode_fields(fields)?,
                None => Map::new(),
            })
        }
        other => {
            return Err(DocumentError::InvalidData(format!(
                "unsupported value type `{other}`"
            )))
        }
    };
    Ok(decoded)
}

/// Decode a map of typed fields.
pub fn decode_fields(fields: &Map<String, Value>) -> DocumentResult<Map<String, Value>> {
    fields
        .iter()
        .map(|(key, value)| Ok((key.clone(), decode_value(value)?)))
        .collect()
}

/// Decode a REST `Document` resource.
///
/// The id is the last segment of the resource `name`.
pub fn decode_document(resource: &Value) -> DocumentResult<Document> {
    let name = resource
        .get("name")
        .and_then(Value::as_str)
        .ok_or_else(|| DocumentError::InvalidData("document without name".to_string()))?;
    let raw_id = name.rsplit('/').next().unwrap_or(name);
    let id = urlencoding::decode(raw_id)
        .map(|id| id.into_owned())
        .unwrap_or_else(|_| raw_id.to_string());

    let data = match resource.get("fields").and_then(Value::as_object) {
        Some(fields) => decode_fields(fields)?,
        None => Map::new(),
    };
    Ok(Document::new(id, Value::Object(data)))
}
