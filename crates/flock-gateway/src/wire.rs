//! Mapping between typed records and the hypermedia wire JSON.
//!
//! Payloads on the wire are JSON-LD-ish objects: an `"@type"` tag on
//! every entity, `"@id"` resource paths with a numeric suffix, and
//! `"@context"` noise we never read. All of that stays in this module;
//! the rest of the workspace only sees the typed models.

use serde::Serialize;
use serde_json::Value;

/// Serialize `value` and tag it with `"@type": type_name`.
pub fn tagged<T: Serialize>(value: &T, type_name: &str) -> Result<Value, serde_json::Error> {
    let mut body = serde_json::to_value(value)?;
    if let Value::Object(map) = &mut body {
        map.insert("@type".to_string(), Value::String(type_name.to_string()));
    }
    Ok(body)
}

/// Numeric suffix of a hypermedia id such as `/api/CommandCollection/12`.
///
/// Returns `None` for malformed ids; callers skip those rather than
/// failing the batch.
pub fn id_suffix(id: &str) -> Option<i64> {
    id.trim_end_matches('/')
        .rsplit('/')
        .next()
        .and_then(|tail| tail.parse().ok())
}
