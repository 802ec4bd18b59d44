//! Envelope normalization: arbitrary upstream JSON in, canonical record out.
//!
//! Upstream services wrap their payloads in inconsistent envelopes
//! (`{success, data}` vs `{Success, Data}`) and mix key casings inside the
//! payload. [`normalize`] collapses all of that into a [`NormalizedRecord`]
//! with lowerCamel keys, numeric strings coerced to numbers, and declared
//! failures routed into an ordered, deduplicated error list.

use serde_json::{Map, Number, Value};
use tracing::debug;

use super::aliases::{self, camel_variant, is_meta_field, resolve};
use super::errors::EnvelopeError;

static EMPTY_LIST: &[Value] = &[];

/// Canonical, casing-independent representation of an envelope payload.
///
/// Field keys are lowerCamel, numeric strings have been coerced, and null
/// values are omitted (typed accessors supply the defaults). The record
/// never contains a nested envelope wrapper; unwrapping is total and
/// idempotent.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NormalizedRecord {
    fields: Map<String, Value>,
    errors: Vec<String>,
}

impl NormalizedRecord {
    /// The empty record, used when the envelope carried nothing usable.
    pub fn empty() -> Self {
        Self::default()
    }

    fn with_errors(errors: Vec<String>) -> Self {
        Self {
            fields: Map::new(),
            errors,
        }
    }

    fn from_fields(fields: Map<String, Value>) -> Self {
        Self {
            fields,
            errors: Vec::new(),
        }
    }

    /// Look up a field by logical name, accepting either casing convention.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(&camel_variant(key))
    }

    /// Numeric field access with `Number(x) || 0` semantics: absent,
    /// non-numeric, and non-finite values all collapse to 0.
    pub fn number(&self, key: &str) -> f64 {
        self.get(key).map(lossy_f64).unwrap_or(0.0)
    }

    /// Text field access; numbers are stringified, everything else is "".
    pub fn text(&self, key: &str) -> String {
        match self.get(key) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            Some(Value::Bool(b)) => b.to_string(),
            _ => String::new(),
        }
    }

    /// List field access; absent or non-list values yield the empty slice,
    /// so the result is always iterable.
    pub fn list(&self, key: &str) -> &[Value] {
        match self.get(key) {
            Some(Value::Array(items)) => items.as_slice(),
            _ => EMPTY_LIST,
        }
    }

    /// Nested mapping access.
    pub fn map(&self, key: &str) -> Option<&Map<String, Value>> {
        self.get(key).and_then(Value::as_object)
    }

    /// Error strings declared by the envelope (or synthesized during
    /// recovery from a malformed payload).
    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    /// True when the envelope declared failure or recovery synthesized an
    /// error.
    pub fn has_declared_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.errors.is_empty()
    }

    /// All canonical fields, for callers that iterate the payload.
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Re-encode the payload as a JSON value (error side-channel excluded).
    pub fn to_value(&self) -> Value {
        Value::Object(self.fields.clone())
    }
}

/// Normalize any JSON-like value into a [`NormalizedRecord`].
///
/// Total and pure: never panics, never errors. A payload that cannot be
/// normalized meaningfully recovers as the empty record carrying one
/// synthetic error string.
pub fn normalize(raw: &Value) -> NormalizedRecord {
    match try_normalize(raw) {
        Ok(record) => record,
        Err(err) => {
            debug!("envelope recovery: {}", err);
            NormalizedRecord::with_errors(vec![format!("malformed envelope: {}", err)])
        }
    }
}

/// Two-stage variant of [`normalize`] exposing the malformed case as a
/// tagged result instead of a recovered record.
pub fn try_normalize(raw: &Value) -> Result<NormalizedRecord, EnvelopeError> {
    let envelope = match raw {
        Value::Null => return Ok(NormalizedRecord::empty()),
        Value::Array(_) => return Err(EnvelopeError::ArrayEnvelope),
        Value::Bool(_) => return Err(EnvelopeError::NotAnObject("boolean")),
        Value::Number(_) => return Err(EnvelopeError::NotAnObject("number")),
        Value::String(_) => return Err(EnvelopeError::NotAnObject("string")),
        Value::Object(map) => map,
    };

    if declares_failure(envelope) {
        return Ok(NormalizedRecord::with_errors(extract_errors(envelope)));
    }

    // Unwrap exactly one declared data/Data level; application payload
    // fields self-describe their own shape and are not recursed into.
    let fields = match resolve(envelope, "data") {
        Some(Value::Object(inner)) => canonicalize(inner),
        Some(Value::Array(items)) => {
            let mut fields = Map::new();
            fields.insert("items".to_string(), Value::Array(items.clone()));
            fields
        }
        Some(value) if !value.is_null() => {
            let mut fields = Map::new();
            fields.insert("value".to_string(), coerce(value));
            fields
        }
        _ => canonicalize(envelope),
    };

    Ok(NormalizedRecord::from_fields(fields))
}

/// True when the envelope explicitly declares failure; absence of a
/// success marker is not failure.
fn declares_failure(envelope: &Map<String, Value>) -> bool {
    matches!(resolve(envelope, "success"), Some(Value::Bool(false)))
}

/// Collect error strings from `errors`/`Errors`/`message`/`Message`, in
/// that preference order, deduplicated and order-preserving.
fn extract_errors(envelope: &Map<String, Value>) -> Vec<String> {
    let mut collected = Vec::new();
    for key in ["errors", "message"] {
        match resolve(envelope, key) {
            Some(Value::Array(items)) => {
                for item in items {
                    push_error(&mut collected, item);
                }
            }
            Some(value) if !value.is_null() => push_error(&mut collected, value),
            _ => {}
        }
    }
    if collected.is_empty() {
        collected.push("upstream declared failure without detail".to_string());
    }
    collected
}

fn push_error(collected: &mut Vec<String>, value: &Value) {
    let text = match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    if !text.is_empty() && !collected.contains(&text) {
        collected.push(text);
    }
}

/// Collapse key casing to lowerCamel and coerce values. Meta fields are
/// stripped so the output can never be mistaken for an envelope again.
fn canonicalize(payload: &Map<String, Value>) -> Map<String, Value> {
    let mut fields = Map::new();
    for key in payload.keys() {
        if is_meta_field(key) {
            continue;
        }
        let canonical = camel_variant(key);
        if fields.contains_key(&canonical) {
            continue;
        }
        match aliases::resolve(payload, &canonical) {
            Some(value) if !value.is_null() => {
                fields.insert(canonical, coerce(value));
            }
            _ => {}
        }
    }
    fields
}

/// Shallow value coercion: numeric strings become numbers; containers are
/// passed through untouched (payload fields self-describe their shape).
fn coerce(value: &Value) -> Value {
    if let Value::String(s) = value {
        let trimmed = s.trim();
        if !trimmed.is_empty() {
            if let Ok(parsed) = trimmed.parse::<f64>() {
                if parsed.is_finite() {
                    if let Some(number) = Number::from_f64(parsed) {
                        return Value::Number(number);
                    }
                }
            }
        }
    }
    value.clone()
}

/// `Number(x) || 0` semantics for a single JSON value.
pub(crate) fn lossy_f64(value: &Value) -> f64 {
    let parsed = match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().parse::<f64>().unwrap_or(0.0),
        Value::Bool(b) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        _ => 0.0,
    };
    if parsed.is_finite() {
        parsed
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_casing_equivalence() {
        let camel = json!({"success": true, "data": {"totalStudents": 42, "pendingInvoices": 3}});
        let pascal = json!({"Success": true, "Data": {"TotalStudents": 42, "PendingInvoices": 3}});
        assert_eq!(normalize(&camel), normalize(&pascal));
    }

    #[test]
    fn test_totality_over_junk_inputs() {
        assert!(normalize(&Value::Null).is_empty());

        let array = normalize(&json!([1, 2, 3]));
        assert!(array.fields().is_empty());
        assert!(array.has_declared_errors());

        let scalar = normalize(&json!(17));
        assert!(scalar.fields().is_empty());
        assert!(scalar.has_declared_errors());

        let text = normalize(&json!("not an envelope"));
        assert!(text.fields().is_empty());
    }

    #[test]
    fn test_try_normalize_tags_malformed_shapes() {
        assert_eq!(
            try_normalize(&json!([])).unwrap_err(),
            EnvelopeError::ArrayEnvelope
        );
        assert_eq!(
            try_normalize(&json!(true)).unwrap_err(),
            EnvelopeError::NotAnObject("boolean")
        );
    }

    #[test]
    fn test_idempotence() {
        let raw = json!({"success": true, "data": {"Total": "41", "label": "enrolled"}});
        let once = normalize(&raw);
        let twice = normalize(&once.to_value());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_unwraps_one_data_level_only() {
        let raw = json!({"data": {"report": {"data": {"nested": 1}}}});
        let record = normalize(&raw);
        // The inner object is application payload, left as-is.
        assert_eq!(
            record.map("report").unwrap().get("data"),
            Some(&json!({"nested": 1}))
        );
    }

    #[test]
    fn test_payload_without_wrapper() {
        let raw = json!({"success": true, "TotalStudents": 42});
        let record = normalize(&raw);
        assert_eq!(record.number("totalStudents"), 42.0);
        assert!(record.get("success").is_none());
    }

    #[test]
    fn test_declared_failure_collects_errors_in_preference_order() {
        let raw = json!({
            "Success": false,
            "Errors": ["DB timeout", "DB timeout", "replica lag"],
            "Message": "DB timeout"
        });
        let record = normalize(&raw);
        assert!(record.fields().is_empty());
        assert_eq!(record.errors(), &["DB timeout", "replica lag"]);
    }

    #[test]
    fn test_declared_failure_message_fallback() {
        let record = normalize(&json!({"success": false, "message": "service offline"}));
        assert_eq!(record.errors(), &["service offline"]);

        let bare = normalize(&json!({"success": false}));
        assert_eq!(bare.errors().len(), 1);
    }

    #[test]
    fn test_numeric_string_coercion() {
        let record = normalize(&json!({"data": {"revenue": "1250.5", "label": "March"}}));
        assert_eq!(record.number("revenue"), 1250.5);
        assert_eq!(record.text("label"), "March");
    }

    #[test]
    fn test_null_fields_become_typed_defaults_at_access() {
        let record = normalize(&json!({"data": {"total": null, "items": null}}));
        assert_eq!(record.number("total"), 0.0);
        assert!(record.list("items").is_empty());
        assert!(record.map("missing").is_none());
    }

    #[test]
    fn test_casing_collision_prefers_lower_camel() {
        let record = normalize(&json!({"data": {"total": 5, "Total": 9}}));
        assert_eq!(record.number("total"), 5.0);

        let null_camel = normalize(&json!({"data": {"total": null, "Total": 9}}));
        assert_eq!(null_camel.number("total"), 9.0);
    }

    #[test]
    fn test_data_array_and_scalar_wrappers() {
        let listy = normalize(&json!({"data": [1, 2]}));
        assert_eq!(listy.list("items"), &[json!(1), json!(2)]);

        let scalar = normalize(&json!({"data": "99"}));
        assert_eq!(scalar.number("value"), 99.0);
    }

    #[test]
    fn test_lossy_f64() {
        assert_eq!(lossy_f64(&json!("12.5")), 12.5);
        assert_eq!(lossy_f64(&json!("garbage")), 0.0);
        assert_eq!(lossy_f64(&json!(null)), 0.0);
        assert_eq!(lossy_f64(&json!(true)), 1.0);
        assert_eq!(lossy_f64(&json!([1])), 0.0);
    }
}
