//! Declarative dual-casing field lookup.
//!
//! Upstream services disagree on key casing (`success` vs `Success`,
//! `data` vs `Data`). Every lookup in the crate goes through [`resolve`]
//! so resolution semantics are identical everywhere instead of ad hoc
//! `a.x || a.X` chains per call site.

use serde_json::{Map, Value};

/// Envelope meta fields, in canonical (lowerCamel) form. These are
/// stripped from the payload during normalization; everything else is
/// application data.
pub const META_FIELDS: [&str; 4] = ["success", "data", "errors", "message"];

/// Lowercase the first character, yielding the canonical lowerCamel key.
pub fn camel_variant(key: &str) -> String {
    let mut chars = key.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// Uppercase the first character, yielding the PascalCase variant.
pub fn pascal_variant(key: &str) -> String {
    let mut chars = key.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// Resolve a logical field against an object honoring both casing
/// conventions.
///
/// The lowerCamel form wins unless it is null and only the PascalCase
/// form is non-null. Returns `None` when neither variant is present.
pub fn resolve<'a>(map: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    let camel = camel_variant(key);
    let pascal = pascal_variant(key);

    let camel_value = map.get(&camel);
    let pascal_value = map.get(&pascal);

    match (camel_value, pascal_value) {
        (Some(c), _) if !c.is_null() => Some(c),
        (_, Some(p)) if !p.is_null() => Some(p),
        (Some(c), _) => Some(c),
        (None, Some(p)) => Some(p),
        (None, None) => None,
    }
}

/// Resolve the first present field from a preference-ordered list.
pub fn resolve_first<'a>(map: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|key| resolve(map, key))
}

/// True when the key (in either casing) is an envelope meta field.
pub fn is_meta_field(key: &str) -> bool {
    let canonical = camel_variant(key);
    META_FIELDS.iter().any(|meta| *meta == canonical)
}
