//! Removal of high-volume, low-signal substructure from fetched resources.
//!
//! The walk is recursive over both objects and arrays, so the exclusions apply at every
//! depth (bundle entries, nested backbone elements, coded concepts). Scalars are never
//! modified and unknown keys pass through unchanged.

use serde_json::{Map, Value};

/// Keys removed wherever they appear, regardless of value.
pub const EXCLUDED_KEYS: &[&str] = &["meta", "contained", "extension", "modifierExtension"];

/// Key of a resource narrative block.
///
/// Only removed when its value is an object: a `Narrative` (`{ status, div }`) is
/// free-text XHTML, whereas `CodeableConcept.text` is a plain string and is the preferred
/// label for conditions and medications.
pub const NARRATIVE_KEY: &str = "text";

/// Returns a sanitised copy of `value`.
pub fn sanitize(value: &Value) -> Value {
    let mut out = value.clone();
    sanitize_in_place(&mut out);
    out
}

/// Sanitises `value` in place.
pub fn sanitize_in_place(value: &mut Value) {
    match value {
        Value::Object(map) => sanitize_map(map),
        Value::Array(items) => items.iter_mut().for_each(sanitize_in_place),
        _ => {}
    }
}

fn sanitize_map(map: &mut Map<String, Value>) {
    map.retain(|key, value| !is_excluded(key, value));
    for child in map.values_mut() {
        sanitize_in_place(child);
    }
}

/// True when `key` (holding `value`) belongs to the exclusion set.
pub fn is_excluded(key: &str, value: &Value) -> bool {
    EXCLUDED_KEYS.contains(&key) || (key == NARRATIVE_KEY && value.is_object())
}
