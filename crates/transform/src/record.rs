//! Rule application over a GenericRecord

use contracts::{GenericRecord, Transform};
use serde_json::Value;

/// Copy `source` to `target`, dropping `source` unless `preserve_source`.
///
/// Absent source fields are a no-op. An existing `target` is overwritten.
/// The source is removed after the copy, so a rule mapping a field onto
/// itself without `preserve_source` deletes it.
pub fn remap_field(record: &mut GenericRecord, source: &str, target: &str, preserve_source: bool) {
    let Some(value) = record.get(source).cloned() else {
        return;
    };

    record.insert(target.to_string(), value);
    if !preserve_source {
        record.remove(source);
    }
}

/// Run remap, static and remove steps in place
pub fn apply_rules(record: &mut GenericRecord, transform: &Transform) {
    for rule in &transform.remap {
        remap_field(record, &rule.source, &rule.target, rule.preserve_source);
    }

    for (key, value) in &transform.static_fields {
        record.insert(key.clone(), Value::String(value.clone()));
    }

    for field in &transform.remove_fields {
        record.remove(field);
    }
}
