//! TransformEngine - per-route payload transformer

use bytes::Bytes;
use contracts::{ContentKind, GenericRecord, Transform};
use serde_json::Value;
use tracing::trace;

use crate::record::apply_rules;
use crate::TransformError;

/// Applies a route's transform rules to complete messages
///
/// Immutable once built; shared by every worker of the route.
#[derive(Debug, Clone)]
pub struct TransformEngine {
    transform: Transform,
    kind: ContentKind,
}

impl TransformEngine {
    pub fn new(transform: Transform, kind: ContentKind) -> Self {
        Self { transform, kind }
    }

    pub fn kind(&self) -> &ContentKind {
        &self.kind
    }

    /// Produce the outbound bytes for one complete message.
    ///
    /// Only `json` payloads are parsed; every other kind is returned as is.
    /// The output field order is unspecified.
    pub fn apply(&self, input: &[u8]) -> Result<Bytes, TransformError> {
        if self.kind != ContentKind::Json {
            return Ok(Bytes::copy_from_slice(input));
        }

        let mut record = parse_record(input)?;
        apply_rules(&mut record, &self.transform);
        trace!(fields = record.len(), "record transformed");

        serde_json::to_vec(&record)
            .map(Bytes::from)
            .map_err(TransformError::Serialize)
    }
}

fn parse_record(input: &[u8]) -> Result<GenericRecord, TransformError> {
    match serde_json::from_slice::<Value>(input).map_err(TransformError::Parse)? {
        Value::Object(record) => Ok(record),
        other => Err(TransformError::NotAnObject {
            found: value_kind(&other),
        }),
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
