//! Transform error types

use thiserror::Error;

/// Transform errors
#[derive(Debug, Error)]
pub enum TransformError {
    /// Payload is not valid JSON
    #[error("failed to parse JSON payload: {0}")]
    Parse(#[source] serde_json::Error),

    /// Payload is valid JSON but not an object
    #[error("JSON payload must be an object, got {found}")]
    NotAnObject { found: &'static str },

    /// Record could not be serialized back
    #[error("failed to serialize transformed record: {0}")]
    Serialize(#[source] serde_json::Error),
}
