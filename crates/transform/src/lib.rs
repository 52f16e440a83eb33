//! # Transform Engine
//!
//! Declarative field transformation for structured payloads.
//!
//! Pipeline, in order:
//! 1. Remap rules (declared order, chained renames allowed)
//! 2. Static fields (always win)
//! 3. Field removal (always last)
//!
//! Text and opaque payloads pass through untouched.

mod engine;
mod error;
mod record;

pub use contracts::{FieldMap, GenericRecord, Transform};
pub use engine::TransformEngine;
pub use error::TransformError;
pub use record::{apply_rules, remap_field};
