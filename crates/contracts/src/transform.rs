//! Transform rules - declarative field pipeline attached to a route

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Working representation of one JSON message during transformation
pub type GenericRecord = serde_json::Map<String, serde_json::Value>;

/// Declarative remap / static / remove pipeline
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Transform {
    /// Ordered rename rules
    #[serde(default)]
    pub remap: Vec<FieldMap>,

    /// Fields force-set after remapping
    #[serde(default)]
    pub static_fields: HashMap<String, String>,

    /// Fields deleted last
    #[serde(default)]
    pub remove_fields: Vec<String>,
}

impl Transform {
    /// True when applying the pipeline cannot change a record
    pub fn is_empty(&self) -> bool {
        self.remap.is_empty() && self.static_fields.is_empty() && self.remove_fields.is_empty()
    }
}

/// Single remap rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMap {
    pub source: String,
    pub target: String,
    #[serde(default)]
    pub preserve_source: bool,
}

impl FieldMap {
    pub fn new(source: impl Into<String>, target: impl Into<String>, preserve_source: bool) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            preserve_source,
        }
    }
}
