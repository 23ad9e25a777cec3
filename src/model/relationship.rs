//! Explicitly declared relationship between two companies

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

fn default_confidence() -> f64 {
    1.0
}

/// A typed relationship from `source` to `target`.
///
/// `metadata["label"]` may name the label of the target node; it defaults to
/// `Company`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    pub source: String,
    pub target: String,
    #[serde(rename = "type")]
    pub relation_type: String,
    #[serde(default = "default_confidence")]
    pub confidence: f64,
    #[serde(default)]
    pub metadata: Option<Map<String, Value>>,
}

impl Relationship {
    pub fn new(
        source: impl Into<String>,
        target: impl Into<String>,
        relation_type: impl Into<String>,
    ) -> Self {
        Relationship {
            source: source.into(),
            target: target.into(),
            relation_type: relation_type.into(),
            confidence: default_confidence(),
            metadata: None,
        }
    }

    /// Target label requested through metadata, if any
    pub fn target_label(&self) -> Option<&str> {
        self.metadata
            .as_ref()
            .and_then(|meta| meta.get("label"))
            .and_then(Value::as_str)
    }
}
