//! Directed edges of the property graph

use super::property::{PropertyMap, PropertyValue};
use super::types::{EdgeId, EdgeType, NodeId};
use serde::{Deserialize, Serialize};

/// A directed edge in the property graph
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Edge {
    pub id: EdgeId,

    /// Edge goes FROM this node
    pub source: NodeId,

    /// Edge goes TO this node
    pub target: NodeId,

    pub edge_type: EdgeType,

    pub properties: PropertyMap,
}

impl Edge {
    pub fn new_with_properties(
        id: EdgeId,
        source: NodeId,
        target: NodeId,
        edge_type: impl Into<EdgeType>,
        properties: PropertyMap,
    ) -> Self {
        Edge {
            id,
            source,
            target,
            edge_type: edge_type.into(),
            properties,
        }
    }

    /// Set a property value. Setting `Null` removes the property.
    pub fn set_property(&mut self, key: impl Into<String>, value: impl Into<PropertyValue>) {
        let key = key.into();
        let value = value.into();
        if value.is_null() {
            self.properties.remove(&key);
        } else {
            self.properties.insert(key, value);
        }
    }

    pub fn get_property(&self, key: &str) -> Option<&PropertyValue> {
        self.properties.get(key)
    }

    /// Whether every entry of `pattern` is present on this edge with an equal
    /// value. This is the matching rule of a property-constrained MERGE.
    pub fn matches_properties(&self, pattern: &PropertyMap) -> bool {
        pattern
            .iter()
            .all(|(key, value)| self.properties.get(key) == Some(value))
    }

    pub fn is_self_loop(&self) -> bool {
        self.source == self.target
    }
}

impl PartialEq for Edge {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Edge {}

impl std::hash::Hash for Edge {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}
