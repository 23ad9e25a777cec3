//! Nodes of the property graph

use super::property::{PropertyMap, PropertyValue};
use super::types::{Label, NodeId};
use serde::{Deserialize, Serialize};

/// Property holding a node's natural key
pub const KEY_PROPERTY: &str = "name";

/// A node in the property graph
///
/// Every node the store creates through a merge carries its natural key in
/// the `name` property; `(label, name)` is unique across the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    /// Unique identifier for this node
    pub id: NodeId,

    /// The node's single label; `(label, name)` is its identity
    pub label: Label,

    /// Properties associated with this node
    pub properties: PropertyMap,
}

impl Node {
    /// Create a node with a single label and its natural key
    pub fn new_keyed(id: NodeId, label: impl Into<Label>, key: impl Into<String>) -> Self {
        let mut properties = PropertyMap::new();
        properties.insert(KEY_PROPERTY.to_string(), PropertyValue::String(key.into()));

        Node {
            id,
            label: label.into(),
            properties,
        }
    }

    /// The natural key, if this node has one
    pub fn key(&self) -> Option<&str> {
        self.get_property(KEY_PROPERTY).and_then(PropertyValue::as_string)
    }

    pub fn has_label(&self, label: &Label) -> bool {
        self.label == *label
    }

    /// Set a property value. Setting `Null` removes the property.
    pub fn set_property(
        &mut self,
        key: impl Into<String>,
        value: impl Into<PropertyValue>,
    ) -> Option<PropertyValue> {
        let key = key.into();
        let value = value.into();
        if value.is_null() {
            self.properties.remove(&key)
        } else {
            self.properties.insert(key, value)
        }
    }

    pub fn get_property(&self, key: &str) -> Option<&PropertyValue> {
        self.properties.get(key)
    }

    /// Get a string property, treating absent and non-string values alike
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get_property(key).and_then(PropertyValue::as_string)
    }

    pub fn has_property(&self, key: &str) -> bool {
        self.properties.contains_key(key)
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Node {}

impl std::hash::Hash for Node {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}
