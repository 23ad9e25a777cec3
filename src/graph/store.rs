//! In-memory graph storage with natural-key merge semantics
//!
//! Nodes are identified by `(label, name)`; merging a node or an edge that
//! already exists returns the existing id instead of creating a duplicate.

use super::edge::Edge;
use super::node::Node;
use super::property::PropertyMap;
use super::types::{EdgeId, EdgeType, Label, NodeId};
use rustc_hash::{FxHashMap, FxHashSet};
use thiserror::Error;

/// Errors that can occur during graph operations
#[derive(Error, Debug, PartialEq)]
pub enum GraphError {
    #[error("Node {0} not found")]
    NodeNotFound(NodeId),

    #[error("Edge {0} not found")]
    EdgeNotFound(EdgeId),

    #[error("Invalid edge: source node {0} does not exist")]
    InvalidEdgeSource(NodeId),

    #[error("Invalid edge: target node {0} does not exist")]
    InvalidEdgeTarget(NodeId),

    #[error("Empty natural key for label {0}")]
    EmptyKey(Label),
}

pub type GraphResult<T> = Result<T, GraphError>;

/// In-memory graph storage
///
/// Hash maps keep every lookup the merge path needs O(1):
/// - key_index: (Label, name) -> NodeId
/// - outgoing / incoming: NodeId -> Vec<EdgeId>
/// - label_index / edge_type_index for scans
#[derive(Debug)]
pub struct GraphStore {
    nodes: FxHashMap<NodeId, Node>,
    edges: FxHashMap<EdgeId, Edge>,
    outgoing: FxHashMap<NodeId, Vec<EdgeId>>,
    incoming: FxHashMap<NodeId, Vec<EdgeId>>,
    key_index: FxHashMap<(Label, String), NodeId>,
    label_index: FxHashMap<Label, FxHashSet<NodeId>>,
    edge_type_index: FxHashMap<EdgeType, FxHashSet<EdgeId>>,
    next_node_id: u64,
    next_edge_id: u64,
}

impl GraphStore {
    pub fn new() -> Self {
        GraphStore {
            nodes: FxHashMap::default(),
            edges: FxHashMap::default(),
            outgoing: FxHashMap::default(),
            incoming: FxHashMap::default(),
            key_index: FxHashMap::default(),
            label_index: FxHashMap::default(),
            edge_type_index: FxHashMap::default(),
            next_node_id: 1,
            next_edge_id: 1,
        }
    }

    /// Find the node with the given label and natural key, creating it if absent
    pub fn merge_node(&mut self, label: impl Into<Label>, key: &str) -> GraphResult<NodeId> {
        let label = label.into();
        if key.is_empty() {
            return Err(GraphError::EmptyKey(label));
        }

        let index_key = (label, key.to_string());
        if let Some(id) = self.key_index.get(&index_key) {
            return Ok(*id);
        }

        // Ids are never reused: derived-edge orientation depends on it.
        let node_id = NodeId::new(self.next_id(true));
        let (label, key) = index_key;
        let node = Node::new_keyed(node_id, label.clone(), key.clone());

        self.label_index
            .entry(label.clone())
            .or_default()
            .insert(node_id);
        self.key_index.insert((label, key), node_id);
        self.nodes.insert(node_id, node);
        Ok(node_id)
    }

    pub fn find_node(&self, label: &Label, key: &str) -> Option<NodeId> {
        self.key_index.get(&(label.clone(), key.to_string())).copied()
    }

    pub fn get_node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn get_node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&id)
    }

    pub fn has_node(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Find an edge `source -[edge_type]-> target` whose properties include
    /// `pattern`, creating it with `pattern` as its properties if absent.
    pub fn merge_edge(
        &mut self,
        source: NodeId,
        target: NodeId,
        edge_type: impl Into<EdgeType>,
        pattern: PropertyMap,
    ) -> GraphResult<EdgeId> {
        if !self.has_node(source) {
            return Err(GraphError::InvalidEdgeSource(source));
        }
        if !self.has_node(target) {
            return Err(GraphError::InvalidEdgeTarget(target));
        }

        let edge_type = edge_type.into();
        let existing = self
            .find_edges(source, target, &edge_type)
            .into_iter()
            .find(|edge| edge.matches_properties(&pattern))
            .map(|edge| edge.id);
        if let Some(id) = existing {
            return Ok(id);
        }

        let edge_id = EdgeId::new(self.next_id(false));
        let edge = Edge::new_with_properties(edge_id, source, target, edge_type.clone(), pattern);

        self.outgoing.entry(source).or_default().push(edge_id);
        self.incoming.entry(target).or_default().push(edge_id);
        self.edge_type_index
            .entry(edge_type)
            .or_default()
            .insert(edge_id);
        self.edges.insert(edge_id, edge);
        Ok(edge_id)
    }

    /// Edges of one type going from `source` to `target`
    pub fn find_edges(&self, source: NodeId, target: NodeId, edge_type: &EdgeType) -> Vec<&Edge> {
        self.get_outgoing_edges(source)
            .into_iter()
            .filter(|edge| edge.target == target && &edge.edge_type == edge_type)
            .collect()
    }

    pub fn get_edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edges.get(&id)
    }

    pub fn get_edge_mut(&mut self, id: EdgeId) -> Option<&mut Edge> {
        self.edges.get_mut(&id)
    }

    pub fn delete_edge(&mut self, id: EdgeId) -> GraphResult<Edge> {
        let edge = self.edges.remove(&id).ok_or(GraphError::EdgeNotFound(id))?;

        if let Some(out) = self.outgoing.get_mut(&edge.source) {
            out.retain(|e| *e != id);
        }
        if let Some(inc) = self.incoming.get_mut(&edge.target) {
            inc.retain(|e| *e != id);
        }
        if let Some(ids) = self.edge_type_index.get_mut(&edge.edge_type) {
            ids.remove(&id);
        }
        Ok(edge)
    }

    pub fn get_outgoing_edges(&self, node_id: NodeId) -> Vec<&Edge> {
        self.adjacent(&self.outgoing, node_id)
    }

    pub fn get_incoming_edges(&self, node_id: NodeId) -> Vec<&Edge> {
        self.adjacent(&self.incoming, node_id)
    }

    /// Nodes carrying `label`, in id order
    pub fn get_nodes_by_label(&self, label: &Label) -> Vec<&Node> {
        let mut nodes: Vec<&Node> = self
            .label_index
            .get(label)
            .into_iter()
            .flatten()
            .filter_map(|id| self.nodes.get(id))
            .collect();
        nodes.sort_by_key(|node| node.id);
        nodes
    }

    /// Edges of `edge_type`, in id order
    pub fn get_edges_by_type(&self, edge_type: &EdgeType) -> Vec<&Edge> {
        let mut edges: Vec<&Edge> = self
            .edge_type_index
            .get(edge_type)
            .into_iter()
            .flatten()
            .filter_map(|id| self.edges.get(id))
            .collect();
        edges.sort_by_key(|edge| edge.id);
        edges
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    fn adjacent(&self, lists: &FxHashMap<NodeId, Vec<EdgeId>>, node_id: NodeId) -> Vec<&Edge> {
        lists
            .get(&node_id)
            .map(|ids| ids.iter().filter_map(|id| self.edges.get(id)).collect())
            .unwrap_or_default()
    }

    fn next_id(&mut self, node: bool) -> u64 {
        let counter = if node {
            &mut self.next_node_id
        } else {
            &mut self.next_edge_id
        };
        let id = *counter;
        *counter += 1;
        id
    }
}

impl Default for GraphStore {
    fn default() -> Self {
        GraphStore::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::PropertyValue;

    #[test]
    fn test_merge_node_is_keyed() {
        let mut store = GraphStore::new();
        let a = store.merge_node("Company", "Acme").unwrap();
        let b = store.merge_node("Company", "Acme").unwrap();
        let holding = store.merge_node("Holding", "Acme").unwrap();

        assert_eq!(a, b);
        assert_ne!(a, holding);
        assert_eq!(store.node_count(), 2);
        assert_eq!(store.find_node(&Label::new("Holding"), "Acme"), Some(holding));
    }

    #[test]
    fn test_default_matches_new() {
        let mut store = GraphStore::default();
        let a = store.merge_node("Company", "A").unwrap();
        let b = store.merge_node("Company", "B").unwrap();
        let e = store.merge_edge(a, b, "RELATED_TO", PropertyMap::new()).unwrap();
        assert_eq!(a, NodeId::new(1));
        assert_eq!(e, EdgeId::new(1));
    }

    #[test]
    fn test_merge_node_is_case_sensitive() {
        let mut store = GraphStore::new();
        store.merge_node("Company", "acme").unwrap();
        store.merge_node("Company", "Acme").unwrap();
        assert_eq!(store.node_count(), 2);
    }

    #[test]
    fn test_merge_node_rejects_empty_key() {
        let mut store = GraphStore::new();
        assert_eq!(
            store.merge_node("Company", ""),
            Err(GraphError::EmptyKey(Label::new("Company")))
        );
        assert_eq!(store.node_count(), 0);
    }

    #[test]
    fn test_merge_edge_dedups() {
        let mut store = GraphStore::new();
        let c = store.merge_node("Company", "StoneCo").unwrap();
        let p = store.merge_node("ProductCategory", "gateway").unwrap();

        let e1 = store.merge_edge(c, p, "OFFERS", PropertyMap::new()).unwrap();
        let e2 = store.merge_edge(c, p, "OFFERS", PropertyMap::new()).unwrap();
        assert_eq!(e1, e2);
        assert_eq!(store.edge_count(), 1);

        // Opposite direction is a different edge
        store.merge_edge(p, c, "OFFERS", PropertyMap::new()).unwrap();
        assert_eq!(store.edge_count(), 2);
    }

    #[test]
    fn test_merge_edge_distinguishes_pattern_properties() {
        let mut store = GraphStore::new();
        let a = store.merge_node("Company", "A").unwrap();
        let b = store.merge_node("Company", "B").unwrap();

        let mut sector = PropertyMap::new();
        sector.insert("basis".to_string(), PropertyValue::from("sector"));
        let mut category = PropertyMap::new();
        category.insert("basis".to_string(), PropertyValue::from("product_category"));

        let s = store.merge_edge(a, b, "SIMILAR_TO", sector.clone()).unwrap();
        let c = store.merge_edge(a, b, "SIMILAR_TO", category).unwrap();
        assert_ne!(s, c);
        assert_eq!(store.merge_edge(a, b, "SIMILAR_TO", sector).unwrap(), s);
        assert_eq!(store.get_edges_by_type(&EdgeType::new("SIMILAR_TO")).len(), 2);
    }

    #[test]
    fn test_merge_edge_requires_nodes() {
        let mut store = GraphStore::new();
        let a = store.merge_node("Company", "A").unwrap();
        assert_eq!(
            store.merge_edge(a, NodeId::new(99), "OFFERS", PropertyMap::new()),
            Err(GraphError::InvalidEdgeTarget(NodeId::new(99)))
        );
    }

    #[test]
    fn test_delete_edge_updates_indices() {
        let mut store = GraphStore::new();
        let a = store.merge_node("Company", "A").unwrap();
        let h = store.merge_node("Holding", "H").unwrap();
        let e = store.merge_edge(a, h, "BELONGS_TO", PropertyMap::new()).unwrap();

        store.delete_edge(e).unwrap();
        assert_eq!(store.edge_count(), 0);
        assert!(store.get_outgoing_edges(a).is_empty());
        assert!(store.get_incoming_edges(h).is_empty());
        assert!(store.get_edges_by_type(&EdgeType::new("BELONGS_TO")).is_empty());
        assert_eq!(store.delete_edge(e), Err(GraphError::EdgeNotFound(e)));
    }

    #[test]
    fn test_nodes_by_label_in_id_order() {
        let mut store = GraphStore::new();
        for name in ["C", "A", "B"] {
            store.merge_node("Company", name).unwrap();
        }
        let names: Vec<_> = store
            .get_nodes_by_label(&Label::new("Company"))
            .iter()
            .filter_map(|n| n.key())
            .collect();
        assert_eq!(names, vec!["C", "A", "B"]);
    }
}
