//! In-memory property graph with merge-by-natural-key semantics
//!
//! Nodes carry one label and a `name` key unique per label; edges are
//! directed and typed, and merged by (source, target, type, property
//! pattern). Backs the embedded executor.

pub mod edge;
pub mod node;
pub mod property;
pub mod similarity;
pub mod store;
pub mod types;

pub use edge::Edge;
pub use node::Node;
pub use property::{PropertyMap, PropertyValue};
pub use similarity::SimilarPair;
pub use store::{GraphError, GraphResult, GraphStore};
pub use types::{EdgeId, EdgeType, Label, NodeId};
