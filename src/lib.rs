//! orggraph: organization graph upsert engine
//!
//! Writes enriched company records into a property graph as `Company`,
//! `Brand`, `Holding`, `ProductCategory` and `Investor` nodes, and derives
//! `SIMILAR_TO` edges between companies that share a product category or a
//! sector.
//!
//! Writes go through a `QueryExecutor`: `EmbeddedExecutor` applies them to an
//! in-process `GraphStore`, `HttpExecutor` sends them to a Neo4j-compatible
//! server. Every company is upserted in its own transaction.
//!
//! ## Example Usage
//!
//! ```rust
//! use orggraph::{Company, EmbeddedExecutor, GraphBuilder, Label};
//! use std::sync::Arc;
//!
//! # tokio_test_block(async {
//! let executor = Arc::new(EmbeddedExecutor::new());
//! let builder = GraphBuilder::new(executor.clone());
//!
//! let companies = vec![
//!     Company::new("StoneCo").with_sector("Fintech").with_products(["gateway"]),
//!     Company::new("PagSeguro").with_sector("Fintech").with_products(["gateway"]),
//! ];
//! let report = builder.upsert(&companies).await.unwrap();
//! assert_eq!(report.upserted, 2);
//!
//! let store = executor.store_read().await;
//! assert_eq!(store.get_nodes_by_label(&Label::new("Company")).len(), 2);
//! # });
//! # fn tokio_test_block<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Runtime::new().unwrap().block_on(f)
//! # }
//! ```

#![allow(missing_docs)]
#![warn(clippy::all)]

pub mod builder;
pub mod config;
pub mod error;
pub mod graph;
pub mod model;
pub mod query;
pub mod schema;

// Re-export main types for convenience
pub use builder::{EntityFailure, GraphBuilder, UpsertReport};
pub use config::{BuilderConfig, Config, FailurePolicy, RelationPolicy, RetryConfig, StoreConfig};
pub use error::{BuildError, BuildResult, ConfigError, ExecutionError, ExecutionResult};
pub use graph::{
    Edge, EdgeId, EdgeType, GraphError, GraphResult, GraphStore, Label, Node, NodeId,
    PropertyMap, PropertyValue,
};
pub use model::{Brand, Company, Relationship};
pub use query::{
    EmbeddedExecutor, HttpExecutor, IdentifierError, QueryExecutor, RelationType,
    RetryingExecutor, Statement,
};
pub use schema::{NodeLabel, SimilarityBasis};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub fn version() -> &'static str {
    VERSION
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert_eq!(version(), "0.1.0");
    }
}
