//! EmbeddedExecutor: applies statements to an in-process GraphStore

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use super::executor::QueryExecutor;
use super::statement::{CompanyProperties, RelationEdge, Statement};
use crate::error::ExecutionResult;
use crate::graph::{similarity, EdgeType, GraphError, GraphResult, GraphStore, NodeId, PropertyMap};
use crate::schema::{self, NodeLabel};

/// In-process executor that wraps a GraphStore directly.
///
/// Statements are interpreted against the store with the same merge
/// semantics the Cypher templates have on a server. A transaction holds the
/// write lock for its whole duration.
#[derive(Debug, Clone, Default)]
pub struct EmbeddedExecutor {
    store: Arc<RwLock<GraphStore>>,
}

impl EmbeddedExecutor {
    /// Create an executor over a fresh empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an executor wrapping an existing store
    pub fn with_store(store: Arc<RwLock<GraphStore>>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<RwLock<GraphStore>> {
        &self.store
    }

    /// Acquire a read lock on the store
    pub async fn store_read(&self) -> tokio::sync::RwLockReadGuard<'_, GraphStore> {
        self.store.read().await
    }
}

#[async_trait]
impl QueryExecutor for EmbeddedExecutor {
    async fn run_in_transaction(&self, statements: &[Statement]) -> ExecutionResult<()> {
        // Every failure mode of `apply` is a missing natural key, so checking
        // them all up front means the transaction either applies fully or not
        // at all.
        validate(statements)?;

        let mut store = self.store.write().await;
        for statement in statements {
            debug!("Applying {} statement", statement.kind());
            apply(&mut store, statement)?;
        }
        Ok(())
    }
}

fn validate(statements: &[Statement]) -> GraphResult<()> {
    let missing = statements
        .iter()
        .flat_map(Statement::natural_keys)
        .find(|(_, key)| key.is_empty());
    match missing {
        Some((label, _)) => Err(GraphError::EmptyKey(label.into())),
        None => Ok(()),
    }
}

fn apply(store: &mut GraphStore, statement: &Statement) -> GraphResult<()> {
    match statement {
        Statement::UpsertCompany(props) => upsert_company(store, props),
        Statement::LinkHolding { company, holding } => {
            let company = store.merge_node(NodeLabel::Company, company)?;
            let holding = store.merge_node(NodeLabel::Holding, holding)?;
            store.merge_edge(company, holding, schema::BELONGS_TO, PropertyMap::new())?;
            Ok(())
        }
        Statement::LinkBrand { company, brand, cnpjs } => {
            let company = store.merge_node(NodeLabel::Company, company)?;
            let brand = store.merge_node(NodeLabel::Brand, brand)?;
            set_node_property(store, brand, "cnpjs", cnpjs.as_slice().into())?;
            store.merge_edge(company, brand, schema::OPERATES_AS, PropertyMap::new())?;
            Ok(())
        }
        Statement::LinkProductCategory { company, category } => {
            let company = store.merge_node(NodeLabel::Company, company)?;
            let category = store.merge_node(NodeLabel::ProductCategory, category)?;
            store.merge_edge(company, category, schema::OFFERS, PropertyMap::new())?;
            Ok(())
        }
        Statement::LinkInvestor { company, investor } => {
            let company = store.merge_node(NodeLabel::Company, company)?;
            let investor = store.merge_node(NodeLabel::Investor, investor)?;
            store.merge_edge(investor, company, schema::INVESTS_IN, PropertyMap::new())?;
            Ok(())
        }
        Statement::LinkRelation(edge) => link_relation(store, edge),
        Statement::PruneSimilar(basis) => {
            similarity::prune_similar(store, *basis)?;
            Ok(())
        }
        Statement::DeriveSimilar(basis) => {
            similarity::derive_similar(store, *basis)?;
            Ok(())
        }
    }
}

fn upsert_company(store: &mut GraphStore, props: &CompanyProperties) -> GraphResult<()> {
    let id = store.merge_node(NodeLabel::Company, &props.name)?;
    let params = Statement::UpsertCompany(props.clone()).parameters();
    let node = store.get_node_mut(id).ok_or(GraphError::NodeNotFound(id))?;
    for (key, value) in params {
        if key != schema::NAME {
            node.set_property(key, value);
        }
    }
    Ok(())
}

fn link_relation(store: &mut GraphStore, edge: &RelationEdge) -> GraphResult<()> {
    let source = store.merge_node(NodeLabel::Company, &edge.source)?;
    let target = store.merge_node(edge.label, &edge.target)?;
    let edge_type = EdgeType::from(&edge.relation_type);
    let id = store.merge_edge(source, target, edge_type, PropertyMap::new())?;
    let stored = store.get_edge_mut(id).ok_or(GraphError::EdgeNotFound(id))?;
    stored.set_property(schema::CONFIDENCE, edge.confidence);
    Ok(())
}

fn set_node_property(
    store: &mut GraphStore,
    id: NodeId,
    key: &str,
    value: crate::graph::PropertyValue,
) -> GraphResult<()> {
    let node = store.get_node_mut(id).ok_or(GraphError::NodeNotFound(id))?;
    node.set_property(key, value);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExecutionError;
    use crate::graph::Label;
    use crate::query::RelationType;
    use crate::schema::SimilarityBasis;

    fn company(name: &str, sector: Option<&str>) -> Statement {
        Statement::UpsertCompany(CompanyProperties {
            name: name.to_string(),
            revenue: None,
            sector: sector.map(str::to_string),
            website: None,
            linkedin: None,
            cnpjs: vec![],
            addresses: vec![],
            description: None,
        })
    }

    #[tokio::test]
    async fn test_default_executor_ids_start_at_one() {
        let executor = EmbeddedExecutor::default();
        executor.run(&company("Acme", None)).await.unwrap();
        let store = executor.store_read().await;
        assert_eq!(
            store.find_node(&Label::new("Company"), "Acme"),
            Some(crate::graph::NodeId::new(1))
        );
    }

    #[tokio::test]
    async fn test_upsert_sets_and_clears_properties() {
        let executor = EmbeddedExecutor::new();
        executor.run(&company("Acme", Some("Retail"))).await.unwrap();
        executor.run(&company("Acme", None)).await.unwrap();

        let store = executor.store_read().await;
        let id = store.find_node(&Label::new("Company"), "Acme").unwrap();
        let node = store.get_node(id).unwrap();
        assert!(!node.has_property("sector"));
        assert_eq!(node.get_str("name"), Some("Acme"));
        assert_eq!(store.node_count(), 1);
    }

    #[tokio::test]
    async fn test_transaction_with_empty_key_writes_nothing() {
        let executor = EmbeddedExecutor::new();
        let statements = vec![
            company("Acme", None),
            Statement::LinkProductCategory {
                company: "Acme".to_string(),
                category: String::new(),
            },
        ];

        let err = executor.run_in_transaction(&statements).await.unwrap_err();
        assert!(matches!(
            err,
            ExecutionError::Graph(GraphError::EmptyKey(ref label)) if label.as_str() == "ProductCategory"
        ));
        assert_eq!(executor.store_read().await.node_count(), 0);
    }

    #[tokio::test]
    async fn test_link_relation_sets_confidence() {
        let executor = EmbeddedExecutor::new();
        let edge = RelationEdge {
            source: "Acme".to_string(),
            target: "Jane Doe".to_string(),
            relation_type: RelationType::parse("founded by").unwrap(),
            label: NodeLabel::Person,
            confidence: 0.8,
        };
        executor.run(&Statement::LinkRelation(edge.clone())).await.unwrap();
        executor.run(&Statement::LinkRelation(edge)).await.unwrap();

        let store = executor.store_read().await;
        assert!(store.find_node(&Label::new("Person"), "Jane Doe").is_some());
        let edges = store.get_edges_by_type(&EdgeType::new("FOUNDED BY"));
        assert_eq!(edges.len(), 1);
        assert_eq!(
            edges[0].get_property(schema::CONFIDENCE).and_then(|v| v.as_float()),
            Some(0.8)
        );
    }

    #[tokio::test]
    async fn test_investor_edge_points_at_company() {
        let executor = EmbeddedExecutor::new();
        executor
            .run(&Statement::LinkInvestor {
                company: "Acme".to_string(),
                investor: "Fund One".to_string(),
            })
            .await
            .unwrap();

        let store = executor.store_read().await;
        let investor = store.find_node(&Label::new("Investor"), "Fund One").unwrap();
        let acme = store.find_node(&Label::new("Company"), "Acme").unwrap();
        let edges = store.get_edges_by_type(&EdgeType::new(schema::INVESTS_IN));
        assert_eq!(edges.len(), 1);
        assert_eq!((edges[0].source, edges[0].target), (investor, acme));
    }

    #[tokio::test]
    async fn test_sector_similarity_statements() {
        let executor = EmbeddedExecutor::new();
        executor
            .run_in_transaction(&[company("A", Some("Retail")), company("B", Some("Retail"))])
            .await
            .unwrap();
        executor
            .run(&Statement::DeriveSimilar(SimilarityBasis::Sector))
            .await
            .unwrap();
        assert_eq!(
            executor
                .store_read()
                .await
                .get_edges_by_type(&EdgeType::new(schema::SIMILAR_TO))
                .len(),
            1
        );

        executor.run(&company("B", Some("Finance"))).await.unwrap();
        executor
            .run(&Statement::PruneSimilar(SimilarityBasis::Sector))
            .await
            .unwrap();
        assert!(executor
            .store_read()
            .await
            .get_edges_by_type(&EdgeType::new(schema::SIMILAR_TO))
            .is_empty());
    }
}
