//! Graph builder: turns company records into per-company transactions and
//! derives similarity edges over the stored population

pub mod relations;

pub use relations::{
    extract_investors, extract_relations, ExtractedRelations, RejectedRelation, RelationEntry,
    RelationSpec,
};

use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::config::{BuilderConfig, FailurePolicy, RelationPolicy};
use crate::error::{BuildError, BuildResult};
use crate::model::{Company, Relationship};
use crate::query::{CompanyProperties, QueryExecutor, RelationEdge, RelationRules, Statement};
use crate::schema::SimilarityBasis;

/// A company (or declared relationship) that could not be written
#[derive(Debug)]
pub struct EntityFailure {
    pub name: String,
    pub error: BuildError,
}

/// Outcome of one batch
#[derive(Debug, Default)]
pub struct UpsertReport {
    /// Entities whose transaction committed
    pub upserted: usize,
    pub failures: Vec<EntityFailure>,
    /// Malformed relation and investor entries that were dropped
    pub skipped_relations: usize,
    /// Relations dropped because their type or label failed validation
    pub rejected_relations: Vec<RejectedRelation>,
    /// Whether the similarity passes ran
    pub similarity_derived: bool,
}

impl UpsertReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty() && self.rejected_relations.is_empty()
    }
}

/// Statements for one company plus what was dropped while planning them
#[derive(Debug, Default)]
pub struct CompanyPlan {
    pub statements: Vec<Statement>,
    pub skipped_relations: usize,
    pub rejected_relations: Vec<RejectedRelation>,
}

pub struct GraphBuilder {
    executor: Arc<dyn QueryExecutor>,
    config: BuilderConfig,
    rules: RelationRules,
}

impl GraphBuilder {
    /// Builder with default policies and no relation allow-list
    pub fn new(executor: Arc<dyn QueryExecutor>) -> Self {
        Self {
            executor,
            config: BuilderConfig::default(),
            rules: RelationRules::permissive(),
        }
    }

    /// Fails if an allow-list entry is not a valid relation type
    pub fn with_config(executor: Arc<dyn QueryExecutor>, config: BuilderConfig) -> BuildResult<Self> {
        let rules = RelationRules::from_allow_list(&config.allowed_relation_types)?;
        Ok(Self {
            executor,
            config,
            rules,
        })
    }

    pub fn config(&self) -> &BuilderConfig {
        &self.config
    }

    /// Upsert every company in input order, one transaction each, then run
    /// the similarity passes over all stored companies.
    pub async fn upsert(&self, companies: &[Company]) -> BuildResult<UpsertReport> {
        info!("Upserting {} companies", companies.len());
        let mut report = UpsertReport::default();

        for company in companies {
            match self.upsert_company(company).await {
                Ok(plan) => {
                    report.upserted += 1;
                    report.skipped_relations += plan.skipped_relations;
                    report.rejected_relations.extend(plan.rejected_relations);
                }
                Err(err) => self.record_failure(&mut report, &company.name, err)?,
            }
        }

        if self.config.derive_similarity {
            self.derive_similarity().await?;
            report.similarity_derived = true;
        }

        info!(
            "Upserted {} of {} companies ({} failed, {} relations rejected)",
            report.upserted,
            companies.len(),
            report.failures.len(),
            report.rejected_relations.len()
        );
        Ok(report)
    }

    async fn upsert_company(&self, company: &Company) -> BuildResult<CompanyPlan> {
        let plan = self.plan_company(company)?;
        debug!(
            "Company '{}': {} statements",
            company.name,
            plan.statements.len()
        );
        self.executor.run_in_transaction(&plan.statements).await?;
        Ok(plan)
    }

    fn record_failure(&self, report: &mut UpsertReport, name: &str, err: BuildError) -> BuildResult<()> {
        match self.config.failure_policy {
            FailurePolicy::FailFast => Err(BuildError::Entity {
                name: name.to_string(),
                source: Box::new(err),
            }),
            FailurePolicy::Continue => {
                error!("Failed to upsert '{}': {}", name, err);
                report.failures.push(EntityFailure {
                    name: name.to_string(),
                    error: err,
                });
                Ok(())
            }
        }
    }

    /// Build the statements for one company without running them
    pub fn plan_company(&self, company: &Company) -> BuildResult<CompanyPlan> {
        let name = company.name.as_str();
        if name.trim().is_empty() {
            return Err(BuildError::InvalidEntity {
                name: name.to_string(),
                reason: "company name is empty".to_string(),
            });
        }

        let mut plan = CompanyPlan::default();
        plan.statements
            .push(Statement::UpsertCompany(CompanyProperties::from(company)));

        if let Some(group) = company.group.as_deref().map(str::trim) {
            if !group.is_empty() {
                plan.statements.push(Statement::LinkHolding {
                    company: name.to_string(),
                    holding: group.to_string(),
                });
            }
        }

        for brand in company.brands.iter().filter(|b| !b.name.trim().is_empty()) {
            plan.statements.push(Statement::LinkBrand {
                company: name.to_string(),
                brand: brand.name.clone(),
                cnpjs: brand.cnpjs.clone(),
            });
        }

        for product in company.products.iter().filter(|p| !p.trim().is_empty()) {
            plan.statements.push(Statement::LinkProductCategory {
                company: name.to_string(),
                category: product.clone(),
            });
        }

        let extracted = extract_relations(company, &self.rules);
        if let Some(rejected) = extracted.rejected.first() {
            if self.config.relation_policy == RelationPolicy::Reject {
                return Err(BuildError::RejectedRelation {
                    company: name.to_string(),
                    source: rejected.error.clone(),
                });
            }
        }
        for rejected in &extracted.rejected {
            warn!(
                "Dropping relation '{}' -> '{}': {}",
                rejected.company, rejected.target, rejected.error
            );
        }
        plan.statements.extend(
            extracted
                .relations
                .into_iter()
                .map(|spec| Statement::LinkRelation(spec.into_edge(name))),
        );
        plan.skipped_relations = extracted.skipped;
        plan.rejected_relations = extracted.rejected;

        let (investors, skipped_investors) = extract_investors(company);
        plan.statements
            .extend(investors.into_iter().map(|investor| Statement::LinkInvestor {
                company: name.to_string(),
                investor,
            }));
        plan.skipped_relations += skipped_investors;

        Ok(plan)
    }

    /// Recompute `SIMILAR_TO` edges for both bases: prune stale edges, then
    /// merge current ones. Each basis runs in its own transaction.
    pub async fn derive_similarity(&self) -> BuildResult<()> {
        for basis in SimilarityBasis::ALL {
            debug!("Deriving {} similarity", basis);
            let statements = [Statement::PruneSimilar(basis), Statement::DeriveSimilar(basis)];
            self.executor
                .run_in_transaction(&statements)
                .await
                .map_err(|source| BuildError::Derivation { basis, source })?;
        }
        Ok(())
    }

    /// Write explicitly declared relationships, one transaction each.
    ///
    /// Type, label and confidence go through the same validation as
    /// metadata relations; the failure and relation policies apply.
    pub async fn upsert_relationships(
        &self,
        relationships: &[Relationship],
    ) -> BuildResult<UpsertReport> {
        info!("Upserting {} relationships", relationships.len());
        let mut report = UpsertReport::default();

        for relationship in relationships {
            let name = format!("{} -> {}", relationship.source, relationship.target);
            let edge = match self.relationship_edge(relationship) {
                Ok(Some(edge)) => edge,
                Ok(None) => {
                    report.skipped_relations += 1;
                    continue;
                }
                Err(rejected) => match self.config.relation_policy {
                    RelationPolicy::Drop => {
                        warn!("Dropping relationship {}: {}", name, rejected.error);
                        report.rejected_relations.push(rejected);
                        continue;
                    }
                    RelationPolicy::Reject => {
                        let err = BuildError::RejectedRelation {
                            company: rejected.company,
                            source: rejected.error,
                        };
                        self.record_failure(&mut report, &name, err)?;
                        continue;
                    }
                },
            };

            match self.executor.run(&Statement::LinkRelation(edge)).await {
                Ok(()) => report.upserted += 1,
                Err(err) => self.record_failure(&mut report, &name, err.into())?,
            }
        }
        Ok(report)
    }

    /// `Ok(None)` for a malformed relationship (blank endpoint, bad confidence)
    fn relationship_edge(
        &self,
        relationship: &Relationship,
    ) -> Result<Option<RelationEdge>, RejectedRelation> {
        let source = relationship.source.trim();
        let target = relationship.target.trim();
        if source.is_empty()
            || target.is_empty()
            || !relations::is_valid_confidence(relationship.confidence)
        {
            return Ok(None);
        }

        let reject = |error| RejectedRelation {
            company: source.to_string(),
            target: target.to_string(),
            error,
        };
        let relation_type = self
            .rules
            .resolve(Some(relationship.relation_type.as_str()))
            .map_err(reject)?;
        let label = relations::resolve_label(relationship.target_label()).map_err(reject)?;

        Ok(Some(RelationEdge {
            source: source.to_string(),
            target: target.to_string(),
            relation_type,
            label,
            confidence: relationship.confidence,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::company::META_RELATIONS;
    use crate::model::Brand;
    use crate::query::EmbeddedExecutor;
    use serde_json::json;

    fn builder(config: BuilderConfig) -> GraphBuilder {
        GraphBuilder::with_config(Arc::new(EmbeddedExecutor::new()), config).unwrap()
    }

    #[test]
    fn test_plan_order_and_skips() {
        let company = Company::new("StoneCo")
            .with_group("Stone Holding")
            .with_brand(Brand::new("Ton"))
            .with_brand(Brand::new(""))
            .with_products(["gateway", " "])
            .with_meta(META_RELATIONS, json!(["Linx", {"type": "x"}]));

        let plan = builder(BuilderConfig::default()).plan_company(&company).unwrap();
        let kinds: Vec<_> = plan.statements.iter().map(Statement::kind).collect();
        assert_eq!(
            kinds,
            vec![
                "upsert_company",
                "link_holding",
                "link_brand",
                "link_product_category",
                "link_relation"
            ]
        );
        assert_eq!(plan.skipped_relations, 1);
    }

    #[test]
    fn test_empty_name_is_invalid() {
        let err = builder(BuilderConfig::default())
            .plan_company(&Company::new("  "))
            .unwrap_err();
        assert!(matches!(err, BuildError::InvalidEntity { .. }));
    }

    #[test]
    fn test_blank_group_is_ignored() {
        let plan = builder(BuilderConfig::default())
            .plan_company(&Company::new("A").with_group(""))
            .unwrap();
        assert_eq!(plan.statements.len(), 1);
    }

    #[test]
    fn test_reject_policy_fails_company() {
        let config = BuilderConfig {
            relation_policy: RelationPolicy::Reject,
            ..BuilderConfig::default()
        };
        let company = Company::new("A")
            .with_meta(META_RELATIONS, json!([{"target": "B", "label": "Robot"}]));
        let err = builder(config).plan_company(&company).unwrap_err();
        assert!(matches!(err, BuildError::RejectedRelation { .. }));
    }

    #[test]
    fn test_invalid_allow_list() {
        let config = BuilderConfig {
            allowed_relation_types: vec!["1BAD".to_string()],
            ..BuilderConfig::default()
        };
        let result = GraphBuilder::with_config(Arc::new(EmbeddedExecutor::new()), config);
        assert!(matches!(result, Err(BuildError::Identifier(_))));
    }
}
