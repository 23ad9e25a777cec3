//! The closed set of write statements the engine issues
//!
//! Every statement exposes a Cypher template with `$`-named parameters and
//! the matching parameter map. Values only ever travel as parameters; the
//! sole identifiers spliced into text are `NodeLabel`s and validated
//! `RelationType`s.

use std::borrow::Cow;

use super::identifier::RelationType;
use crate::graph::{PropertyMap, PropertyValue};
use crate::model::Company;
use crate::schema::{NodeLabel, SimilarityBasis};

const UPSERT_COMPANY: &str = "\
MERGE (c:Company {name: $name})
SET c.revenue = $revenue,
    c.sector = $sector,
    c.website = $website,
    c.linkedin = $linkedin,
    c.cnpjs = $cnpjs,
    c.addresses = $addresses,
    c.description = $description";

const LINK_HOLDING: &str = "\
MERGE (c:Company {name: $company_name})
MERGE (h:Holding {name: $holding_name})
MERGE (c)-[:BELONGS_TO]->(h)";

const LINK_BRAND: &str = "\
MERGE (c:Company {name: $company_name})
MERGE (b:Brand {name: $brand_name})
SET b.cnpjs = $cnpjs
MERGE (c)-[:OPERATES_AS]->(b)";

const LINK_PRODUCT_CATEGORY: &str = "\
MERGE (c:Company {name: $company_name})
MERGE (p:ProductCategory {name: $product})
MERGE (c)-[:OFFERS]->(p)";

const LINK_INVESTOR: &str = "\
MERGE (c:Company {name: $company_name})
MERGE (i:Investor {name: $investor_name})
MERGE (i)-[:INVESTS_IN]->(c)";

const PRUNE_SIMILAR_BY_CATEGORY: &str = "\
MATCH (c1:Company)-[r:SIMILAR_TO {basis: $basis}]->(c2:Company)
WHERE elementId(c1) >= elementId(c2)
   OR NOT EXISTS { MATCH (c1)-[:OFFERS]->(:ProductCategory)<-[:OFFERS]-(c2) }
DELETE r";

const PRUNE_SIMILAR_BY_SECTOR: &str = "\
MATCH (c1:Company)-[r:SIMILAR_TO {basis: $basis}]->(c2:Company)
WHERE elementId(c1) >= elementId(c2)
   OR c1.sector IS NULL
   OR c2.sector IS NULL
   OR c1.sector <> c2.sector
DELETE r";

const DERIVE_SIMILAR_BY_CATEGORY: &str = "\
MATCH (c1:Company)-[:OFFERS]->(p:ProductCategory)<-[:OFFERS]-(c2:Company)
WHERE elementId(c1) < elementId(c2)
WITH c1, c2, p.name AS category
ORDER BY category
WITH c1, c2, collect(DISTINCT category) AS shared
MERGE (c1)-[r:SIMILAR_TO {basis: $basis}]->(c2)
SET r.shared_categories = shared";

const DERIVE_SIMILAR_BY_SECTOR: &str = "\
MATCH (c1:Company), (c2:Company)
WHERE c1.sector IS NOT NULL
  AND c1.sector = c2.sector
  AND elementId(c1) < elementId(c2)
MERGE (c1)-[:SIMILAR_TO {basis: $basis}]->(c2)";

/// Scalar and list properties written onto a Company node.
///
/// Every field is written on each upsert; `None` clears the stored value.
#[derive(Debug, Clone, PartialEq)]
pub struct CompanyProperties {
    pub name: String,
    pub revenue: Option<f64>,
    pub sector: Option<String>,
    pub website: Option<String>,
    pub linkedin: Option<String>,
    pub cnpjs: Vec<String>,
    pub addresses: Vec<String>,
    pub description: Option<String>,
}

impl From<&Company> for CompanyProperties {
    fn from(company: &Company) -> Self {
        CompanyProperties {
            name: company.name.clone(),
            revenue: company.revenue,
            sector: company.sector.clone(),
            website: company.website.clone(),
            linkedin: company.linkedin.clone(),
            cnpjs: company.cnpjs.clone(),
            addresses: company.addresses.clone(),
            description: company.description.clone(),
        }
    }
}

/// A relation edge from a Company to a node of an allow-listed label
#[derive(Debug, Clone, PartialEq)]
pub struct RelationEdge {
    pub source: String,
    pub target: String,
    pub relation_type: RelationType,
    pub label: NodeLabel,
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    UpsertCompany(CompanyProperties),
    LinkHolding { company: String, holding: String },
    LinkBrand { company: String, brand: String, cnpjs: Vec<String> },
    LinkProductCategory { company: String, category: String },
    LinkInvestor { company: String, investor: String },
    LinkRelation(RelationEdge),
    /// Delete `SIMILAR_TO` edges of a basis whose condition no longer holds
    PruneSimilar(SimilarityBasis),
    /// Merge `SIMILAR_TO` edges of a basis over the whole company set
    DeriveSimilar(SimilarityBasis),
}

impl Statement {
    /// Short name for logs
    pub fn kind(&self) -> &'static str {
        match self {
            Statement::UpsertCompany(_) => "upsert_company",
            Statement::LinkHolding { .. } => "link_holding",
            Statement::LinkBrand { .. } => "link_brand",
            Statement::LinkProductCategory { .. } => "link_product_category",
            Statement::LinkInvestor { .. } => "link_investor",
            Statement::LinkRelation(_) => "link_relation",
            Statement::PruneSimilar(_) => "prune_similar",
            Statement::DeriveSimilar(_) => "derive_similar",
        }
    }

    pub fn template(&self) -> Cow<'static, str> {
        match self {
            Statement::UpsertCompany(_) => Cow::Borrowed(UPSERT_COMPANY),
            Statement::LinkHolding { .. } => Cow::Borrowed(LINK_HOLDING),
            Statement::LinkBrand { .. } => Cow::Borrowed(LINK_BRAND),
            Statement::LinkProductCategory { .. } => Cow::Borrowed(LINK_PRODUCT_CATEGORY),
            Statement::LinkInvestor { .. } => Cow::Borrowed(LINK_INVESTOR),
            Statement::LinkRelation(edge) => Cow::Owned(format!(
                "MERGE (c:Company {{name: $company_name}})\n\
                 MERGE (t:`{label}` {{name: $target_name}})\n\
                 MERGE (c)-[r:{relation}]->(t)\n\
                 SET r.confidence = $confidence",
                label = edge.label.as_str(),
                relation = edge.relation_type.quoted(),
            )),
            Statement::PruneSimilar(SimilarityBasis::ProductCategory) => {
                Cow::Borrowed(PRUNE_SIMILAR_BY_CATEGORY)
            }
            Statement::PruneSimilar(SimilarityBasis::Sector) => Cow::Borrowed(PRUNE_SIMILAR_BY_SECTOR),
            Statement::DeriveSimilar(SimilarityBasis::ProductCategory) => {
                Cow::Borrowed(DERIVE_SIMILAR_BY_CATEGORY)
            }
            Statement::DeriveSimilar(SimilarityBasis::Sector) => {
                Cow::Borrowed(DERIVE_SIMILAR_BY_SECTOR)
            }
        }
    }

    pub fn parameters(&self) -> PropertyMap {
        let mut params = PropertyMap::new();
        let mut bind = |key: &str, value: PropertyValue| {
            params.insert(key.to_string(), value);
        };

        match self {
            Statement::UpsertCompany(props) => {
                bind("name", props.name.as_str().into());
                bind("revenue", props.revenue.into());
                bind("sector", props.sector.clone().into());
                bind("website", props.website.clone().into());
                bind("linkedin", props.linkedin.clone().into());
                bind("cnpjs", props.cnpjs.as_slice().into());
                bind("addresses", props.addresses.as_slice().into());
                bind("description", props.description.clone().into());
            }
            Statement::LinkHolding { company, holding } => {
                bind("company_name", company.as_str().into());
                bind("holding_name", holding.as_str().into());
            }
            Statement::LinkBrand { company, brand, cnpjs } => {
                bind("company_name", company.as_str().into());
                bind("brand_name", brand.as_str().into());
                bind("cnpjs", cnpjs.as_slice().into());
            }
            Statement::LinkProductCategory { company, category } => {
                bind("company_name", company.as_str().into());
                bind("product", category.as_str().into());
            }
            Statement::LinkInvestor { company, investor } => {
                bind("company_name", company.as_str().into());
                bind("investor_name", investor.as_str().into());
            }
            Statement::LinkRelation(edge) => {
                bind("company_name", edge.source.as_str().into());
                bind("target_name", edge.target.as_str().into());
                bind("confidence", edge.confidence.into());
            }
            Statement::PruneSimilar(basis) | Statement::DeriveSimilar(basis) => {
                bind("basis", basis.as_str().into());
            }
        }
        params
    }

    /// Natural keys this statement merges on, with their labels; all must
    /// be non-empty
    pub fn natural_keys(&self) -> Vec<(NodeLabel, &str)> {
        match self {
            Statement::UpsertCompany(props) => vec![(NodeLabel::Company, props.name.as_str())],
            Statement::LinkHolding { company, holding } => {
                vec![(NodeLabel::Company, company.as_str()), (NodeLabel::Holding, holding.as_str())]
            }
            Statement::LinkBrand { company, brand, .. } => {
                vec![(NodeLabel::Company, company.as_str()), (NodeLabel::Brand, brand.as_str())]
            }
            Statement::LinkProductCategory { company, category } => {
                vec![(NodeLabel::Company, company.as_str()), (NodeLabel::ProductCategory, category.as_str())]
            }
            Statement::LinkInvestor { company, investor } => {
                vec![(NodeLabel::Company, company.as_str()), (NodeLabel::Investor, investor.as_str())]
            }
            Statement::LinkRelation(edge) => {
                vec![(NodeLabel::Company, edge.source.as_str()), (edge.label, edge.target.as_str())]
            }
            Statement::PruneSimilar(_) | Statement::DeriveSimilar(_) => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn placeholders(template: &str) -> Vec<String> {
        let mut names: Vec<String> = template
            .split('$')
            .skip(1)
            .map(|rest| {
                rest.chars()
                    .take_while(|c| c.is_alphanumeric() || *c == '_')
                    .collect()
            })
            .collect();
        names.sort();
        names.dedup();
        names
    }

    fn assert_parameters_cover_template(statement: &Statement) {
        let mut bound: Vec<String> = statement.parameters().into_keys().collect();
        bound.sort();
        assert_eq!(placeholders(&statement.template()), bound, "{}", statement.kind());
    }

    fn relation(relation_type: &str, label: NodeLabel) -> RelationEdge {
        RelationEdge {
            source: "StoneCo".to_string(),
            target: "Linx".to_string(),
            relation_type: RelationType::parse(relation_type).unwrap(),
            label,
            confidence: 0.9,
        }
    }

    #[test]
    fn test_parameters_match_placeholders() {
        let company = Company::new("StoneCo").with_sector("Fintech");
        let statements = vec![
            Statement::UpsertCompany(CompanyProperties::from(&company)),
            Statement::LinkHolding { company: "A".into(), holding: "H".into() },
            Statement::LinkBrand { company: "A".into(), brand: "B".into(), cnpjs: vec![] },
            Statement::LinkProductCategory { company: "A".into(), category: "pix".into() },
            Statement::LinkInvestor { company: "A".into(), investor: "I".into() },
            Statement::LinkRelation(relation("partners with", NodeLabel::Company)),
            Statement::PruneSimilar(SimilarityBasis::ProductCategory),
            Statement::PruneSimilar(SimilarityBasis::Sector),
            Statement::DeriveSimilar(SimilarityBasis::ProductCategory),
            Statement::DeriveSimilar(SimilarityBasis::Sector),
        ];
        for statement in &statements {
            assert_parameters_cover_template(statement);
        }
    }

    #[test]
    fn test_company_values_never_in_template() {
        let mut company = Company::new("Evil}) DETACH DELETE (n");
        company.sector = Some("' OR 1=1".to_string());
        let statement = Statement::UpsertCompany(CompanyProperties::from(&company));

        assert!(!statement.template().contains("Evil"));
        assert_eq!(
            statement.parameters().get("name").and_then(PropertyValue::as_string),
            Some("Evil}) DETACH DELETE (n")
        );
    }

    #[test]
    fn test_relation_template_quotes_identifiers() {
        let statement = Statement::LinkRelation(relation("partners with", NodeLabel::Holding));
        let template = statement.template();
        assert!(template.contains("MERGE (t:`Holding` {name: $target_name})"));
        assert!(template.contains("-[r:`PARTNERS WITH`]->"));
        assert!(!template.contains("Linx"));
    }

    #[test]
    fn test_missing_optionals_bind_null() {
        let statement = Statement::UpsertCompany(CompanyProperties::from(&Company::new("Solo")));
        let params = statement.parameters();
        assert!(params["revenue"].is_null());
        assert!(params["sector"].is_null());
        assert_eq!(params["cnpjs"], PropertyValue::Array(vec![]));
    }

    #[test]
    fn test_natural_keys() {
        let statement = Statement::LinkBrand {
            company: "A".into(),
            brand: "".into(),
            cnpjs: vec![],
        };
        assert_eq!(
            statement.natural_keys(),
            vec![(NodeLabel::Company, "A"), (NodeLabel::Brand, "")]
        );
        assert!(Statement::DeriveSimilar(SimilarityBasis::Sector).natural_keys().is_empty());
    }
}
