//! Persisted graph vocabulary: node labels, edge types and property names

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const OPERATES_AS: &str = "OPERATES_AS";
pub const BELONGS_TO: &str = "BELONGS_TO";
pub const OFFERS: &str = "OFFERS";
pub const SIMILAR_TO: &str = "SIMILAR_TO";
pub const INVESTS_IN: &str = "INVESTS_IN";
/// Edge type used when a relation does not name one
pub const RELATED_TO: &str = "RELATED_TO";

/// Edge types the engine writes itself; metadata relations may not use them
pub const RESERVED_EDGE_TYPES: [&str; 5] =
    [OPERATES_AS, BELONGS_TO, OFFERS, SIMILAR_TO, INVESTS_IN];

pub const NAME: &str = "name";
pub const BASIS: &str = "basis";
pub const SHARED_CATEGORIES: &str = "shared_categories";
pub const CONFIDENCE: &str = "confidence";
pub const SECTOR: &str = "sector";

/// The closed set of node labels the engine will ever write.
///
/// Relation targets coming from entity metadata are resolved against this set;
/// anything else is rejected before a statement is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeLabel {
    Company,
    Brand,
    Holding,
    ProductCategory,
    Investor,
    Person,
}

impl NodeLabel {
    pub const ALL: [NodeLabel; 6] = [
        NodeLabel::Company,
        NodeLabel::Brand,
        NodeLabel::Holding,
        NodeLabel::ProductCategory,
        NodeLabel::Investor,
        NodeLabel::Person,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            NodeLabel::Company => "Company",
            NodeLabel::Brand => "Brand",
            NodeLabel::Holding => "Holding",
            NodeLabel::ProductCategory => "ProductCategory",
            NodeLabel::Investor => "Investor",
            NodeLabel::Person => "Person",
        }
    }
}

impl fmt::Display for NodeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Case-insensitive; `product_category` and `product category` are accepted
/// for `ProductCategory`.
impl FromStr for NodeLabel {
    type Err = UnknownLabel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let folded: String = s
            .trim()
            .chars()
            .filter(|c| *c != '_' && *c != ' ')
            .flat_map(char::to_lowercase)
            .collect();
        NodeLabel::ALL
            .into_iter()
            .find(|label| label.as_str().to_lowercase() == folded)
            .ok_or_else(|| UnknownLabel(s.to_string()))
    }
}

impl From<NodeLabel> for crate::graph::Label {
    fn from(label: NodeLabel) -> Self {
        crate::graph::Label::new(label.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown node label '{0}'")]
pub struct UnknownLabel(pub String);

/// Why two companies are marked `SIMILAR_TO`.
///
/// Edges with different bases between the same pair are kept apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimilarityBasis {
    ProductCategory,
    Sector,
}

impl SimilarityBasis {
    pub const ALL: [SimilarityBasis; 2] = [SimilarityBasis::ProductCategory, SimilarityBasis::Sector];

    pub fn as_str(&self) -> &'static str {
        match self {
            SimilarityBasis::ProductCategory => "product_category",
            SimilarityBasis::Sector => "sector",
        }
    }
}

impl fmt::Display for SimilarityBasis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_parsing() {
        assert_eq!("Company".parse::<NodeLabel>(), Ok(NodeLabel::Company));
        assert_eq!("holding".parse::<NodeLabel>(), Ok(NodeLabel::Holding));
        assert_eq!("product_category".parse::<NodeLabel>(), Ok(NodeLabel::ProductCategory));
        assert_eq!(" INVESTOR ".parse::<NodeLabel>(), Ok(NodeLabel::Investor));
    }

    #[test]
    fn test_unknown_label_rejected() {
        assert!("Company) DETACH DELETE (n".parse::<NodeLabel>().is_err());
        assert!("".parse::<NodeLabel>().is_err());
        assert!("Planet".parse::<NodeLabel>().is_err());
    }

    #[test]
    fn test_basis_names() {
        assert_eq!(SimilarityBasis::ProductCategory.to_string(), "product_category");
        assert_eq!(SimilarityBasis::Sector.as_str(), "sector");
    }
}
