//! Relation and investor extraction from company metadata

use serde_json::Value;

use crate::model::Company;
use crate::query::{IdentifierError, RelationEdge, RelationRules, RelationType};
use crate::schema::NodeLabel;

/// One entry of `meta["relations"]` as it arrives from enrichment
#[derive(Debug, Clone, PartialEq)]
pub enum RelationEntry {
    /// Bare string: a `RELATED_TO` edge to the company of that name
    SimpleTarget(String),
    /// Mapping with `target` and optional `type`, `label`, `confidence`
    TypedRelation {
        target: String,
        relation_type: Option<String>,
        label: Option<String>,
        confidence: Option<f64>,
    },
}

impl RelationEntry {
    /// Classify a raw metadata value. Returns `None` for any other shape,
    /// for an empty target, or for a confidence outside `[0, 1]`.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(target) => {
                let target = target.trim();
                (!target.is_empty()).then(|| RelationEntry::SimpleTarget(target.to_string()))
            }
            Value::Object(map) => {
                let target = map.get("target")?.as_str()?.trim();
                if target.is_empty() {
                    return None;
                }
                let relation_type = optional_str(map.get("type"))?;
                let label = optional_str(map.get("label"))?;
                let confidence = match map.get("confidence") {
                    None | Some(Value::Null) => None,
                    Some(value) => Some(value.as_f64().filter(|c| is_valid_confidence(*c))?),
                };
                Some(RelationEntry::TypedRelation {
                    target: target.to_string(),
                    relation_type,
                    label,
                    confidence,
                })
            }
            _ => None,
        }
    }

    pub fn target(&self) -> &str {
        match self {
            RelationEntry::SimpleTarget(target) => target,
            RelationEntry::TypedRelation { target, .. } => target,
        }
    }

    /// Validate the untrusted type and label against the closed vocabulary
    pub fn resolve(self, rules: &RelationRules) -> Result<RelationSpec, IdentifierError> {
        match self {
            RelationEntry::SimpleTarget(target) => Ok(RelationSpec {
                target,
                relation_type: rules.resolve(None)?,
                label: NodeLabel::Company,
                confidence: 1.0,
            }),
            RelationEntry::TypedRelation {
                target,
                relation_type,
                label,
                confidence,
            } => Ok(RelationSpec {
                target,
                relation_type: rules.resolve(relation_type.as_deref())?,
                label: resolve_label(label.as_deref())?,
                confidence: confidence.unwrap_or(1.0),
            }),
        }
    }
}

/// `Some(None)` for missing/null, `Some(Some(s))` for a string, `None` for
/// anything else
fn optional_str(value: Option<&Value>) -> Option<Option<String>> {
    match value {
        None | Some(Value::Null) => Some(None),
        Some(Value::String(s)) => Some(Some(s.clone())),
        Some(_) => None,
    }
}

pub(crate) fn is_valid_confidence(confidence: f64) -> bool {
    (0.0..=1.0).contains(&confidence)
}

/// Blank or missing labels default to `Company`
pub(crate) fn resolve_label(raw: Option<&str>) -> Result<NodeLabel, IdentifierError> {
    match raw {
        Some(raw) if !raw.trim().is_empty() => Ok(raw.parse::<NodeLabel>()?),
        _ => Ok(NodeLabel::Company),
    }
}

/// A relation whose type and label passed validation
#[derive(Debug, Clone, PartialEq)]
pub struct RelationSpec {
    pub target: String,
    pub relation_type: RelationType,
    pub label: NodeLabel,
    pub confidence: f64,
}

impl RelationSpec {
    pub fn into_edge(self, source: &str) -> RelationEdge {
        RelationEdge {
            source: source.to_string(),
            target: self.target,
            relation_type: self.relation_type,
            label: self.label,
            confidence: self.confidence,
        }
    }
}

/// A relation dropped because its type or label failed validation
#[derive(Debug, Clone, PartialEq)]
pub struct RejectedRelation {
    pub company: String,
    pub target: String,
    pub error: IdentifierError,
}

#[derive(Debug, Default)]
pub struct ExtractedRelations {
    pub relations: Vec<RelationSpec>,
    /// Malformed entries: wrong shape, missing target, bad confidence
    pub skipped: usize,
    pub rejected: Vec<RejectedRelation>,
}

/// Classify and validate every entry of `meta["relations"]`
pub fn extract_relations(company: &Company, rules: &RelationRules) -> ExtractedRelations {
    let mut extracted = ExtractedRelations::default();
    for value in company.relation_entries() {
        let Some(entry) = RelationEntry::from_value(value) else {
            extracted.skipped += 1;
            continue;
        };
        let target = entry.target().to_string();
        match entry.resolve(rules) {
            Ok(spec) => extracted.relations.push(spec),
            Err(error) => extracted.rejected.push(RejectedRelation {
                company: company.name.clone(),
                target,
                error,
            }),
        }
    }
    extracted
}

/// Investor names from `meta["investors"]`, plus the count of dropped
/// entries (non-strings or blanks)
pub fn extract_investors(company: &Company) -> (Vec<String>, usize) {
    let mut investors = Vec::new();
    let mut skipped = 0;
    for value in company.investor_entries() {
        match value.as_str().map(str::trim) {
            Some(name) if !name.is_empty() => investors.push(name.to_string()),
            _ => skipped += 1,
        }
    }
    (investors, skipped)
}
