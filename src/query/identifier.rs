//! Validated identifiers that end up in structural query positions
//!
//! Relation types come from untrusted entity metadata and are spliced into
//! query text as edge types, so they are normalized and checked against a
//! restricted alphabet before any statement is built.

use crate::schema::{self, UnknownLabel};
use rustc_hash::FxHashSet;
use std::fmt;
use thiserror::Error;

/// Upper bound on relation type length, in characters
pub const MAX_RELATION_TYPE_LEN: usize = 64;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum IdentifierError {
    #[error("Relation type is empty")]
    Empty,

    #[error("Relation type '{0}' exceeds {max} characters", max = MAX_RELATION_TYPE_LEN)]
    TooLong(String),

    #[error("Relation type '{value}' contains disallowed character {ch:?}")]
    DisallowedChar { value: String, ch: char },

    #[error("Relation type '{0}' must start with a letter")]
    LeadingNonLetter(String),

    #[error("Relation type '{0}' is not in the configured allow-list")]
    NotAllowed(String),

    #[error("Relation type '{0}' is reserved for edges the engine derives")]
    Reserved(String),

    #[error(transparent)]
    UnknownLabel(#[from] UnknownLabel),
}

/// An edge type that is safe to render as a quoted query identifier.
///
/// Normalized to upper case; only alphanumerics, `_` and spaces survive.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RelationType(String);

impl RelationType {
    /// Normalize and validate a raw relation type
    pub fn parse(raw: &str) -> Result<Self, IdentifierError> {
        let normalized = raw.trim().to_uppercase();
        if normalized.is_empty() {
            return Err(IdentifierError::Empty);
        }
        if normalized.chars().count() > MAX_RELATION_TYPE_LEN {
            return Err(IdentifierError::TooLong(normalized));
        }
        if let Some(ch) = normalized
            .chars()
            .find(|c| !(c.is_alphanumeric() || *c == '_' || *c == ' '))
        {
            return Err(IdentifierError::DisallowedChar { value: normalized, ch });
        }
        if !normalized.starts_with(char::is_alphabetic) {
            return Err(IdentifierError::LeadingNonLetter(normalized));
        }
        Ok(RelationType(normalized))
    }

    /// Whether this is one of the structural edge types the engine owns
    pub fn is_reserved(&self) -> bool {
        schema::RESERVED_EDGE_TYPES.contains(&self.0.as_str())
    }

    pub fn related_to() -> Self {
        RelationType(schema::RELATED_TO.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Backtick-quoted form for query text
    pub fn quoted(&self) -> String {
        format!("`{}`", self.0)
    }
}

impl fmt::Display for RelationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&RelationType> for crate::graph::EdgeType {
    fn from(relation_type: &RelationType) -> Self {
        crate::graph::EdgeType::new(relation_type.as_str())
    }
}

/// Optional allow-list narrowing which relation types may be written.
///
/// An empty list admits every type that passes `RelationType::parse`.
#[derive(Debug, Clone, Default)]
pub struct RelationRules {
    allowed: Option<FxHashSet<RelationType>>,
}

impl RelationRules {
    pub fn permissive() -> Self {
        RelationRules::default()
    }

    pub fn from_allow_list<I, S>(types: I) -> Result<Self, IdentifierError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let allowed = types
            .into_iter()
            .map(|raw| unreserved(RelationType::parse(raw.as_ref())?))
            .collect::<Result<FxHashSet<_>, _>>()?;

        if allowed.is_empty() {
            return Ok(RelationRules::permissive());
        }
        Ok(RelationRules {
            allowed: Some(allowed),
        })
    }

    /// Parse `raw` (or fall back to `RELATED_TO`) and check it against the list
    pub fn resolve(&self, raw: Option<&str>) -> Result<RelationType, IdentifierError> {
        let relation_type = match raw {
            Some(raw) if !raw.trim().is_empty() => unreserved(RelationType::parse(raw)?)?,
            _ => RelationType::related_to(),
        };
        match &self.allowed {
            Some(allowed) if !allowed.contains(&relation_type) => {
                Err(IdentifierError::NotAllowed(relation_type.0))
            }
            _ => Ok(relation_type),
        }
    }
}

fn unreserved(relation_type: RelationType) -> Result<RelationType, IdentifierError> {
    if relation_type.is_reserved() {
        return Err(IdentifierError::Reserved(relation_type.0));
    }
    Ok(relation_type)
}
