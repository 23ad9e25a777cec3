//! Error types for the executor, builder and configuration layers

use thiserror::Error;

use crate::graph::GraphError;
use crate::query::IdentifierError;
use crate::schema::SimilarityBasis;

/// Errors raised while executing statements against a graph store
#[derive(Error, Debug)]
pub enum ExecutionError {
    /// Embedded store rejected a statement
    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),

    /// The remote store reported a statement failure
    #[error("Store error {code}: {message}")]
    Store { code: String, message: String },

    /// Non-success HTTP status from the remote store
    #[error("HTTP status {status}: {body}")]
    HttpStatus { status: u16, body: String },

    /// Connection-level failure (remote mode)
    #[error("Connection error: {0}")]
    Connection(String),

    /// HTTP transport error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ExecutionError {
    /// Whether retrying the same transaction may succeed
    pub fn is_transient(&self) -> bool {
        match self {
            ExecutionError::Store { code, .. } => code.starts_with("Neo.TransientError"),
            ExecutionError::HttpStatus { status, .. } => *status == 429 || *status >= 500,
            ExecutionError::Connection(_) => true,
            ExecutionError::Http(e) => e.is_timeout() || e.is_connect(),
            ExecutionError::Graph(_) | ExecutionError::Serialization(_) => false,
        }
    }
}

pub type ExecutionResult<T> = Result<T, ExecutionError>;

/// Errors raised by the graph builder
#[derive(Error, Debug)]
pub enum BuildError {
    /// The record cannot be written at all (e.g. empty natural key)
    #[error("Invalid entity '{name}': {reason}")]
    InvalidEntity { name: String, reason: String },

    /// A relation carried an unsafe type or label under the strict policy
    #[error("Relation rejected for '{company}': {source}")]
    RejectedRelation {
        company: String,
        #[source]
        source: IdentifierError,
    },

    /// A company failed under the fail-fast policy; aborts the batch
    #[error("Upsert of '{name}' failed: {source}")]
    Entity {
        name: String,
        #[source]
        source: Box<BuildError>,
    },

    #[error("Similarity derivation ({basis}) failed: {source}")]
    Derivation {
        basis: SimilarityBasis,
        #[source]
        source: ExecutionError,
    },

    #[error(transparent)]
    Execution(#[from] ExecutionError),

    #[error(transparent)]
    Identifier(#[from] IdentifierError),
}

pub type BuildResult<T> = Result<T, BuildError>;

/// Errors raised while loading configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Invalid value for {key}: '{value}'")]
    InvalidValue { key: String, value: String },
}

pub type ConfigResult<T> = Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        let transient = ExecutionError::Store {
            code: "Neo.TransientError.Transaction.DeadlockDetected".to_string(),
            message: "deadlock".to_string(),
        };
        assert!(transient.is_transient());

        let constraint = ExecutionError::Store {
            code: "Neo.ClientError.Schema.ConstraintValidationFailed".to_string(),
            message: "exists".to_string(),
        };
        assert!(!constraint.is_transient());

        assert!(ExecutionError::HttpStatus { status: 503, body: String::new() }.is_transient());
        assert!(ExecutionError::HttpStatus { status: 429, body: String::new() }.is_transient());
        assert!(!ExecutionError::HttpStatus { status: 401, body: String::new() }.is_transient());
        assert!(!ExecutionError::Graph(GraphError::EmptyKey("Company".into())).is_transient());
    }

    #[test]
    fn test_entity_error_message() {
        let err = BuildError::Entity {
            name: "Acme".to_string(),
            source: Box::new(BuildError::InvalidEntity {
                name: "Acme".to_string(),
                reason: "boom".to_string(),
            }),
        };
        assert_eq!(err.to_string(), "Upsert of 'Acme' failed: Invalid entity 'Acme': boom");
    }
}
