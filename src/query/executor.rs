//! QueryExecutor trait: the seam between the builder and a graph store

use async_trait::async_trait;
use std::slice;

use super::statement::Statement;
use crate::error::ExecutionResult;

/// Runs write statements against a graph store.
///
/// Implemented by:
/// - `EmbeddedExecutor`: in-process `GraphStore`, no network (tests, embedded use)
/// - `HttpExecutor`: a Neo4j-compatible server over the HTTP transaction API
/// - `RetryingExecutor`: wraps another executor and retries transient failures
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    /// Run all statements in one transaction: either every statement applies
    /// or none does.
    async fn run_in_transaction(&self, statements: &[Statement]) -> ExecutionResult<()>;

    /// Run a single statement in its own transaction
    async fn run(&self, statement: &Statement) -> ExecutionResult<()> {
        self.run_in_transaction(slice::from_ref(statement)).await
    }
}
