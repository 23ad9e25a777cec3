//! Retry with exponential backoff for transient store failures

use async_trait::async_trait;
use tracing::{debug, error, info, warn};

use super::executor::QueryExecutor;
use super::statement::Statement;
use crate::config::RetryConfig;
use crate::error::ExecutionResult;

/// Wraps an executor and re-runs a failed transaction while the error is
/// transient, up to `max_attempts` attempts in total.
///
/// Transactions are idempotent merges, so re-running one that may or may not
/// have committed is safe.
pub struct RetryingExecutor<E> {
    inner: E,
    config: RetryConfig,
}

impl<E: QueryExecutor> RetryingExecutor<E> {
    pub fn new(inner: E, config: RetryConfig) -> Self {
        Self { inner, config }
    }

    pub fn inner(&self) -> &E {
        &self.inner
    }
}

#[async_trait]
impl<E: QueryExecutor> QueryExecutor for RetryingExecutor<E> {
    async fn run_in_transaction(&self, statements: &[Statement]) -> ExecutionResult<()> {
        let max_attempts = self.config.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            debug!("Transaction attempt {} of {}", attempt, max_attempts);

            let error = match self.inner.run_in_transaction(statements).await {
                Ok(()) => {
                    if attempt > 1 {
                        info!("Transaction succeeded on attempt {}", attempt);
                    }
                    return Ok(());
                }
                Err(error) => error,
            };

            if !error.is_transient() {
                return Err(error);
            }
            if attempt >= max_attempts {
                error!("All {} transaction attempts failed: {}", max_attempts, error);
                return Err(error);
            }

            let delay = self.config.delay_after(attempt);
            warn!(
                "Attempt {} failed with transient error, retrying in {:?}: {}",
                attempt, delay, error
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExecutionError;
    use crate::schema::SimilarityBasis;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Fails the first `failures` calls with the error built by `make_error`
    struct FlakyExecutor {
        failures: u32,
        calls: AtomicU32,
        make_error: fn() -> ExecutionError,
    }

    impl FlakyExecutor {
        fn new(failures: u32, make_error: fn() -> ExecutionError) -> Self {
            Self {
                failures,
                calls: AtomicU32::new(0),
                make_error,
            }
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl QueryExecutor for FlakyExecutor {
        async fn run_in_transaction(&self, _statements: &[Statement]) -> ExecutionResult<()> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if call <= self.failures {
                Err((self.make_error)())
            } else {
                Ok(())
            }
        }
    }

    fn deadlock() -> ExecutionError {
        ExecutionError::Store {
            code: "Neo.TransientError.Transaction.DeadlockDetected".to_string(),
            message: "deadlock".to_string(),
        }
    }

    fn syntax_error() -> ExecutionError {
        ExecutionError::Store {
            code: "Neo.ClientError.Statement.SyntaxError".to_string(),
            message: "bad".to_string(),
        }
    }

    fn fast_config() -> RetryConfig {
        RetryConfig {
            max_attempts: 3,
            base_delay_ms: 1,
            max_delay_ms: 5,
            backoff_multiplier: 2.0,
        }
    }

    fn statement() -> Statement {
        Statement::DeriveSimilar(SimilarityBasis::Sector)
    }

    #[tokio::test]
    async fn test_transient_error_is_retried() {
        let executor = RetryingExecutor::new(FlakyExecutor::new(2, deadlock), fast_config());
        executor.run(&statement()).await.unwrap();
        assert_eq!(executor.inner().calls(), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let executor = RetryingExecutor::new(FlakyExecutor::new(10, deadlock), fast_config());
        let err = executor.run(&statement()).await.unwrap_err();
        assert!(err.is_transient());
        assert_eq!(executor.inner().calls(), 3);
    }

    #[tokio::test]
    async fn test_permanent_error_is_not_retried() {
        let executor = RetryingExecutor::new(FlakyExecutor::new(1, syntax_error), fast_config());
        let err = executor.run(&statement()).await.unwrap_err();
        assert!(matches!(err, ExecutionError::Store { .. }));
        assert_eq!(executor.inner().calls(), 1);
    }
}
