//! Configuration for the store connection, the builder and retries
//!
//! Layering, lowest to highest priority: defaults, YAML file, environment
//! (`NEO4J_URI`, `NEO4J_USER`, `NEO4J_PASSWORD`, `NEO4J_DATABASE`,
//! `ORGGRAPH_FAIL_FAST`), then whatever the caller sets explicitly.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::time::Duration;

use crate::error::{ConfigError, ConfigResult};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub store: StoreConfig,
    pub builder: BuilderConfig,
    pub retry: RetryConfig,
}

impl Config {
    /// Defaults overlaid with the process environment
    pub fn from_env() -> ConfigResult<Self> {
        let mut config = Config::default();
        config.apply_env_overrides()?;
        Ok(config)
    }

    pub fn apply_env_overrides(&mut self) -> ConfigResult<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    pub fn from_yaml_str(yaml: &str) -> ConfigResult<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml_str(&text)
    }

    /// Overlay values from a key lookup (normally the environment)
    pub fn apply_overrides<F>(&mut self, lookup: F) -> ConfigResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(uri) = lookup("NEO4J_URI") {
            self.store.uri = uri;
        }
        if let Some(user) = lookup("NEO4J_USER") {
            self.store.user = user;
        }
        if let Some(password) = lookup("NEO4J_PASSWORD") {
            self.store.password = password;
        }
        if let Some(database) = lookup("NEO4J_DATABASE") {
            self.store.database = database;
        }
        if let Some(value) = lookup("ORGGRAPH_FAIL_FAST") {
            let fail_fast = match value.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => true,
                "0" | "false" | "no" | "" => false,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        key: "ORGGRAPH_FAIL_FAST".to_string(),
                        value,
                    })
                }
            };
            self.builder.failure_policy = if fail_fast {
                FailurePolicy::FailFast
            } else {
                FailurePolicy::Continue
            };
        }
        Ok(())
    }
}

/// Connection settings for the remote graph store
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// HTTP base URI, e.g. `http://localhost:7474`
    pub uri: String,
    pub user: String,
    pub password: String,
    pub database: String,
    pub request_timeout_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            uri: "http://localhost:7474".to_string(),
            user: "neo4j".to_string(),
            password: "password".to_string(),
            database: "neo4j".to_string(),
            request_timeout_secs: 30,
        }
    }
}

impl fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreConfig")
            .field("uri", &self.uri)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("database", &self.database)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

/// What to do when one company's transaction fails
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Record the failure, keep going, still derive similarity
    #[default]
    Continue,
    /// Abort the batch on the first failure
    FailFast,
}

/// What to do with a relation whose type or label fails validation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationPolicy {
    /// Drop the relation, report it, write the rest of the company
    #[default]
    Drop,
    /// Fail the whole company
    Reject,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuilderConfig {
    pub failure_policy: FailurePolicy,
    pub relation_policy: RelationPolicy,
    /// Relation types that may be written; empty admits any valid type
    pub allowed_relation_types: Vec<String>,
    pub derive_similarity: bool,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            failure_policy: FailurePolicy::Continue,
            relation_policy: RelationPolicy::Drop,
            allowed_relation_types: Vec::new(),
            derive_similarity: true,
        }
    }
}

/// Retry configuration for transient store errors
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts, including the first
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 100,
            max_delay_ms: 5_000,
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    /// Delay to wait after the given failed attempt (1-based)
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let delay_ms = self.base_delay_ms as f64 * self.backoff_multiplier.powi(exponent);
        Duration::from_millis(delay_ms.min(self.max_delay_ms as f64) as u64)
    }
}
