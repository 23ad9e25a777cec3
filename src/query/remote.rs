//! HttpExecutor: Neo4j-compatible server over the HTTP transaction API
//!
//! Each call to `run_in_transaction` posts every statement to
//! `{uri}/db/{database}/tx/commit`, which runs them in a single transaction
//! and rolls it back if any statement fails.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

use super::executor::QueryExecutor;
use super::statement::Statement;
use crate::config::StoreConfig;
use crate::error::{ExecutionError, ExecutionResult};

/// Network executor for a running graph server.
pub struct HttpExecutor {
    commit_url: String,
    user: String,
    password: String,
    http_client: Client,
}

#[derive(Debug, Deserialize)]
struct CommitResponse {
    #[serde(default)]
    errors: Vec<StoreFailure>,
}

#[derive(Debug, Deserialize)]
struct StoreFailure {
    code: String,
    message: String,
}

impl HttpExecutor {
    pub fn new(config: &StoreConfig) -> ExecutionResult<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self {
            commit_url: commit_url(&config.uri, &config.database),
            user: config.user.clone(),
            password: config.password.clone(),
            http_client,
        })
    }

    pub fn commit_url(&self) -> &str {
        &self.commit_url
    }
}

fn commit_url(uri: &str, database: &str) -> String {
    format!("{}/db/{}/tx/commit", uri.trim_end_matches('/'), database)
}

/// Request body for one transaction
fn transaction_body(statements: &[Statement]) -> Value {
    let statements: Vec<Value> = statements
        .iter()
        .map(|statement| {
            let parameters: serde_json::Map<String, Value> = statement
                .parameters()
                .iter()
                .map(|(key, value)| (key.clone(), value.to_json()))
                .collect();
            json!({
                "statement": statement.template(),
                "parameters": parameters,
            })
        })
        .collect();
    json!({ "statements": statements })
}

#[async_trait]
impl QueryExecutor for HttpExecutor {
    async fn run_in_transaction(&self, statements: &[Statement]) -> ExecutionResult<()> {
        if statements.is_empty() {
            return Ok(());
        }

        debug!("Posting {} statements to {}", statements.len(), self.commit_url);
        let response = self
            .http_client
            .post(&self.commit_url)
            .basic_auth(&self.user, Some(&self.password))
            .json(&transaction_body(statements))
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    ExecutionError::Connection(e.to_string())
                } else {
                    ExecutionError::Http(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ExecutionError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        let result: CommitResponse = response.json().await?;
        match result.errors.into_iter().next() {
            Some(failure) => Err(ExecutionError::Store {
                code: failure.code,
                message: failure.message,
            }),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::statement::CompanyProperties;
    use crate::schema::SimilarityBasis;
    use crate::model::Company;

    #[test]
    fn test_commit_url() {
        assert_eq!(
            commit_url("http://localhost:7474/", "neo4j"),
            "http://localhost:7474/db/neo4j/tx/commit"
        );
        let executor = HttpExecutor::new(&StoreConfig::default()).unwrap();
        assert_eq!(executor.commit_url(), "http://localhost:7474/db/neo4j/tx/commit");
    }

    #[test]
    fn test_transaction_body() {
        let company = Company::new("Acme").with_sector("Retail");
        let body = transaction_body(&[
            Statement::UpsertCompany(CompanyProperties::from(&company)),
            Statement::DeriveSimilar(SimilarityBasis::Sector),
        ]);

        let statements = body["statements"].as_array().unwrap();
        assert_eq!(statements.len(), 2);
        assert!(statements[0]["statement"]
            .as_str()
            .unwrap()
            .starts_with("MERGE (c:Company {name: $name})"));
        assert_eq!(statements[0]["parameters"]["name"], "Acme");
        assert_eq!(statements[0]["parameters"]["sector"], "Retail");
        assert!(statements[0]["parameters"]["revenue"].is_null());
        assert_eq!(statements[1]["parameters"]["basis"], "sector");
    }

    #[test]
    fn test_parse_store_errors() {
        let response: CommitResponse = serde_json::from_value(json!({
            "results": [],
            "errors": [{
                "code": "Neo.ClientError.Statement.SyntaxError",
                "message": "Invalid input"
            }]
        }))
        .unwrap();
        assert_eq!(response.errors.len(), 1);
        assert_eq!(response.errors[0].code, "Neo.ClientError.Statement.SyntaxError");

        let ok: CommitResponse = serde_json::from_value(json!({"results": []})).unwrap();
        assert!(ok.errors.is_empty());
    }
}
