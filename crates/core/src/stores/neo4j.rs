use crate::error::GraphError;
use crate::models::GraphMutation;
use crate::traits::GraphSink;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

/// Neo4j over the HTTP transaction endpoint. Each `apply_batch` call posts
/// the batch's statements to `tx/commit`, which runs them in one server-side
/// transaction: a failing statement rolls the whole request back.
pub struct Neo4jStore {
    endpoint: String,
    database: String,
    username: String,
    password: String,
    client: Client,
}

impl Neo4jStore {
    pub fn new(
        endpoint: impl Into<String>,
        database: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            database: database.into(),
            username: username.into(),
            password: password.into(),
            client: Client::new(),
        }
    }

    fn tx_url(&self) -> String {
        format!("{}/db/{}/tx/commit", self.endpoint, self.database)
    }

    async fn post_statements(&self, statements: Value) -> Result<Value, GraphError> {
        let response = self
            .client
            .post(self.tx_url())
            .basic_auth(&self.username, Some(&self.password))
            .json(&json!({ "statements": statements }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(GraphError::BackendResponse {
                backend: "neo4j".to_string(),
                details: response.status().to_string(),
            });
        }

        let body: Value = response.json().await?;
        if let Some(details) = collect_errors(&body) {
            return Err(GraphError::BackendResponse {
                backend: "neo4j".to_string(),
                details,
            });
        }

        Ok(body)
    }
}

#[async_trait]
impl GraphSink for Neo4jStore {
    async fn verify_connectivity(&self) -> Result<(), GraphError> {
        self.post_statements(json!([{ "statement": "RETURN 1" }]))
            .await
            .map_err(|error| GraphError::Unavailable(error.to_string()))?;
        Ok(())
    }

    async fn apply_batch(&self, mutations: &[GraphMutation]) -> Result<(), GraphError> {
        if mutations.is_empty() {
            return Ok(());
        }

        let statements: Vec<Value> = mutations
            .iter()
            .map(|mutation| {
                json!({
                    "statement": mutation.statement,
                    "parameters": mutation.parameters,
                })
            })
            .collect();

        self.post_statements(Value::Array(statements)).await?;
        Ok(())
    }
}

/// The transactional endpoint reports statement failures in an `errors`
/// array on a 200 response; a non-empty array means the transaction rolled
/// back.
fn collect_errors(payload: &Value) -> Option<String> {
    let errors = payload.pointer("/errors").and_then(Value::as_array)?;
    if errors.is_empty() {
        return None;
    }

    let details = errors
        .iter()
        .map(|error| {
            let code = error
                .pointer("/code")
                .and_then(Value::as_str)
                .unwrap_or("unknown");
            let message = error
                .pointer("/message")
                .and_then(Value::as_str)
                .unwrap_or("no message");
            format!("{code}: {message}")
        })
        .collect::<Vec<_>>()
        .join("; ");

    Some(details)
}
