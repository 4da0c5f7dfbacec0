//! Datastore v1 REST adapter.
//!
//! Talks to `{endpoint}/v1/projects/{project}:<method>` for `runQuery`,
//! `lookup` and `commit`. Works against the hosted service with a bearer
//! token, or against the local emulator without one.

use crate::{KindQuery, QueryBatch, RawEntity, RemoteStore, StoreError, StoreResult};
use async_trait::async_trait;
use docstore_codec::wire;
use docstore_types::{EntityKey, PropertyMap};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::time::Duration;
use tracing::{debug, info};

/// Environment variable naming a local emulator (`host:port`).
pub const EMULATOR_HOST_ENV: &str = "DATASTORE_EMULATOR_HOST";

const DEFAULT_ENDPOINT: &str = "https://datastore.googleapis.com";
const MORE_RESULTS: &str = "NOT_FINISHED";

/// Connection settings for [`RestStore`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestConfig {
    /// Base URL, e.g. `https://datastore.googleapis.com`.
    pub endpoint: String,
    pub project_id: String,
    /// Sent as a bearer token when present.
    #[serde(default, skip_serializing)]
    pub access_token: Option<String>,
    pub timeout_secs: u64,
}

impl RestConfig {
    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            project_id: project_id.into(),
            access_token: None,
            timeout_secs: 60,
        }
    }

    /// Settings for `project_id`, pointed at the emulator when
    /// `DATASTORE_EMULATOR_HOST` is set.
    pub fn from_env(project_id: impl Into<String>) -> Self {
        let mut config = Self::new(project_id);
        if let Ok(host) = std::env::var(EMULATOR_HOST_ENV) {
            if !host.trim().is_empty() {
                config.endpoint = emulator_endpoint(host.trim());
            }
        }
        config
    }

    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    #[must_use]
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    fn method_url(&self, method: &str) -> String {
        format!(
            "{}/v1/projects/{}:{method}",
            self.endpoint.trim_end_matches('/'),
            self.project_id
        )
    }
}

fn emulator_endpoint(host: &str) -> String {
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("http://{host}")
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RunQueryResponse {
    batch: ResultBatch,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResultBatch {
    #[serde(default)]
    entity_results: Vec<EntityResult>,
    end_cursor: Option<String>,
    more_results: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EntityResult {
    entity: Value,
}

#[derive(Debug, Deserialize)]
struct LookupResponse {
    #[serde(default)]
    found: Vec<EntityResult>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommitResponse {
    #[serde(default)]
    mutation_results: Vec<MutationResult>,
}

#[derive(Debug, Deserialize)]
struct MutationResult {
    key: Option<Value>,
}

/// A store reached over the Datastore v1 REST API.
pub struct RestStore {
    config: RestConfig,
    client: Client,
}

impl RestStore {
    pub fn new(config: RestConfig) -> StoreResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| StoreError::Network(format!("failed to create HTTP client: {e}")))?;
        info!(
            "Using store {} for project {}",
            config.endpoint, config.project_id
        );
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &RestConfig {
        &self.config
    }

    async fn call(&self, method: &str, body: &Value) -> StoreResult<Value> {
        let mut request = self.client.post(self.config.method_url(method)).json(body);
        if let Some(token) = &self.config.access_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| StoreError::Network(format!("{method} failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Http {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json()
            .await
            .map_err(|e| StoreError::InvalidResponse(format!("{method}: {e}")))
    }

    fn partition(&self, namespace: &str) -> Value {
        let mut partition = json!({"projectId": self.config.project_id});
        if !namespace.is_empty() {
            partition["namespaceId"] = Value::from(namespace);
        }
        partition
    }

    fn decode(entity: &Value) -> StoreResult<RawEntity> {
        let (key, properties) = wire::decode_entity(entity)?;
        Ok(RawEntity { key, properties })
    }
}

#[async_trait]
impl RemoteStore for RestStore {
    fn name(&self) -> &str {
        &self.config.project_id
    }

    async fn run_query(&self, query: &KindQuery, cursor: Option<&str>) -> StoreResult<QueryBatch> {
        let mut q = json!({"kind": [{"name": query.kind}]});
        if let Some(cursor) = cursor {
            q["startCursor"] = Value::from(cursor);
        }
        let body = json!({
            "partitionId": self.partition(&query.namespace),
            "query": q,
        });

        let value = self.call("runQuery", &body).await?;
        let response: RunQueryResponse = serde_json::from_value(value)?;
        let batch = response.batch;

        let entities = batch
            .entity_results
            .iter()
            .map(|r| Self::decode(&r.entity))
            .collect::<StoreResult<Vec<_>>>()?;

        let more = batch.more_results.as_deref() == Some(MORE_RESULTS);
        let next_cursor = match (more, batch.end_cursor) {
            (true, Some(c)) => Some(c),
            (true, None) => {
                return Err(StoreError::InvalidResponse(
                    "runQuery: more results without endCursor".into(),
                ));
            }
            (false, _) => None,
        };
        debug!(
            "runQuery {} returned {} entities (more: {more})",
            query.kind,
            entities.len()
        );
        Ok(QueryBatch {
            entities,
            next_cursor,
        })
    }

    async fn get(&self, key: &EntityKey) -> StoreResult<Option<RawEntity>> {
        let body = json!({"keys": [wire::encode_key(key, Some(&self.config.project_id))]});
        let value = self.call("lookup", &body).await?;
        let response: LookupResponse = serde_json::from_value(value)?;
        response
            .found
            .first()
            .map(|r| Self::decode(&r.entity))
            .transpose()
    }

    async fn put(&self, key: &EntityKey, properties: &PropertyMap) -> StoreResult<EntityKey> {
        let entity = wire::encode_entity(key, properties, Some(&self.config.project_id))?;
        let body = json!({
            "mode": "NON_TRANSACTIONAL",
            "mutations": [{"upsert": entity}],
        });

        let value = self.call("commit", &body).await?;
        let response: CommitResponse = serde_json::from_value(value)?;
        // The store only echoes a key when it allocated one.
        match response.mutation_results.first().and_then(|r| r.key.as_ref()) {
            Some(allocated) => Ok(wire::decode_key(allocated)?),
            None if key.is_complete() => Ok(key.clone()),
            None => Err(StoreError::InvalidResponse(
                "commit: no key allocated for incomplete key".into(),
            )),
        }
    }
}
