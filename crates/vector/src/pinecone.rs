//! Pinecone vector store over its REST API.
//!
//! Control plane (index management) lives at a fixed controller URL. The data
//! plane (queries) lives at a per-index host, resolved from the index
//! description and cached for the life of the store.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use groundwire_config::VectorStoreConfig;
use groundwire_core::error::VectorStoreError;
use groundwire_core::vector::{Document, IndexSpec, VectorStore, rank};
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::readiness::ReadinessPolicy;

/// What the control plane reports about one index.
#[derive(Debug, Clone, Deserialize)]
pub struct IndexDescription {
    pub name: String,
    #[serde(default)]
    pub dimension: usize,
    #[serde(default)]
    pub host: String,
    #[serde(default)]
    pub status: IndexStatus,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct IndexStatus {
    #[serde(default)]
    pub ready: bool,
    #[serde(default)]
    pub state: String,
}

/// Record counts reported by the data plane.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexStats {
    #[serde(default)]
    pub dimension: usize,
    #[serde(default)]
    pub total_vector_count: u64,
}

pub struct PineconeStore {
    client: reqwest::Client,
    controller_url: String,
    api_key: String,
    api_version: String,
    content_field: String,
    readiness: ReadinessPolicy,
    hosts: RwLock<HashMap<String, String>>,
}

impl PineconeStore {
    pub fn new(
        api_key: impl Into<String>,
        controller_url: impl Into<String>,
        api_version: impl Into<String>,
        content_field: impl Into<String>,
        readiness: ReadinessPolicy,
        timeout: Duration,
    ) -> Result<Self, VectorStoreError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| VectorStoreError::Network(format!("HTTP client: {e}")))?;

        Ok(Self {
            client,
            controller_url: controller_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            api_version: api_version.into(),
            content_field: content_field.into(),
            readiness,
            hosts: RwLock::new(HashMap::new()),
        })
    }

    /// Build from `[vector_store]`. Credentials are checked by the caller.
    pub fn from_config(config: &VectorStoreConfig) -> Result<Self, VectorStoreError> {
        Self::new(
            config.api_key.clone().unwrap_or_default(),
            &config.controller_url,
            &config.api_version,
            &config.content_field,
            ReadinessPolicy::from(&config.readiness),
            Duration::from_secs(config.timeout_secs),
        )
    }

    fn with_headers(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder
            .header("Api-Key", &self.api_key)
            .header("X-Pinecone-API-Version", &self.api_version)
    }

    async fn send(&self, builder: reqwest::RequestBuilder) -> Result<(u16, String), VectorStoreError> {
        let response = self
            .with_headers(builder)
            .send()
            .await
            .map_err(|e| VectorStoreError::Network(e.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| VectorStoreError::Network(e.to_string()))?;
        Ok((status, body))
    }

    fn check_status(status: u16, body: &str, subject: &str) -> Result<(), VectorStoreError> {
        match status {
            200..=299 => Ok(()),
            401 | 403 => Err(VectorStoreError::AuthenticationFailed(
                "Invalid API key or insufficient permissions".into(),
            )),
            404 => Err(VectorStoreError::IndexNotFound(subject.to_string())),
            _ => {
                warn!(status, body = %body, "Vector store returned error");
                Err(VectorStoreError::ApiError {
                    status_code: status,
                    message: body.to_string(),
                })
            }
        }
    }

    fn parse<T: for<'de> Deserialize<'de>>(body: &str) -> Result<T, VectorStoreError> {
        serde_json::from_str(body).map_err(|e| VectorStoreError::MalformedResponse(e.to_string()))
    }

    /// Names of all indexes in the project.
    pub async fn list_indexes(&self) -> Result<Vec<String>, VectorStoreError> {
        let url = format!("{}/indexes", self.controller_url);
        let (status, body) = self.send(self.client.get(&url)).await?;
        Self::check_status(status, &body, "indexes")?;

        #[derive(Deserialize)]
        struct IndexList {
            #[serde(default)]
            indexes: Vec<IndexDescription>,
        }
        let list: IndexList = Self::parse(&body)?;
        Ok(list.indexes.into_iter().map(|i| i.name).collect())
    }

    pub async fn describe_index(&self, name: &str) -> Result<IndexDescription, VectorStoreError> {
        let url = format!("{}/indexes/{}", self.controller_url, name);
        let (status, body) = self.send(self.client.get(&url)).await?;
        Self::check_status(status, &body, name)?;
        let desc: IndexDescription = Self::parse(&body)?;
        if !desc.host.is_empty() {
            self.hosts
                .write()
                .await
                .insert(name.to_string(), desc.host.clone());
        }
        Ok(desc)
    }

    async fn create_index(&self, spec: &IndexSpec) -> Result<(), VectorStoreError> {
        let url = format!("{}/indexes", self.controller_url);
        let body = serde_json::json!({
            "name": spec.name,
            "dimension": spec.dims,
            "metric": spec.metric.as_str(),
            "spec": {
                "serverless": { "cloud": spec.cloud, "region": spec.region }
            }
        });

        let (status, body) = self.send(self.client.post(&url).json(&body)).await?;
        if status == 409 {
            debug!(index = %spec.name, "Index was created concurrently");
            return Ok(());
        }
        Self::check_status(status, &body, &spec.name)?;
        info!(index = %spec.name, dims = spec.dims, metric = spec.metric.as_str(), "Created index");
        Ok(())
    }

    /// Data-plane base URL for `index`, from cache or a fresh describe.
    async fn host(&self, index: &str) -> Result<String, VectorStoreError> {
        if let Some(host) = self.hosts.read().await.get(index) {
            return Ok(data_plane_url(host));
        }
        let desc = self.describe_index(index).await?;
        if desc.host.is_empty() {
            return Err(VectorStoreError::MalformedResponse(format!(
                "index '{index}' has no host"
            )));
        }
        Ok(data_plane_url(&desc.host))
    }

    /// Record counts for `index`.
    pub async fn describe_index_stats(&self, index: &str) -> Result<IndexStats, VectorStoreError> {
        let url = format!("{}/describe_index_stats", self.host(index).await?);
        let (status, body) = self
            .send(self.client.post(&url).json(&serde_json::json!({})))
            .await?;
        Self::check_status(status, &body, index)?;
        Self::parse(&body)
    }

    fn parse_matches(&self, body: &str) -> Result<Vec<Document>, VectorStoreError> {
        let resp: QueryResponse = Self::parse(body)?;
        resp.matches
            .into_iter()
            .map(|m| {
                let content = m
                    .metadata
                    .as_ref()
                    .and_then(|meta| meta.get(&self.content_field))
                    .and_then(|v| v.as_str())
                    .ok_or_else(|| {
                        VectorStoreError::MalformedResponse(format!(
                            "match '{}' has no '{}' metadata",
                            m.id, self.content_field
                        ))
                    })?;
                Ok(Document {
                    id: m.id.clone(),
                    content: content.to_string(),
                    score: m.score,
                })
            })
            .collect()
    }
}

/// Pinecone reports bare hostnames; tests and proxies may pass full URLs.
fn data_plane_url(host: &str) -> String {
    let host = host.trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("https://{host}")
    }
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<QueryMatch>,
}

#[derive(Debug, Deserialize)]
struct QueryMatch {
    #[serde(default)]
    id: String,
    #[serde(default)]
    score: f32,
    #[serde(default)]
    metadata: Option<serde_json::Map<String, serde_json::Value>>,
}

#[async_trait]
impl VectorStore for PineconeStore {
    fn name(&self) -> &str {
        "pinecone"
    }

    async fn ensure_index(&self, spec: &IndexSpec) -> Result<(), VectorStoreError> {
        let existing = self.list_indexes().await?;

        if existing.iter().any(|n| n == &spec.name) {
            let desc = self.describe_index(&spec.name).await?;
            if desc.dimension != 0 && desc.dimension != spec.dims {
                return Err(VectorStoreError::DimensionMismatch {
                    name: spec.name.clone(),
                    expected: spec.dims,
                    actual: desc.dimension,
                });
            }
            debug!(index = %spec.name, "Index already exists");
            return Ok(());
        }

        self.create_index(spec).await?;
        self.readiness
            .wait_until_ready(&spec.name, || async {
                self.describe_index(&spec.name)
                    .await
                    .map(|desc| desc.status.ready)
            })
            .await
    }

    async fn query(
        &self,
        index: &str,
        vector: &[f32],
        top_k: usize,
    ) -> Result<Vec<Document>, VectorStoreError> {
        let url = format!("{}/query", self.host(index).await?);
        let body = serde_json::json!({
            "vector": vector,
            "topK": top_k,
            "includeMetadata": true,
        });

        debug!(index, top_k, "Querying index");
        let (status, body) = self.send(self.client.post(&url).json(&body)).await?;
        Self::check_status(status, &body, index)?;

        let docs = self.parse_matches(&body)?;
        Ok(rank(docs, top_k))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::{Path, State};
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use groundwire_core::vector::Metric;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct FakeIndex {
        dims: usize,
        describes_until_ready: u32,
    }

    #[derive(Default)]
    struct FakePinecone {
        base_url: String,
        indexes: HashMap<String, FakeIndex>,
        creates: u32,
        ready_after: u32,
        matches: serde_json::Value,
        last_query: Option<serde_json::Value>,
    }

    type Shared = Arc<Mutex<FakePinecone>>;

    fn authorized(headers: &HeaderMap) -> bool {
        headers.get("Api-Key").and_then(|v| v.to_str().ok()) == Some("pc-test")
            && headers.get("X-Pinecone-API-Version").is_some()
    }

    async fn list(State(s): State<Shared>, headers: HeaderMap) -> (StatusCode, Json<serde_json::Value>) {
        if !authorized(&headers) {
            return (StatusCode::UNAUTHORIZED, Json(serde_json::json!({})));
        }
        let s = s.lock().unwrap();
        let indexes: Vec<_> = s
            .indexes
            .keys()
            .map(|n| serde_json::json!({ "name": n }))
            .collect();
        (StatusCode::OK, Json(serde_json::json!({ "indexes": indexes })))
    }

    async fn create(State(s): State<Shared>, Json(body): Json<serde_json::Value>) -> StatusCode {
        let mut s = s.lock().unwrap();
        let name = body["name"].as_str().unwrap_or_default().to_string();
        assert_eq!(body["metric"], "cosine");
        assert_eq!(body["spec"]["serverless"]["region"], "us-east-1");
        if s.indexes.contains_key(&name) {
            return StatusCode::CONFLICT;
        }
        s.creates += 1;
        let ready_after = s.ready_after;
        s.indexes.insert(
            name,
            FakeIndex {
                dims: body["dimension"].as_u64().unwrap_or(0) as usize,
                describes_until_ready: ready_after,
            },
        );
        StatusCode::CREATED
    }

    async fn describe(
        State(s): State<Shared>,
        Path(name): Path<String>,
    ) -> (StatusCode, Json<serde_json::Value>) {
        let mut s = s.lock().unwrap();
        let host = s.base_url.clone();
        match s.indexes.get_mut(&name) {
            Some(idx) => {
                let ready = idx.describes_until_ready == 0;
                idx.describes_until_ready = idx.describes_until_ready.saturating_sub(1);
                (
                    StatusCode::OK,
                    Json(serde_json::json!({
                        "name": name,
                        "dimension": idx.dims,
                        "host": host,
                        "status": { "ready": ready, "state": if ready { "Ready" } else { "Initializing" } }
                    })),
                )
            }
            None => (StatusCode::NOT_FOUND, Json(serde_json::json!({}))),
        }
    }

    async fn query(State(s): State<Shared>, Json(body): Json<serde_json::Value>) -> Json<serde_json::Value> {
        let mut s = s.lock().unwrap();
        s.last_query = Some(body);
        Json(serde_json::json!({ "matches": s.matches.clone() }))
    }

    async fn stats(State(s): State<Shared>) -> Json<serde_json::Value> {
        let s = s.lock().unwrap();
        let count = s.matches.as_array().map(|m| m.len()).unwrap_or(0);
        Json(serde_json::json!({
            "dimension": 768,
            "totalVectorCount": count,
            "namespaces": {}
        }))
    }

    async fn fake_pinecone(state: FakePinecone) -> (Shared, String) {
        let shared: Shared = Arc::new(Mutex::new(state));
        let app = Router::new()
            .route("/indexes", get(list).post(create))
            .route("/indexes/{name}", get(describe))
            .route("/query", post(query))
            .route("/describe_index_stats", post(stats))
            .with_state(shared.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        shared.lock().unwrap().base_url = url.clone();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (shared, url)
    }

    fn store(url: &str, key: &str) -> PineconeStore {
        PineconeStore::new(
            key,
            url,
            "2024-07",
            "content_snippet",
            ReadinessPolicy {
                max_attempts: 3,
                initial_delay: Duration::from_millis(5),
                max_delay: Duration::from_millis(10),
            },
            Duration::from_secs(5),
        )
        .unwrap()
    }

    fn spec(dims: usize) -> IndexSpec {
        IndexSpec {
            name: "groq-llama-3-rag".into(),
            dims,
            metric: Metric::Cosine,
            cloud: "aws".into(),
            region: "us-east-1".into(),
        }
    }

    #[test]
    fn bare_hosts_get_https() {
        assert_eq!(data_plane_url("idx.svc.pinecone.io"), "https://idx.svc.pinecone.io");
        assert_eq!(data_plane_url("http://127.0.0.1:9/"), "http://127.0.0.1:9");
    }

    #[tokio::test]
    async fn ensure_index_creates_then_waits_for_ready() {
        let (state, url) = fake_pinecone(FakePinecone {
            ready_after: 2,
            ..Default::default()
        })
        .await;
        let store = store(&url, "pc-test");

        store.ensure_index(&spec(768)).await.unwrap();
        store.ensure_index(&spec(768)).await.unwrap();

        let s = state.lock().unwrap();
        assert_eq!(s.creates, 1);
        assert_eq!(s.indexes["groq-llama-3-rag"].dims, 768);
    }

    #[tokio::test]
    async fn ensure_index_gives_up_when_never_ready() {
        let (_state, url) = fake_pinecone(FakePinecone {
            ready_after: 100,
            ..Default::default()
        })
        .await;
        let err = store(&url, "pc-test").ensure_index(&spec(768)).await.unwrap_err();
        assert!(matches!(err, VectorStoreError::IndexUnavailable { attempts: 3, .. }));
    }

    #[tokio::test]
    async fn existing_index_with_other_dimension_is_mismatch() {
        let mut indexes = HashMap::new();
        indexes.insert(
            "groq-llama-3-rag".to_string(),
            FakeIndex {
                dims: 384,
                describes_until_ready: 0,
            },
        );
        let (_state, url) = fake_pinecone(FakePinecone {
            indexes,
            ..Default::default()
        })
        .await;
        let err = store(&url, "pc-test").ensure_index(&spec(768)).await.unwrap_err();
        assert!(matches!(
            err,
            VectorStoreError::DimensionMismatch {
                expected: 768,
                actual: 384,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn bad_key_is_authentication_failure() {
        let (_state, url) = fake_pinecone(FakePinecone::default()).await;
        let err = store(&url, "wrong").ensure_index(&spec(768)).await.unwrap_err();
        assert!(matches!(err, VectorStoreError::AuthenticationFailed(_)));
    }

    #[tokio::test]
    async fn query_reads_content_and_ranks() {
        let mut indexes = HashMap::new();
        indexes.insert("groq-llama-3-rag".to_string(), FakeIndex::default());
        let (state, url) = fake_pinecone(FakePinecone {
            indexes,
            matches: serde_json::json!([
                {"id": "b", "score": 0.4, "metadata": {"content_snippet": "Juliana's"}},
                {"id": "a", "score": 0.9, "metadata": {"content_snippet": "Di Fara"}},
                {"id": "c", "score": 0.7, "metadata": {"content_snippet": "L&B Spumoni"}}
            ]),
            ..Default::default()
        })
        .await;

        let docs = store(&url, "pc-test")
            .query("groq-llama-3-rag", &[0.1, 0.2], 2)
            .await
            .unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].content, "Di Fara");
        assert_eq!(docs[1].content, "L&B Spumoni");

        let sent = state.lock().unwrap().last_query.clone().unwrap();
        assert_eq!(sent["topK"], 2);
        assert_eq!(sent["includeMetadata"], true);
    }

    #[tokio::test]
    async fn query_without_matches_is_empty() {
        let mut indexes = HashMap::new();
        indexes.insert("groq-llama-3-rag".to_string(), FakeIndex::default());
        let (_state, url) = fake_pinecone(FakePinecone {
            indexes,
            matches: serde_json::json!([]),
            ..Default::default()
        })
        .await;

        let docs = store(&url, "pc-test")
            .query("groq-llama-3-rag", &[0.1], 5)
            .await
            .unwrap();
        assert!(docs.is_empty());
    }

    #[tokio::test]
    async fn match_without_content_field_is_malformed() {
        let mut indexes = HashMap::new();
        indexes.insert("groq-llama-3-rag".to_string(), FakeIndex::default());
        let (_state, url) = fake_pinecone(FakePinecone {
            indexes,
            matches: serde_json::json!([{"id": "a", "score": 0.9, "metadata": {"title": "x"}}]),
            ..Default::default()
        })
        .await;

        let err = store(&url, "pc-test")
            .query("groq-llama-3-rag", &[0.1], 5)
            .await
            .unwrap_err();
        assert!(matches!(err, VectorStoreError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn query_unknown_index_is_not_found() {
        let (_state, url) = fake_pinecone(FakePinecone::default()).await;
        let err = store(&url, "pc-test").query("nope", &[0.1], 5).await.unwrap_err();
        assert!(matches!(err, VectorStoreError::IndexNotFound(_)));
    }

    #[tokio::test]
    async fn stats_come_from_the_index_host() {
        let mut indexes = HashMap::new();
        indexes.insert("groq-llama-3-rag".to_string(), FakeIndex::default());
        let (_state, url) = fake_pinecone(FakePinecone {
            indexes,
            matches: serde_json::json!([{}, {}, {}]),
            ..Default::default()
        })
        .await;

        let stats = store(&url, "pc-test")
            .describe_index_stats("groq-llama-3-rag")
            .await
            .unwrap();
        assert_eq!(stats.dimension, 768);
        assert_eq!(stats.total_vector_count, 3);
    }
}
