use crate::models::{Distance, Location};
use async_trait::async_trait;
use elasticsearch::{
    http::transport::{BuildError, SingleNodeConnectionPool, TransportBuilder},
    indices::{IndicesCreateParts, IndicesExistsParts},
    params::Refresh,
    Elasticsearch, IndexParts, SearchParts,
};
use resilience::{with_retry_if, with_timeout, RetryConfig, RetryError};
use serde_json::{json, Value};
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("invalid Elasticsearch URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("failed to build transport: {0}")]
    TransportBuild(#[from] BuildError),
    #[error("schema setup for {index} failed: {reason}")]
    Schema { index: String, reason: String },
    #[error("write to {index} failed: {reason}")]
    WriteFailed { index: String, reason: String },
    #[error("query against {index} failed: {reason}")]
    QueryFailed { index: String, reason: String },
    /// The cluster refused the query itself (4xx); repeating it cannot help.
    #[error("query against {index} rejected: {reason}")]
    QueryRejected { index: String, reason: String },
}

impl IndexError {
    /// Transport errors, timeouts and 5xx answers may clear up on retry.
    pub fn is_retryable(&self) -> bool {
        matches!(self, IndexError::QueryFailed { .. })
    }
}

/// Search index operations the services depend on.
///
/// Documents are opaque JSON here; callers own their shape.
#[async_trait]
pub trait SearchIndex: Send + Sync {
    /// Create `index` with `mappings` unless it already exists.
    async fn ensure_schema(&self, index: &str, mappings: &Value) -> Result<(), IndexError>;

    /// Write or overwrite the document at `id` and make it visible to
    /// queries issued right after this call returns.
    ///
    /// `doc_type` is a logical label only; typeless indices have a single
    /// document type.
    async fn index_document(
        &self,
        index: &str,
        doc_type: &str,
        id: &str,
        document: &Value,
    ) -> Result<(), IndexError>;

    /// All documents whose `location` lies within `radius` of `center`,
    /// in the index's native order.
    async fn query_by_radius(
        &self,
        index: &str,
        center: Location,
        radius: Distance,
    ) -> Result<Vec<Value>, IndexError>;

    /// Documents whose `field` equals `value` exactly.
    async fn query_by_exact_field(
        &self,
        index: &str,
        field: &str,
        value: &str,
    ) -> Result<Vec<Value>, IndexError>;
}

/// Mapping for the post index. `location` must be a `geo_point` or radius
/// queries cannot run against it.
pub fn post_index_mappings() -> Value {
    json!({
        "properties": {
            "id": { "type": "keyword" },
            "user": { "type": "keyword" },
            "message": { "type": "text" },
            "location": { "type": "geo_point" },
            "url": { "type": "keyword", "index": false }
        }
    })
}

/// Mapping for the credential index.
pub fn user_index_mappings() -> Value {
    json!({
        "properties": {
            "username": { "type": "keyword" },
            "password_hash": { "type": "keyword", "index": false }
        }
    })
}

/// Body of a radius query: geo-distance filter around `center`.
pub fn radius_query(center: Location, radius: Distance, size: usize) -> Value {
    json!({
        "size": size,
        "query": {
            "bool": {
                "must": { "match_all": {} },
                "filter": {
                    "geo_distance": {
                        "distance": radius.to_string(),
                        "location": { "lat": center.lat, "lon": center.lon }
                    }
                }
            }
        }
    })
}

/// Body of an exact-match lookup.
pub fn term_query(field: &str, value: &str) -> Value {
    json!({
        "query": {
            "term": { field: value }
        }
    })
}

#[derive(Clone)]
pub struct ElasticsearchIndex {
    client: Elasticsearch,
    timeout: Duration,
    read_retry: RetryConfig,
    max_results: usize,
}

impl ElasticsearchIndex {
    pub fn new(
        url: &str,
        timeout: Duration,
        read_retry: RetryConfig,
        max_results: usize,
    ) -> Result<Self, IndexError> {
        let parsed = Url::parse(url)?;
        let pool = SingleNodeConnectionPool::new(parsed);
        let transport = TransportBuilder::new(pool).build()?;
        let client = Elasticsearch::new(transport);

        Ok(Self {
            client,
            timeout,
            read_retry,
            max_results,
        })
    }

    /// Run `op` under the per-call timeout, turning an elapsed timer into
    /// the error `on_timeout` builds.
    async fn bounded<T, F>(
        &self,
        op: F,
        on_timeout: impl FnOnce(String) -> IndexError,
    ) -> Result<T, IndexError>
    where
        F: Future<Output = Result<T, IndexError>>,
    {
        match with_timeout(self.timeout, op).await {
            Ok(result) => result,
            Err(elapsed) => Err(on_timeout(elapsed.to_string())),
        }
    }

    async fn search_sources(&self, index: &str, body: &Value) -> Result<Vec<Value>, IndexError> {
        let query_failed = |reason: String| IndexError::QueryFailed {
            index: index.to_string(),
            reason,
        };

        let response = self
            .client
            .search(SearchParts::Index(&[index]))
            .body(body.clone())
            .send()
            .await
            .map_err(|e| query_failed(e.to_string()))?;

        let status = response.status_code();
        if status.is_client_error() {
            let text = response.text().await.unwrap_or_default();
            return Err(IndexError::QueryRejected {
                index: index.to_string(),
                reason: format!("status {}: {}", status, text),
            });
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(query_failed(format!("status {}: {}", status, text)));
        }

        let result: Value = response
            .json()
            .await
            .map_err(|e| query_failed(e.to_string()))?;

        Ok(extract_sources(result))
    }

    async fn search_with_retry(&self, index: &str, body: Value) -> Result<Vec<Value>, IndexError> {
        let body = &body;
        with_retry_if(
            self.read_retry.clone(),
            move || {
                self.bounded(self.search_sources(index, body), move |reason| {
                    IndexError::QueryFailed {
                        index: index.to_string(),
                        reason,
                    }
                })
            },
            IndexError::is_retryable,
        )
        .await
        .map_err(RetryError::into_inner)
    }

    pub async fn health_check(&self) -> Result<(), IndexError> {
        let response = self
            .client
            .ping()
            .send()
            .await
            .map_err(|e| IndexError::QueryFailed {
                index: "_ping".to_string(),
                reason: e.to_string(),
            })?;

        if response.status_code().is_success() {
            Ok(())
        } else {
            Err(IndexError::QueryFailed {
                index: "_ping".to_string(),
                reason: format!("status {}", response.status_code()),
            })
        }
    }
}

/// Pull `_source` out of every hit, keeping hit order.
fn extract_sources(mut response: Value) -> Vec<Value> {
    match response.pointer_mut("/hits/hits").map(Value::take) {
        Some(Value::Array(hits)) => hits
            .into_iter()
            .filter_map(|hit| match hit {
                Value::Object(mut fields) => fields.remove("_source"),
                _ => None,
            })
            .filter(|source| !source.is_null())
            .collect(),
        _ => Vec::new(),
    }
}

#[async_trait]
impl SearchIndex for ElasticsearchIndex {
    async fn ensure_schema(&self, index: &str, mappings: &Value) -> Result<(), IndexError> {
        let schema_failed = |reason: String| IndexError::Schema {
            index: index.to_string(),
            reason,
        };

        let create = async {
            let exists_response = self
                .client
                .indices()
                .exists(IndicesExistsParts::Index(&[index]))
                .send()
                .await
                .map_err(|e| schema_failed(e.to_string()))?;

            if exists_response.status_code().is_success() {
                tracing::debug!(index = %index, "Index already exists");
                return Ok(());
            }

            let response = self
                .client
                .indices()
                .create(IndicesCreateParts::Index(index))
                .body(json!({ "mappings": mappings }))
                .send()
                .await
                .map_err(|e| schema_failed(e.to_string()))?;

            let status = response.status_code();
            if status.is_success() {
                tracing::info!(index = %index, "Created index");
                return Ok(());
            }

            // Another instance may have created it between the two calls.
            let body: Value = response.json().await.unwrap_or_default();
            if body["error"]["type"] == "resource_already_exists_exception" {
                return Ok(());
            }

            Err(schema_failed(format!("status {}: {}", status, body)))
        };

        self.bounded(create, &schema_failed).await
    }

    async fn index_document(
        &self,
        index: &str,
        doc_type: &str,
        id: &str,
        document: &Value,
    ) -> Result<(), IndexError> {
        let write_failed = |reason: String| IndexError::WriteFailed {
            index: index.to_string(),
            reason,
        };

        let write = async {
            let response = self
                .client
                .index(IndexParts::IndexId(index, id))
                .refresh(Refresh::True)
                .body(document)
                .send()
                .await
                .map_err(|e| write_failed(e.to_string()))?;

            let status = response.status_code();
            if status.is_success() {
                Ok(())
            } else {
                let text = response.text().await.unwrap_or_default();
                Err(write_failed(format!("status {}: {}", status, text)))
            }
        };

        self.bounded(write, &write_failed).await?;
        tracing::debug!(index = %index, doc_type = %doc_type, id = %id, "Indexed document");
        Ok(())
    }

    async fn query_by_radius(
        &self,
        index: &str,
        center: Location,
        radius: Distance,
    ) -> Result<Vec<Value>, IndexError> {
        self.search_with_retry(index, radius_query(center, radius, self.max_results))
            .await
    }

    async fn query_by_exact_field(
        &self,
        index: &str,
        field: &str,
        value: &str,
    ) -> Result<Vec<Value>, IndexError> {
        self.search_with_retry(index, term_query(field, value)).await
    }
}
