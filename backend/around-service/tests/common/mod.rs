//! In-memory stores for integration tests
//!
//! `InMemoryIndex` answers radius queries with a haversine filter and exact
//! lookups by field equality, so the services can be exercised without a
//! running Elasticsearch or S3.
#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use around_service::models::{Distance, Location};
use around_service::services::{BlobStore, IndexError, MediaUpload, SearchIndex, StorageError};

#[derive(Default)]
struct IndexState {
    schemas: HashMap<String, Value>,
    /// index -> documents in insertion order
    documents: HashMap<String, Vec<(String, Value)>>,
}

/// Mock search index with failure injection
#[derive(Clone, Default)]
pub struct InMemoryIndex {
    state: Arc<Mutex<IndexState>>,
    fail_writes: Arc<AtomicBool>,
    fail_queries: Arc<AtomicBool>,
    schema_calls: Arc<AtomicUsize>,
}

impl InMemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn fail_queries(&self, fail: bool) {
        self.fail_queries.store(fail, Ordering::SeqCst);
    }

    /// Store a document as-is, bypassing the services.
    pub fn insert_raw(&self, index: &str, id: &str, document: Value) {
        let mut state = self.state.lock().unwrap();
        upsert(state.documents.entry(index.to_string()).or_default(), id, document);
    }

    pub fn documents(&self, index: &str) -> Vec<Value> {
        let state = self.state.lock().unwrap();
        state
            .documents
            .get(index)
            .map(|docs| docs.iter().map(|(_, doc)| doc.clone()).collect())
            .unwrap_or_default()
    }

    pub fn schema(&self, index: &str) -> Option<Value> {
        self.state.lock().unwrap().schemas.get(index).cloned()
    }

    pub fn schema_calls(&self) -> usize {
        self.schema_calls.load(Ordering::SeqCst)
    }
}

fn upsert(docs: &mut Vec<(String, Value)>, id: &str, document: Value) {
    match docs.iter_mut().find(|(existing, _)| existing == id) {
        Some(slot) => slot.1 = document,
        None => docs.push((id.to_string(), document)),
    }
}

fn location_of(document: &Value) -> Option<Location> {
    let location = document.get("location")?;
    Some(Location::new(
        location.get("lat")?.as_f64()?,
        location.get("lon")?.as_f64()?,
    ))
}

#[async_trait]
impl SearchIndex for InMemoryIndex {
    async fn ensure_schema(&self, index: &str, mappings: &Value) -> Result<(), IndexError> {
        self.schema_calls.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.lock().unwrap();
        state
            .schemas
            .entry(index.to_string())
            .or_insert_with(|| mappings.clone());
        Ok(())
    }

    async fn index_document(
        &self,
        index: &str,
        _doc_type: &str,
        id: &str,
        document: &Value,
    ) -> Result<(), IndexError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(IndexError::WriteFailed {
                index: index.to_string(),
                reason: "injected write failure".to_string(),
            });
        }
        self.insert_raw(index, id, document.clone());
        Ok(())
    }

    async fn query_by_radius(
        &self,
        index: &str,
        center: Location,
        radius: Distance,
    ) -> Result<Vec<Value>, IndexError> {
        if self.fail_queries.load(Ordering::SeqCst) {
            return Err(IndexError::QueryFailed {
                index: index.to_string(),
                reason: "injected query failure".to_string(),
            });
        }
        let limit = radius.as_km();
        Ok(self
            .documents(index)
            .into_iter()
            .filter(|doc| {
                location_of(doc).is_some_and(|loc| center.distance_km(&loc) <= limit)
            })
            .collect())
    }

    async fn query_by_exact_field(
        &self,
        index: &str,
        field: &str,
        value: &str,
    ) -> Result<Vec<Value>, IndexError> {
        if self.fail_queries.load(Ordering::SeqCst) {
            return Err(IndexError::QueryFailed {
                index: index.to_string(),
                reason: "injected query failure".to_string(),
            });
        }
        Ok(self
            .documents(index)
            .into_iter()
            .filter(|doc| doc.get(field).and_then(Value::as_str) == Some(value))
            .collect())
    }
}

/// Which step of an upload should fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlobFailure {
    Unavailable,
    Upload,
    Acl,
}

/// Mock object store keyed by `bucket/object`
#[derive(Clone, Default)]
pub struct InMemoryBlobStore {
    objects: Arc<Mutex<HashMap<String, Bytes>>>,
    failure: Arc<Mutex<Option<BlobFailure>>>,
    upload_calls: Arc<AtomicUsize>,
}

impl InMemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_with(&self, failure: Option<BlobFailure>) {
        *self.failure.lock().unwrap() = failure;
    }

    pub fn object(&self, bucket: &str, object: &str) -> Option<Bytes> {
        self.objects
            .lock()
            .unwrap()
            .get(&format!("{bucket}/{object}"))
            .cloned()
    }

    pub fn object_count(&self) -> usize {
        self.objects.lock().unwrap().len()
    }

    pub fn upload_calls(&self) -> usize {
        self.upload_calls.load(Ordering::SeqCst)
    }
}

pub fn blob_url(bucket: &str, object: &str) -> String {
    format!("https://blobs.test/{bucket}/{object}")
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn upload(
        &self,
        media: MediaUpload,
        bucket: &str,
        object: &str,
    ) -> Result<String, StorageError> {
        self.upload_calls.fetch_add(1, Ordering::SeqCst);
        let failure = *self.failure.lock().unwrap();

        match failure {
            Some(BlobFailure::Unavailable) => {
                return Err(StorageError::Unavailable {
                    bucket: bucket.to_string(),
                    reason: "injected".to_string(),
                })
            }
            Some(BlobFailure::Upload) => {
                return Err(StorageError::UploadFailed {
                    object: object.to_string(),
                    reason: "injected".to_string(),
                })
            }
            _ => {}
        }

        // The body lands before the ACL step, as with a real bucket.
        self.objects
            .lock()
            .unwrap()
            .insert(format!("{bucket}/{object}"), media.content);

        if failure == Some(BlobFailure::Acl) {
            return Err(StorageError::AclFailed {
                object: object.to_string(),
                reason: "injected".to_string(),
            });
        }

        Ok(blob_url(bucket, object))
    }

    async fn health_check(&self, bucket: &str) -> Result<(), StorageError> {
        if *self.failure.lock().unwrap() == Some(BlobFailure::Unavailable) {
            return Err(StorageError::Unavailable {
                bucket: bucket.to_string(),
                reason: "injected".to_string(),
            });
        }
        Ok(())
    }
}
