//! `S3BlobStore` against a mock S3 endpoint (path-style addressing)

use around_service::config::MediaConfig;
use around_service::services::storage::get_s3_client;
use around_service::services::{BlobStore, MediaUpload, S3BlobStore, StorageError};
use around_service::AppError;
use bytes::Bytes;
use wiremock::matchers::{method, path};
use wiremock::{Match, Mock, MockServer, Request, ResponseTemplate};

const BUCKET: &str = "around-media";

/// Matches requests whose query string carries `key` (e.g. `?acl`).
struct HasQueryKey(&'static str);

impl Match for HasQueryKey {
    fn matches(&self, request: &Request) -> bool {
        request.url.query_pairs().any(|(key, _)| key == self.0)
    }
}

struct LacksQueryKey(&'static str);

impl Match for LacksQueryKey {
    fn matches(&self, request: &Request) -> bool {
        !HasQueryKey(self.0).matches(request)
    }
}

async fn store_for(server: &MockServer) -> S3BlobStore {
    let config = MediaConfig {
        bucket: BUCKET.to_string(),
        region: "us-east-1".to_string(),
        access_key_id: Some("test-key".to_string()),
        secret_access_key: Some("test-secret".to_string()),
        endpoint: Some(server.uri()),
        public_base_url: None,
        path_style: true,
        max_bytes: 1024 * 1024,
        timeout_secs: 5,
    };
    let client = get_s3_client(&config).await;
    S3BlobStore::new(client, config)
}

fn media() -> MediaUpload {
    MediaUpload {
        content: Bytes::from_static(b"\x89PNG fake image"),
        content_type: Some("image/png".to_string()),
    }
}

async fn mount_bucket(server: &MockServer, status: u16) {
    Mock::given(method("HEAD"))
        .and(path(format!("/{BUCKET}")))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}

async fn mount_put(server: &MockServer, status: u16) {
    Mock::given(method("PUT"))
        .and(path(format!("/{BUCKET}/post-1")))
        .and(LacksQueryKey("acl"))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}

async fn mount_acl(server: &MockServer, status: u16) {
    Mock::given(method("PUT"))
        .and(path(format!("/{BUCKET}/post-1")))
        .and(HasQueryKey("acl"))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}

async fn received(server: &MockServer) -> Vec<(String, bool)> {
    server
        .received_requests()
        .await
        .expect("recording enabled")
        .iter()
        .map(|r| (r.method.to_string(), HasQueryKey("acl").matches(r)))
        .collect()
}

#[tokio::test]
async fn upload_checks_bucket_writes_then_publishes() {
    let server = MockServer::start().await;
    mount_bucket(&server, 200).await;
    mount_put(&server, 200).await;
    mount_acl(&server, 200).await;

    let url = store_for(&server)
        .await
        .upload(media(), BUCKET, "post-1")
        .await
        .expect("upload succeeds");

    assert_eq!(url, format!("{}/{}/post-1", server.uri(), BUCKET));
    assert_eq!(
        received(&server).await,
        vec![
            ("HEAD".to_string(), false),
            ("PUT".to_string(), false),
            ("PUT".to_string(), true),
        ]
    );
}

#[tokio::test]
async fn missing_bucket_stops_before_any_write() {
    let server = MockServer::start().await;
    mount_bucket(&server, 404).await;
    mount_put(&server, 200).await;
    mount_acl(&server, 200).await;

    let store = store_for(&server).await;
    let err = store
        .upload(media(), BUCKET, "post-1")
        .await
        .expect_err("bucket missing");
    assert!(matches!(err, StorageError::Unavailable { .. }), "got {err:?}");
    assert!(matches!(AppError::from(err), AppError::StorageUnavailable(_)));

    let health = store.health_check(BUCKET).await;
    assert!(matches!(health, Err(StorageError::Unavailable { .. })));

    assert!(received(&server).await.iter().all(|(m, _)| m == "HEAD"));
}

#[tokio::test]
async fn rejected_write_skips_the_acl() {
    let server = MockServer::start().await;
    mount_bucket(&server, 200).await;
    mount_put(&server, 403).await;
    mount_acl(&server, 200).await;

    let err = store_for(&server)
        .await
        .upload(media(), BUCKET, "post-1")
        .await
        .expect_err("write refused");
    assert!(matches!(err, StorageError::UploadFailed { .. }), "got {err:?}");
    assert!(matches!(AppError::from(err), AppError::UploadFailed(_)));

    assert!(received(&server).await.iter().all(|(_, acl)| !acl));
}

#[tokio::test]
async fn rejected_acl_is_reported_separately() {
    let server = MockServer::start().await;
    mount_bucket(&server, 200).await;
    mount_put(&server, 200).await;
    mount_acl(&server, 403).await;

    let err = store_for(&server)
        .await
        .upload(media(), BUCKET, "post-1")
        .await
        .expect_err("acl refused");
    assert!(matches!(err, StorageError::AclFailed { .. }), "got {err:?}");
    assert!(matches!(AppError::from(err), AppError::AclFailed(_)));
}

#[tokio::test]
async fn reachable_bucket_passes_the_health_check() {
    let server = MockServer::start().await;
    mount_bucket(&server, 200).await;

    store_for(&server)
        .await
        .health_check(BUCKET)
        .await
        .expect("bucket reachable");
}
