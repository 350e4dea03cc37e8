/// Object storage for post media
///
/// Media objects are named by post id, so uploads never overwrite another
/// post's object. After the body is written the object is made public-read
/// and its public URL becomes the post's media reference.
use crate::config::MediaConfig;
use async_trait::async_trait;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::ObjectCannedAcl;
use aws_sdk_s3::Client;
use bytes::Bytes;
use resilience::with_timeout;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("bucket {bucket} is unavailable: {reason}")]
    Unavailable { bucket: String, reason: String },
    #[error("upload of {object} failed: {reason}")]
    UploadFailed { object: String, reason: String },
    #[error("could not set public-read on {object}: {reason}")]
    AclFailed { object: String, reason: String },
}

/// Media attached to a post
#[derive(Debug, Clone)]
pub struct MediaUpload {
    pub content: Bytes,
    pub content_type: Option<String>,
}

#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Write `media` as `bucket/object`, make it publicly readable and
    /// return its public URL.
    async fn upload(
        &self,
        media: MediaUpload,
        bucket: &str,
        object: &str,
    ) -> Result<String, StorageError>;

    /// Cheap reachability check used at startup.
    async fn health_check(&self, bucket: &str) -> Result<(), StorageError>;
}

/// S3 (or S3-compatible) implementation of [`BlobStore`]
pub struct S3BlobStore {
    client: Client,
    config: MediaConfig,
    timeout: Duration,
}

impl S3BlobStore {
    pub fn new(client: Client, config: MediaConfig) -> Self {
        let timeout = Duration::from_secs(config.timeout_secs);
        Self {
            client,
            config,
            timeout,
        }
    }

    async fn check_bucket(&self, bucket: &str) -> Result<(), StorageError> {
        let unavailable = |reason: String| StorageError::Unavailable {
            bucket: bucket.to_string(),
            reason,
        };

        with_timeout(
            self.timeout,
            self.client.head_bucket().bucket(bucket).send(),
        )
        .await
        .map_err(|e| unavailable(e.to_string()))?
        .map_err(|e| unavailable(DisplayErrorContext(&e).to_string()))?;

        Ok(())
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    async fn upload(
        &self,
        media: MediaUpload,
        bucket: &str,
        object: &str,
    ) -> Result<String, StorageError> {
        self.check_bucket(bucket).await?;

        let size = media.content.len();
        let upload_failed = |reason: String| StorageError::UploadFailed {
            object: object.to_string(),
            reason,
        };

        let mut request = self
            .client
            .put_object()
            .bucket(bucket)
            .key(object)
            .body(ByteStream::from(media.content));
        if let Some(content_type) = media.content_type.as_deref() {
            request = request.content_type(content_type);
        }

        with_timeout(self.timeout, request.send())
            .await
            .map_err(|e| upload_failed(e.to_string()))?
            .map_err(|e| upload_failed(DisplayErrorContext(&e).to_string()))?;

        let acl_failed = |reason: String| StorageError::AclFailed {
            object: object.to_string(),
            reason,
        };

        with_timeout(
            self.timeout,
            self.client
                .put_object_acl()
                .bucket(bucket)
                .key(object)
                .acl(ObjectCannedAcl::PublicRead)
                .send(),
        )
        .await
        .map_err(|e| acl_failed(e.to_string()))?
        .map_err(|e| acl_failed(DisplayErrorContext(&e).to_string()))?;

        tracing::info!(bucket = %bucket, object = %object, size, "Uploaded media object");

        Ok(self.config.object_url(bucket, object))
    }

    async fn health_check(&self, bucket: &str) -> Result<(), StorageError> {
        self.check_bucket(bucket).await
    }
}

/// Initialize AWS S3 client from config
///
/// Explicit credentials win; otherwise the default provider chain applies.
pub async fn get_s3_client(config: &MediaConfig) -> Client {
    use aws_sdk_s3::config::{Credentials, Region};

    let mut aws_config_builder = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(Region::new(config.region.clone()));

    if let (Some(access_key_id), Some(secret_access_key)) =
        (&config.access_key_id, &config.secret_access_key)
    {
        let credentials = Credentials::new(
            access_key_id,
            secret_access_key,
            None,
            None,
            "around_service_s3",
        );
        aws_config_builder = aws_config_builder.credentials_provider(credentials);
    }

    if let Some(endpoint) = &config.endpoint {
        aws_config_builder = aws_config_builder.endpoint_url(endpoint);
    }

    let aws_config = aws_config_builder.load().await;

    let s3_config = aws_sdk_s3::config::Builder::from(&aws_config)
        .force_path_style(config.path_style)
        .build();

    Client::from_conf(s3_config)
}
