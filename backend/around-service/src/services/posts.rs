/// Post ingestion
///
/// Creating a post is a single best-effort operation over two stores:
/// media is uploaded first, then the document is indexed. The index never
/// references a blob that failed to upload. An index failure after a
/// successful upload leaves the blob in the bucket; it is logged, not
/// rolled back.
use std::sync::Arc;

use crate::error::Result;
use crate::models::{Location, Post, PostId};
use crate::services::elasticsearch::SearchIndex;
use crate::services::id::new_post_id;
use crate::services::storage::{BlobStore, MediaUpload};

const POST_DOC_TYPE: &str = "post";

#[derive(Clone)]
pub struct PostService {
    index: Arc<dyn SearchIndex>,
    blobs: Arc<dyn BlobStore>,
    post_index: String,
    media_bucket: String,
}

impl PostService {
    pub fn new(
        index: Arc<dyn SearchIndex>,
        blobs: Arc<dyn BlobStore>,
        post_index: impl Into<String>,
        media_bucket: impl Into<String>,
    ) -> Self {
        Self {
            index,
            blobs,
            post_index: post_index.into(),
            media_bucket: media_bucket.into(),
        }
    }

    pub async fn create_post(
        &self,
        author: &str,
        message: &str,
        location: Location,
        media: Option<MediaUpload>,
    ) -> Result<PostId> {
        let id = new_post_id();
        let object_name = id.to_string();

        let url = match media {
            Some(media) => {
                let url = self
                    .blobs
                    .upload(media, &self.media_bucket, &object_name)
                    .await
                    .map_err(|e| {
                        tracing::error!(post_id = %id, error = %e, "Media upload failed; post not created");
                        e
                    })?;
                Some(url)
            }
            None => None,
        };

        let has_media = url.is_some();
        let post = Post {
            id,
            user: author.to_string(),
            message: message.to_string(),
            location,
            url,
        };
        let document = serde_json::to_value(&post)?;

        if let Err(e) = self
            .index
            .index_document(&self.post_index, POST_DOC_TYPE, &object_name, &document)
            .await
        {
            if has_media {
                tracing::warn!(
                    post_id = %id,
                    bucket = %self.media_bucket,
                    error = %e,
                    "Index write failed after media upload; object left orphaned"
                );
            } else {
                tracing::error!(post_id = %id, error = %e, "Index write failed");
            }
            return Err(e.into());
        }

        tracing::info!(post_id = %id, author = %author, has_media, "Post created");
        Ok(id)
    }
}
