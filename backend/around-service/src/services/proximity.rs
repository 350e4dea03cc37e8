use std::sync::Arc;

use crate::error::Result;
use crate::models::{Distance, Location, Post};
use crate::services::elasticsearch::SearchIndex;

/// Radius search over the post index.
///
/// Results come back in index order; nothing here re-sorts by distance.
#[derive(Clone)]
pub struct ProximityService {
    index: Arc<dyn SearchIndex>,
    post_index: String,
    default_radius: Distance,
}

impl ProximityService {
    pub fn new(
        index: Arc<dyn SearchIndex>,
        post_index: impl Into<String>,
        default_radius: Distance,
    ) -> Self {
        Self {
            index,
            post_index: post_index.into(),
            default_radius,
        }
    }

    /// Posts within `radius` of `center`, or within the default radius
    /// when none is given.
    ///
    /// Documents that do not deserialize into a [`Post`] are skipped.
    pub async fn search(&self, center: Location, radius: Option<Distance>) -> Result<Vec<Post>> {
        let radius = radius.unwrap_or(self.default_radius);

        let documents = self
            .index
            .query_by_radius(&self.post_index, center, radius)
            .await?;

        let total = documents.len();
        let posts: Vec<Post> = documents
            .into_iter()
            .filter_map(|doc| match serde_json::from_value::<Post>(doc) {
                Ok(post) => Some(post),
                Err(e) => {
                    tracing::debug!(error = %e, "Skipping undecodable post document");
                    None
                }
            })
            .collect();

        let skipped = total - posts.len();
        if skipped > 0 {
            tracing::warn!(skipped, "Search skipped documents that failed to deserialize");
        }

        tracing::debug!(
            lat = center.lat,
            lon = center.lon,
            radius = %radius,
            hits = posts.len(),
            "Proximity search complete"
        );

        Ok(posts)
    }
}
