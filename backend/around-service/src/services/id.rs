use crate::models::PostId;
use uuid::Uuid;

/// Allocate an identifier for a new post.
///
/// Random 128-bit (UUID v4); collisions are not checked for.
pub fn new_post_id() -> PostId {
    Uuid::new_v4()
}
