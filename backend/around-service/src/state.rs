use crate::services::{AccountService, PostService, ProximityService};

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub posts: PostService,
    pub proximity: ProximityService,
    pub accounts: AccountService,
    /// Largest accepted `image` part, in bytes
    pub max_media_bytes: usize,
}
