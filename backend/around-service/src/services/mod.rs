pub mod accounts;
pub mod elasticsearch;
pub mod id;
pub mod posts;
pub mod proximity;
pub mod storage;

pub use accounts::AccountService;
pub use elasticsearch::{ElasticsearchIndex, IndexError, SearchIndex};
pub use posts::PostService;
pub use proximity::ProximityService;
pub use storage::{BlobStore, MediaUpload, S3BlobStore, StorageError};
