/// Resilience helpers for calls to external stores
///
/// This library wraps remote calls with:
/// - **Timeout**: every call gets an upper bound on how long it may suspend
/// - **Retry**: exponential backoff with jitter, for idempotent reads only
/// - **Presets**: tuned settings for the search index
///
/// # Example: bounded index query
///
/// ```rust,no_run
/// use resilience::{presets, with_retry, with_timeout};
///
/// #[tokio::main]
/// async fn main() {
///     let config = presets::search_index_config();
///
///     let result = with_retry(config.retry.clone().unwrap_or_default(), || async {
///         with_timeout(config.timeout.duration, async { Ok::<_, String>(()) }).await
///     })
///     .await;
/// }
/// ```

pub mod presets;
pub mod retry;
pub mod timeout;

pub use presets::{search_index_config, ServiceConfig};
pub use retry::{with_retry, with_retry_if, RetryConfig, RetryError};
pub use timeout::{with_timeout, TimeoutConfig, TimeoutError};
