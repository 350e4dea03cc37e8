/// Preset configuration for the search index
use crate::retry::RetryConfig;
use crate::timeout::TimeoutConfig;
use std::time::Duration;

/// Configuration bundle for a store type
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub timeout: TimeoutConfig,
    pub retry: Option<RetryConfig>,
}

/// Search index (Elasticsearch)
///
/// - Timeout: 10s
/// - Retry: 2 attempts for reads; callers must not retry writes with this
pub fn search_index_config() -> ServiceConfig {
    ServiceConfig {
        timeout: TimeoutConfig {
            duration: Duration::from_secs(10),
        },
        retry: Some(RetryConfig {
            max_retries: 2,
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_secs(2),
            backoff_multiplier: 2.0,
            jitter: true,
        }),
    }
}
