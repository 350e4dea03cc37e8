/// Configuration management for around-service
///
/// Loads configuration from environment variables with sensible defaults.
/// Only the token signing secret is mandatory.
use serde::Deserialize;

/// Longest token lifetime accepted from the environment (one year)
const MAX_TOKEN_TTL_HOURS: i64 = 24 * 365;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),
}

#[derive(Clone, Debug, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub elasticsearch: ElasticsearchConfig,
    pub media: MediaConfig,
    pub auth: AuthConfig,
    pub search: SearchConfig,
}

#[derive(Clone, Debug, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ElasticsearchConfig {
    pub url: String,
    pub post_index: String,
    pub user_index: String,
    /// Per-call timeout for index requests
    pub timeout_secs: u64,
    /// Retries for read-only queries; writes are never retried
    pub max_retries: u32,
}

#[derive(Clone, Debug, Deserialize)]
pub struct MediaConfig {
    pub bucket: String,
    pub region: String,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    /// Custom endpoint for S3-compatible storage (MinIO)
    pub endpoint: Option<String>,
    /// Public base URL (CDN) used when building media references
    pub public_base_url: Option<String>,
    pub path_style: bool,
    pub max_bytes: usize,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug, Deserialize)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
}

#[derive(Clone, Debug, Deserialize)]
pub struct SearchConfig {
    pub default_range_km: f64,
    /// Upper bound on hits returned by one radius query
    pub max_results: usize,
}

impl MediaConfig {
    /// Publicly resolvable URL of an object in `bucket`.
    pub fn object_url(&self, bucket: &str, key: &str) -> String {
        match (&self.public_base_url, &self.endpoint) {
            (Some(base), _) => format!("{}/{}/{}", base.trim_end_matches('/'), bucket, key),
            (None, Some(endpoint)) if self.path_style => {
                format!("{}/{}/{}", endpoint.trim_end_matches('/'), bucket, key)
            }
            _ if self.path_style => {
                format!("https://s3.{}.amazonaws.com/{}/{}", self.region, bucket, key)
            }
            _ => format!("https://{}.s3.{}.amazonaws.com/{}", bucket, self.region, key),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        Ok(Config {
            app: AppConfig {
                host: var("AROUND_HOST", "0.0.0.0"),
                port: var("AROUND_PORT", "8080").parse().unwrap_or(8080),
            },
            elasticsearch: ElasticsearchConfig {
                url: var("ELASTICSEARCH_URL", "http://localhost:9200"),
                post_index: var("POST_INDEX", "around"),
                user_index: var("USER_INDEX", "around_users"),
                timeout_secs: var("STORE_CALL_TIMEOUT_SECS", "10").parse().unwrap_or(10),
                max_retries: var("SEARCH_MAX_RETRIES", "2").parse().unwrap_or(2),
            },
            media: MediaConfig {
                bucket: var("MEDIA_BUCKET", "around-media"),
                region: var("AWS_REGION", "us-east-1"),
                access_key_id: lookup("AWS_ACCESS_KEY_ID"),
                secret_access_key: lookup("AWS_SECRET_ACCESS_KEY"),
                endpoint: lookup("S3_ENDPOINT"),
                public_base_url: lookup("MEDIA_PUBLIC_BASE_URL"),
                path_style: var("S3_PATH_STYLE", "false").parse().unwrap_or(false),
                max_bytes: var("MAX_MEDIA_BYTES", "20971520")
                    .parse()
                    .unwrap_or(20 * 1024 * 1024),
                timeout_secs: var("MEDIA_UPLOAD_TIMEOUT_SECS", "60").parse().unwrap_or(60),
            },
            auth: AuthConfig {
                jwt_secret: lookup("JWT_SECRET")
                    .filter(|s| !s.is_empty())
                    .ok_or(ConfigError::Missing("JWT_SECRET"))?,
                token_ttl_hours: var("TOKEN_TTL_HOURS", "24")
                    .parse()
                    .ok()
                    .filter(|h| (1..=MAX_TOKEN_TTL_HOURS).contains(h))
                    .unwrap_or(24),
            },
            search: SearchConfig {
                default_range_km: var("DEFAULT_SEARCH_RANGE_KM", "200")
                    .parse()
                    .ok()
                    .filter(|km: &f64| km.is_finite() && *km >= 0.0)
                    .unwrap_or(200.0),
                max_results: var("SEARCH_MAX_RESULTS", "1000").parse().unwrap_or(1000),
            },
        })
    }
}
