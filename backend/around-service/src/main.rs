/// around-service HTTP server
///
/// Accepts location-tagged posts with optional media and answers
/// geo-radius searches over them. Posts live in Elasticsearch; media lives
/// in an S3-compatible bucket.
use actix_web::{middleware::Logger, web, HttpServer};
use anyhow::Context;
use around_service::{
    build_app,
    config::Config,
    models::Distance,
    security::JwtKeys,
    services::{
        elasticsearch::{post_index_mappings, user_index_mappings},
        storage::get_s3_client,
        AccountService, BlobStore, ElasticsearchIndex, PostService, ProximityService,
        S3BlobStore, SearchIndex,
    },
    AppState,
};
use resilience::{search_index_config, RetryConfig};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "around_service=info,actix_web=info".into());

    if std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json")) {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_target(true),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = Config::from_env().context("Failed to load configuration")?;

    tracing::info!(
        elasticsearch = %config.elasticsearch.url,
        bucket = %config.media.bucket,
        "Starting around-service"
    );

    // Preset backoff, retry count from config
    let read_retry = RetryConfig {
        max_retries: config.elasticsearch.max_retries,
        ..search_index_config().retry.unwrap_or_default()
    };
    let es = ElasticsearchIndex::new(
        &config.elasticsearch.url,
        Duration::from_secs(config.elasticsearch.timeout_secs),
        read_retry,
        config.search.max_results,
    )
    .context("Failed to build Elasticsearch client")?;

    if let Err(e) = es.health_check().await {
        tracing::warn!(error = %e, "Elasticsearch ping failed; continuing");
    }

    es.ensure_schema(&config.elasticsearch.post_index, &post_index_mappings())
        .await
        .context("Failed to prepare post index")?;
    es.ensure_schema(&config.elasticsearch.user_index, &user_index_mappings())
        .await
        .context("Failed to prepare user index")?;

    let index: Arc<dyn SearchIndex> = Arc::new(es);

    let s3_client = get_s3_client(&config.media).await;
    let blobs = S3BlobStore::new(s3_client, config.media.clone());
    if let Err(e) = blobs.health_check(&config.media.bucket).await {
        tracing::warn!(error = %e, "Media bucket check failed; uploads will fail until it is reachable");
    }
    let blobs: Arc<dyn BlobStore> = Arc::new(blobs);

    let keys = JwtKeys::from_secret(&config.auth.jwt_secret, config.auth.token_ttl_hours);

    let state = AppState {
        posts: PostService::new(
            index.clone(),
            blobs,
            config.elasticsearch.post_index.clone(),
            config.media.bucket.clone(),
        ),
        proximity: ProximityService::new(
            index.clone(),
            config.elasticsearch.post_index.clone(),
            Distance::km(config.search.default_range_km),
        ),
        accounts: AccountService::new(
            index,
            config.elasticsearch.user_index.clone(),
            keys.clone(),
        ),
        max_media_bytes: config.media.max_bytes,
    };

    let bind_addr = format!("{}:{}", config.app.host, config.app.port);
    tracing::info!("Listening on {}", bind_addr);

    let state = web::Data::new(state);
    HttpServer::new(move || build_app(state.clone(), keys.clone()).wrap(Logger::default()))
        .bind(&bind_addr)
        .with_context(|| format!("Failed to bind {bind_addr}"))?
        .run()
        .await
        .context("HTTP server error")?;

    tracing::info!("around-service shut down");
    Ok(())
}
