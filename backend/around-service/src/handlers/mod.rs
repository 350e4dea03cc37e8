use actix_web::{web, HttpResponse};

use crate::middleware::JwtAuthMiddleware;
use crate::security::JwtKeys;

pub mod auth;
pub mod posts;
pub mod search;

pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

/// Register every route. Only `/post` requires a token.
pub fn configure(cfg: &mut web::ServiceConfig, keys: JwtKeys) {
    cfg.route("/health", web::get().to(health))
        .route("/signup", web::post().to(auth::signup))
        .route("/login", web::post().to(auth::login))
        .route("/search", web::get().to(search::search))
        .service(
            web::resource("/post")
                .wrap(JwtAuthMiddleware::new(keys))
                .route(web::post().to(posts::create_post)),
        );
}
