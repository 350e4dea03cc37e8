use actix_web::{web, HttpResponse};

use crate::error::Result;
use crate::models::Credentials;
use crate::state::AppState;

/// POST /signup
pub async fn signup(
    state: web::Data<AppState>,
    body: web::Json<Credentials>,
) -> Result<HttpResponse> {
    state.accounts.signup(&body.username, &body.password).await?;

    Ok(HttpResponse::Ok()
        .content_type("text/plain; charset=utf-8")
        .body("User added successfully."))
}

/// POST /login
///
/// Answers with the bare token as the body.
pub async fn login(
    state: web::Data<AppState>,
    body: web::Json<Credentials>,
) -> Result<HttpResponse> {
    let token = state.accounts.login(&body.username, &body.password).await?;
    tracing::info!(username = %body.username, "Login succeeded");

    Ok(HttpResponse::Ok()
        .content_type("text/plain; charset=utf-8")
        .body(token))
}
