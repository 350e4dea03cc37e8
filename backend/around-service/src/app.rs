/// Application assembly shared by the binary and the HTTP tests
use actix_cors::Cors;
use actix_web::{
    body::MessageBody,
    dev::{ServiceFactory, ServiceRequest, ServiceResponse},
    http::header,
    middleware::DefaultHeaders,
    web, App, Error,
};

use crate::handlers;
use crate::security::JwtKeys;
use crate::state::AppState;

/// Allow-all CORS answering with a literal `*` origin.
pub fn cors() -> Cors {
    Cors::default()
        .allow_any_origin()
        .send_wildcard()
        .allow_any_method()
        .allow_any_header()
}

/// Routes, state and CORS. Callers add logging on top.
///
/// `Cors` only answers requests that carry an `Origin`; the default header
/// covers the rest.
pub fn build_app(
    state: web::Data<AppState>,
    keys: JwtKeys,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl MessageBody>,
        Error = Error,
        InitError = (),
    >,
> {
    App::new()
        .wrap(DefaultHeaders::new().add((header::ACCESS_CONTROL_ALLOW_ORIGIN, "*")))
        .wrap(cors())
        .app_data(state)
        .configure(move |cfg| handlers::configure(cfg, keys))
}
