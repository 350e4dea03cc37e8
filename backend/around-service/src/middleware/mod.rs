/// Bearer-token gate for write endpoints
use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error, HttpMessage, ResponseError,
};
use futures_util::future::LocalBoxFuture;
use std::future::{ready, Ready};
use std::rc::Rc;

use crate::error::AppError;
use crate::security::JwtKeys;

/// Username of the principal proven by the request's token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser(pub String);

/// JWT Authentication Middleware
pub struct JwtAuthMiddleware {
    keys: JwtKeys,
}

impl JwtAuthMiddleware {
    pub fn new(keys: JwtKeys) -> Self {
        Self { keys }
    }
}

impl<S, B> Transform<S, ServiceRequest> for JwtAuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = JwtAuthMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(JwtAuthMiddlewareService {
            service: Rc::new(service),
            keys: self.keys.clone(),
        }))
    }
}

pub struct JwtAuthMiddlewareService<S> {
    service: Rc<S>,
    keys: JwtKeys,
}

impl<S, B> Service<ServiceRequest> for JwtAuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let keys = self.keys.clone();

        Box::pin(async move {
            match authenticate(&keys, &req) {
                Ok(user) => {
                    req.extensions_mut().insert(user);
                    service.call(req).await.map(ServiceResponse::map_into_left_body)
                }
                // Answered here so outer layers (CORS) still decorate the 401
                Err(err) => {
                    tracing::warn!("JWT validation failed: {}", err);
                    Ok(req.into_response(err.error_response()).map_into_right_body())
                }
            }
        })
    }
}

fn authenticate(keys: &JwtKeys, req: &ServiceRequest) -> Result<AuthenticatedUser, AppError> {
    let auth_header = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("Missing Authorization header".into()))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::Unauthorized("Authorization must use Bearer scheme".into()))?;

    let claims = keys.validate(token)?;
    Ok(AuthenticatedUser(claims.username))
}

impl actix_web::FromRequest for AuthenticatedUser {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(
        req: &actix_web::HttpRequest,
        _payload: &mut actix_web::dev::Payload,
    ) -> Self::Future {
        match req.extensions().get::<AuthenticatedUser>() {
            Some(user) => ready(Ok(user.clone())),
            None => ready(Err(
                AppError::Unauthorized("User not authenticated".into()).into()
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{http::StatusCode, test, web, App, HttpResponse};

    async fn whoami(user: AuthenticatedUser) -> HttpResponse {
        HttpResponse::Ok().body(user.0)
    }

    fn keys() -> JwtKeys {
        JwtKeys::from_secret("test-secret", 24)
    }

    #[actix_web::test]
    async fn valid_token_exposes_username() {
        let app = test::init_service(
            App::new().service(
                web::resource("/whoami")
                    .wrap(JwtAuthMiddleware::new(keys()))
                    .route(web::get().to(whoami)),
            ),
        )
        .await;

        let token = keys().issue("alice").expect("issue");
        let req = test::TestRequest::get()
            .uri("/whoami")
            .insert_header(("Authorization", format!("Bearer {token}")))
            .to_request();
        let body = test::call_and_read_body(&app, req).await;
        assert_eq!(body, "alice");
    }

    #[actix_web::test]
    async fn missing_header_is_unauthorized() {
        let app = test::init_service(
            App::new().service(
                web::resource("/whoami")
                    .wrap(JwtAuthMiddleware::new(keys()))
                    .route(web::get().to(whoami)),
            ),
        )
        .await;

        let req = test::TestRequest::get().uri("/whoami").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn wrong_scheme_is_unauthorized() {
        let app = test::init_service(
            App::new().service(
                web::resource("/whoami")
                    .wrap(JwtAuthMiddleware::new(keys()))
                    .route(web::get().to(whoami)),
            ),
        )
        .await;

        let token = keys().issue("alice").expect("issue");
        let req = test::TestRequest::get()
            .uri("/whoami")
            .insert_header(("Authorization", format!("Token {token}")))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }
}
