use std::{future::Future, pin::Pin, sync::Arc};

use actix_web::{
    Error, HttpMessage, HttpResponse,
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
};
use db::{models::profile::UserProfile, store::ProfileStore};
use futures::future::{Ready, ok};
use identity::{claims::DecodedClaims, provider::IdentityProvider};

use crate::services;

/// The verified caller, stashed into request extensions by
/// [`AuthMiddleware`] and read back by the routes and the admin guard.
#[derive(Debug, Clone)]
pub struct AuthedUser {
    pub claims: DecodedClaims,
    pub profile: UserProfile,
}

/// Verifies the bearer ID token on every request and resolves the
/// caller's profile, creating it with role FREE on first sight.
pub struct AuthMiddleware {
    identity: Arc<dyn IdentityProvider>,
    store: Arc<dyn ProfileStore>,
}

impl AuthMiddleware {
    pub fn new(identity: Arc<dyn IdentityProvider>, store: Arc<dyn ProfileStore>) -> Self {
        AuthMiddleware { identity, store }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: actix_web::body::MessageBody + 'static,
{
    type Response = ServiceResponse<actix_web::body::BoxBody>;
    type Error = Error;
    type Transform = AuthMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(AuthMiddlewareService {
            service: Arc::new(service),
            identity: Arc::clone(&self.identity),
            store: Arc::clone(&self.store),
        })
    }
}

pub struct AuthMiddlewareService<S> {
    service: Arc<S>,
    identity: Arc<dyn IdentityProvider>,
    store: Arc<dyn ProfileStore>,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: actix_web::body::MessageBody + 'static,
{
    type Response = ServiceResponse<actix_web::body::BoxBody>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let token_value = req
            .headers()
            .get("Authorization")
            .and_then(|header| header.to_str().ok())
            .and_then(|header| {
                if header.starts_with("Bearer ") {
                    Some(header[7..].to_string())
                } else {
                    None
                }
            });

        let identity = Arc::clone(&self.identity);
        let store = Arc::clone(&self.store);
        let srv = Arc::clone(&self.service);

        Box::pin(async move {
            let Some(token) = token_value else {
                // no token passed - 401
                let response = HttpResponse::Unauthorized()
                    .json(serde_json::json!({"error": "No authorization token provided"}))
                    .map_into_boxed_body();
                return Ok(req.into_response(response));
            };

            let claims = match identity.verify_token(&token).await {
                Ok(claims) => claims,
                Err(_) => {
                    let response = HttpResponse::Unauthorized()
                        .json(serde_json::json!({"error": "Invalid token"}))
                        .map_into_boxed_body();
                    return Ok(req.into_response(response));
                }
            };

            // resolve the profile here so the role comes from the store,
            // not from possibly stale custom claims
            match services::profile::get_or_create(store.as_ref(), identity.as_ref(), &claims)
                .await
            {
                Ok(profile) => {
                    req.extensions_mut().insert(AuthedUser { claims, profile });
                    srv.call(req).await.map(|res| res.map_into_boxed_body())
                }
                Err(error) => Ok(req.into_response(error.to_http_response())),
            }
        })
    }
}
