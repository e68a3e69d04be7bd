use std::{future::Future, pin::Pin, sync::Arc};

use actix_web::{
    Error, HttpMessage, HttpResponse,
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
};
use db::models::profile::UserRole;
use futures::future::{Ready, ok};

use super::auth::AuthedUser;

/// Rejects callers whose stored profile does not carry the ADMIN role.
/// Must sit inside [`super::auth::AuthMiddleware`], which populates the
/// request extensions this guard reads.
pub struct AdminGuard;

impl<S, B> Transform<S, ServiceRequest> for AdminGuard
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: actix_web::body::MessageBody + 'static,
{
    type Response = ServiceResponse<actix_web::body::BoxBody>;
    type Error = Error;
    type Transform = AdminGuardService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(AdminGuardService {
            service: Arc::new(service),
        })
    }
}

pub struct AdminGuardService<S> {
    service: Arc<S>,
}

impl<S, B> Service<ServiceRequest> for AdminGuardService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: actix_web::body::MessageBody + 'static,
{
    type Response = ServiceResponse<actix_web::body::BoxBody>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let is_admin = {
            let extensions = req.extensions();
            extensions
                .get::<AuthedUser>()
                .map(|user| user.profile.role == UserRole::Admin)
                .unwrap_or(false)
        };

        if is_admin {
            let fut = self.service.call(req);
            Box::pin(async move { fut.await.map(|res| res.map_into_boxed_body()) })
        } else {
            Box::pin(async move {
                let response = HttpResponse::Forbidden()
                    .json(serde_json::json!({"error": "Forbidden: Admin access required"}))
                    .map_into_boxed_body();
                Ok(req.into_response(response))
            })
        }
    }
}
