use std::sync::Arc;

use actix_web::dev::HttpServiceFactory;
use actix_web::web;
use db::store::ProfileStore;
use identity::provider::IdentityProvider;

use middleware::admin::AdminGuard;
use middleware::auth::AuthMiddleware;

pub mod middleware {
    pub mod admin;
    pub mod auth;
}

mod routes {
    pub(crate) mod admin;
    pub(crate) mod user;
}

mod services {
    pub(crate) mod profile;
}

// Auth middleware
pub fn auth_middleware(
    identity: Arc<dyn IdentityProvider>,
    store: Arc<dyn ProfileStore>,
) -> AuthMiddleware {
    AuthMiddleware::new(identity, store)
}

pub fn mount_user() -> actix_web::Scope {
    web::scope("/user").service(routes::user::get_profile)
}

pub fn mount_admin() -> impl HttpServiceFactory {
    web::scope("/admin")
        .wrap(AdminGuard)
        .service(routes::admin::get_users)
}
