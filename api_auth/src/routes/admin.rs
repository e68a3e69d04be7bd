use std::sync::Arc;

use actix_web::{Responder, get, web};
use common::{error::Res, http::Success};
use db::store::ProfileStore;
use identity::provider::IdentityProvider;

use crate::services;

/// Lists every known identity with its stored profile.
///
/// Guarded by the admin middleware; identities without a stored profile
/// are reported with FREE defaults.
#[get("/users")]
async fn get_users(
    identity: web::Data<Arc<dyn IdentityProvider>>,
    store: web::Data<Arc<dyn ProfileStore>>,
) -> Res<impl Responder> {
    let users =
        services::profile::list_known_users(store.get_ref().as_ref(), identity.get_ref().as_ref())
            .await?;
    Success::ok(users)
}
