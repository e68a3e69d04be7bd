use actix_web::{Responder, get, web};
use common::{error::Res, http::Success};

use crate::middleware::auth::AuthedUser;

/// Returns the authenticated caller's profile.
///
/// The auth middleware has already resolved (and, on first request,
/// created) the profile, so this handler only echoes it back.
///
/// # Output
/// - Success: the caller's `UserProfile` as JSON
/// - Error: 401 from the middleware when the bearer token is missing
///   or invalid
#[get("/profile")]
async fn get_profile(user: web::ReqData<AuthedUser>) -> Res<impl Responder> {
    Success::ok(user.profile.clone())
}
