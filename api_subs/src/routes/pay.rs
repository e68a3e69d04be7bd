use std::sync::Arc;

use actix_web::{HttpRequest, Responder, post, web};
use api_auth::middleware::auth::AuthedUser;
use common::{
    env_config::Config,
    error::{AppError, Res},
    http::Success,
};
use db::store::ProfileStore;

use crate::dtos::pay::CheckoutSessionResponse;
use crate::reconcile::driver::Reconciler;
use crate::services;

/// Handles Stripe webhook events for subscription reconciliation.
///
/// # Input
/// - `payload`: Raw bytes of the webhook event, exactly as Stripe sent
///   them (any re-serialization would invalidate the signature)
/// - `req`: HTTP request carrying the `stripe-signature` header
/// - `reconciler`: The reconciliation driver with its collaborators
///
/// # Output
/// - `200 {received: true, ...}` on every outcome except signature
///   failure; unresolved identifiers and unhandled event types are
///   reported as `processed: false` with a reason
/// - `400` when the signature header is missing or verification fails
///
/// # Note
/// This endpoint is not called from the frontend. Stripe's servers call
/// it when subscription lifecycle events occur; configure the URL and
/// the signing secret in the Stripe Dashboard under Webhooks.
#[post("/stripe")]
async fn post_webhook(
    payload: web::Bytes,
    req: HttpRequest,
    reconciler: web::Data<Reconciler>,
) -> Res<impl Responder> {
    let signature = match req.headers().get("stripe-signature") {
        Some(signature) => signature.to_str().unwrap_or(""),
        None => return Err(AppError::BadRequest("Stripe signature missing".to_string())),
    };

    let payload = std::str::from_utf8(&payload)
        .map_err(|_| AppError::BadRequest("Webhook payload is not valid UTF-8".to_string()))?;

    let outcome = reconciler.handle(payload, signature).await?;
    Success::ok(outcome)
}

/// Creates a checkout session for upgrading the caller to premium.
///
/// Looks up the caller's Stripe customer, lazily creating one (tagged
/// with the internal user id) on first checkout, then opens a
/// subscription-mode session for the configured premium price.
///
/// # Output
/// - Success: `{id, url}` of the checkout session to redirect to
/// - Error: 401 from the middleware, or 500 when Stripe rejects the call
#[post("/create-checkout-session")]
async fn post_checkout_session(
    user: web::ReqData<AuthedUser>,
    config: web::Data<Arc<Config>>,
    client: web::Data<stripe::Client>,
    store: web::Data<Arc<dyn ProfileStore>>,
) -> Res<impl Responder> {
    let profile = &user.profile;

    let customer_id = match &profile.stripe_customer_id {
        Some(id) => id.clone(),
        None => {
            let customer = common::stripe::create_customer(
                client.get_ref(),
                &profile.uid,
                profile.email.as_deref(),
            )
            .await?;
            store
                .set_stripe_customer(&profile.uid, customer.id.as_str())
                .await?;
            customer.id.to_string()
        }
    };

    let session = services::pay::create_checkout_session(
        client.get_ref(),
        &customer_id,
        &config.stripe_premium_price_id,
        &config.app_url,
        &profile.uid,
    )
    .await?;

    Success::ok(CheckoutSessionResponse {
        id: session.id.to_string(),
        url: session.url.unwrap_or_default(),
    })
}
