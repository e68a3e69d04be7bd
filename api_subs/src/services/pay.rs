use std::collections::HashMap;

use common::error::{AppError, Res};
use common::stripe::USER_ID_KEY;
use stripe::{
    CheckoutSession, CheckoutSessionMode, Client, CreateCheckoutSession, CustomerId, Event,
    Webhook,
};

/// Creates an event for the webhook based on the request payload and signature.
/// Requires the webhook secret key; the payload must be the exact raw
/// bytes Stripe signed.
pub fn construct_event(payload: &str, signature: &str, webhook_secret: &str) -> Res<Event> {
    match Webhook::construct_event(payload, signature, webhook_secret) {
        Ok(event) => Ok(event),
        Err(e) => {
            log::error!("Error constructing webhook event: {}", e);
            Err(AppError::BadRequest(format!("Webhook Error: {}", e)))
        }
    }
}

/// Creates a subscription-mode checkout session for the premium plan.
/// The session carries the internal user id in its metadata so the
/// completion event can be resolved without a customer lookup.
pub async fn create_checkout_session(
    client: &Client,
    customer_id: &str,
    price_id: &str,
    app_url: &str,
    uid: &str,
) -> Res<CheckoutSession> {
    let customer = customer_id.parse::<CustomerId>().map_err(|e| {
        AppError::Internal(format!(
            "Failed to parse customer id: {}. {}",
            customer_id, e
        ))
    })?;

    let success_url = format!("{}/app?payment_success=true", app_url);
    let cancel_url = format!("{}/app?payment_canceled=true", app_url);

    let params = CreateCheckoutSession {
        payment_method_types: Some(vec![stripe::CreateCheckoutSessionPaymentMethodTypes::Card]),
        line_items: Some(vec![stripe::CreateCheckoutSessionLineItems {
            price: Some(price_id.to_string()),
            quantity: Some(1),
            ..Default::default()
        }]),
        mode: Some(CheckoutSessionMode::Subscription),
        success_url: Some(success_url.as_str()),
        cancel_url: Some(cancel_url.as_str()),
        customer: Some(customer),
        metadata: Some(HashMap::from([(
            USER_ID_KEY.to_string(),
            uid.to_string(),
        )])),
        ..Default::default()
    };

    CheckoutSession::create(client, params)
        .await
        .map_err(AppError::from)
}
