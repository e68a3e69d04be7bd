mod support;

use std::sync::Arc;

use api_subs::reconcile::driver::Reconciler;
use common::error::AppError;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use support::{MapCustomers, MemoryStore, StaticIdentity};

const SECRET: &str = "whsec_test";

fn reconciler() -> Reconciler {
    Reconciler::new(
        Arc::new(MemoryStore::new(Vec::new())),
        Arc::new(StaticIdentity::new()),
        Arc::new(MapCustomers::new(&[])),
        SECRET.to_string(),
    )
}

/// Builds a signature header the way the processor does: HMAC-SHA256
/// over `{timestamp}.{payload}` with the endpoint secret.
fn sign(payload: &str, secret: &str) -> String {
    let timestamp = chrono::Utc::now().timestamp();
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).unwrap();
    mac.update(format!("{timestamp}.{payload}").as_bytes());
    let digest = hex::encode(mac.finalize().into_bytes());
    format!("t={timestamp},v1={digest}")
}

#[actix_web::test]
async fn tampered_payload_is_rejected() {
    let driver = reconciler();
    let signature = sign(r#"{"amount": 100}"#, SECRET);

    let result = driver.handle(r#"{"amount": 99999}"#, &signature).await;

    assert!(matches!(result, Err(AppError::BadRequest(_))));
}

#[actix_web::test]
async fn signature_from_a_different_secret_is_rejected() {
    let driver = reconciler();
    let payload = r#"{"id": "evt_1"}"#;
    let signature = sign(payload, "whsec_other");

    let result = driver.handle(payload, &signature).await;

    assert!(matches!(result, Err(AppError::BadRequest(_))));
}

#[actix_web::test]
async fn header_without_v1_component_is_rejected() {
    let driver = reconciler();

    let result = driver.handle(r#"{"id": "evt_1"}"#, "t=12345").await;

    assert!(matches!(result, Err(AppError::BadRequest(_))));
}

#[actix_web::test]
async fn garbage_header_is_rejected() {
    let driver = reconciler();

    let result = driver
        .handle(r#"{"id": "evt_1"}"#, "not-a-signature-header")
        .await;

    assert!(matches!(result, Err(AppError::BadRequest(_))));
}
