use std::collections::HashMap;

use async_trait::async_trait;
use common::error::Res;
use common::stripe::USER_ID_KEY;

use super::event::Subject;

/// Billing-side lookup of customer records, injected so tests can
/// substitute a double for the processor.
#[async_trait]
pub trait CustomerDirectory: Send + Sync {
    /// Returns the metadata of the given customer record; empty when the
    /// customer carries none (or has been deleted).
    async fn customer_metadata(&self, customer_id: &str) -> Res<HashMap<String, String>>;
}

/// Determines the internal user id for an event subject.
///
/// Metadata on the subject itself is authoritative and cheap, so it is
/// tried first. Subscription and invoice events do not always carry the
/// application's own identifier, only a processor-assigned customer
/// reference; that indirection is resolved by fetching the customer
/// record and reading its metadata. `None` is a normal outcome, not an
/// error: some events structurally cannot carry the identifier.
pub async fn resolve(subject: &Subject, customers: &dyn CustomerDirectory) -> Res<Option<String>> {
    if let Some(uid) = subject.metadata.get(USER_ID_KEY) {
        if !uid.is_empty() {
            return Ok(Some(uid.clone()));
        }
    }

    if let Some(customer_id) = &subject.customer {
        let metadata = customers.customer_metadata(customer_id).await?;
        if let Some(uid) = metadata.get(USER_ID_KEY) {
            if !uid.is_empty() {
                return Ok(Some(uid.clone()));
            }
        }
    }

    Ok(None)
}
