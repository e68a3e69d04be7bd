use std::sync::Arc;

use common::error::Res;
use db::{dtos::profile::SubscriptionUpdate, store::ProfileStore};
use identity::provider::IdentityProvider;
use serde::Serialize;

use super::classify::{Outcome, classify};
use super::event::ExternalEvent;
use super::resolve::{CustomerDirectory, resolve};
use crate::services;

/// What the processor gets back for a webhook call. Everything except a
/// signature failure reports `received: true`, so the processor never
/// enters a redelivery storm for events this system cannot self-correct
/// by retrying.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WebhookOutcome {
    pub received: bool,
    pub processed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl WebhookOutcome {
    pub fn processed() -> Self {
        WebhookOutcome {
            received: true,
            processed: true,
            reason: None,
        }
    }

    pub fn unprocessed(reason: &str) -> Self {
        WebhookOutcome {
            received: true,
            processed: false,
            reason: Some(reason.to_string()),
        }
    }
}

/// Orchestrates webhook reconciliation: verify, resolve, classify,
/// apply. Collaborators are injected at construction so tests can run
/// the driver against in-memory doubles.
#[derive(Clone)]
pub struct Reconciler {
    store: Arc<dyn ProfileStore>,
    identity: Arc<dyn IdentityProvider>,
    customers: Arc<dyn CustomerDirectory>,
    webhook_secret: String,
}

impl Reconciler {
    pub fn new(
        store: Arc<dyn ProfileStore>,
        identity: Arc<dyn IdentityProvider>,
        customers: Arc<dyn CustomerDirectory>,
        webhook_secret: String,
    ) -> Self {
        Reconciler {
            store,
            identity,
            customers,
            webhook_secret,
        }
    }

    /// Verifies the signature over the exact raw payload and processes
    /// the event. Fails the whole call only when verification fails.
    pub async fn handle(&self, payload: &str, signature: &str) -> Res<WebhookOutcome> {
        let event = services::pay::construct_event(payload, signature, &self.webhook_secret)?;
        self.process(ExternalEvent::from_stripe(event)).await
    }

    pub async fn process(&self, event: ExternalEvent) -> Res<WebhookOutcome> {
        let Some(uid) = resolve(&event.subject, self.customers.as_ref()).await? else {
            log::warn!("no internal user id resolved for {} event", event.kind);
            return Ok(WebhookOutcome::unprocessed("identifier not resolved"));
        };

        match classify(&event.kind, &event.subject) {
            Outcome::Ignore => {
                log::info!("unhandled event type: {}", event.kind);
                Ok(WebhookOutcome::unprocessed("unhandled event type"))
            }
            Outcome::Tentative { status } => {
                if let Err(error) = self
                    .store
                    .merge_checkout(&uid, &status, event.subject.subscription_id.as_deref())
                    .await
                {
                    log::error!("checkout merge for {} failed: {}", uid, error);
                }
                Ok(WebhookOutcome::processed())
            }
            Outcome::Apply { role, status } => {
                let update = SubscriptionUpdate {
                    role,
                    status,
                    subscription_id: event.subject.subscription_id.clone(),
                    customer_id: event.subject.customer.clone(),
                };

                // Two independent phases. Each failure is captured on its
                // own and the call still reports success: the event has
                // been received, and the claim mirror self-heals on the
                // next reconciliation.
                if let Err(error) = self.store.apply_subscription(&uid, &update).await {
                    log::error!("profile write for {} failed: {}", uid, error);
                }
                if let Err(error) = self.identity.set_role_claim(&uid, role.as_str()).await {
                    log::error!("role claim mirror for {} failed: {}", uid, error);
                }

                log::info!("user {} reconciled to {} ({})", uid, role, update.status);
                Ok(WebhookOutcome::processed())
            }
        }
    }
}
