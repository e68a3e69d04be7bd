use db::models::profile::UserRole;

use super::event::{EventKind, Subject};

/// Statuses that entitle a user to the premium tier.
const ENTITLED_STATUSES: [&str; 2] = ["active", "trialing"];

/// What a classified event asks the driver to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Authoritative subscription state: write role and status.
    Apply { role: UserRole, status: String },
    /// Checkout completed: merge a tentative status, touch nothing else.
    /// The authoritative transition arrives with the subsequent
    /// subscription event, so no role is granted here.
    Tentative { status: String },
    /// Not an event this backend reacts to.
    Ignore,
}

/// Maps an event type and its subject's status to the target role and
/// the subscription status to persist.
pub fn classify(kind: &EventKind, subject: &Subject) -> Outcome {
    match kind {
        EventKind::SubscriptionCreated | EventKind::SubscriptionUpdated => {
            let status = subject.status.clone().unwrap_or_default();
            let role = if ENTITLED_STATUSES.contains(&status.as_str()) {
                UserRole::Premium
            } else {
                UserRole::Free
            };
            Outcome::Apply { role, status }
        }
        EventKind::SubscriptionDeleted => Outcome::Apply {
            role: UserRole::Free,
            // the processor reports "canceled" here, but whatever it
            // says is what gets persisted
            status: subject
                .status
                .clone()
                .unwrap_or_else(|| "canceled".to_string()),
        },
        EventKind::CheckoutCompleted => {
            if subject.payment_status.as_deref() == Some("paid") {
                Outcome::Tentative {
                    status: "active".to_string(),
                }
            } else {
                Outcome::Ignore
            }
        }
        EventKind::Other(_) => Outcome::Ignore,
    }
}
