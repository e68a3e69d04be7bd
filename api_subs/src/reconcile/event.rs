use std::collections::HashMap;

use stripe::{Event, EventObject, EventType};

/// The closed set of processor event types this backend reacts to.
/// Everything else lands in `Other` and is reported as unhandled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    CheckoutCompleted,
    SubscriptionCreated,
    SubscriptionUpdated,
    SubscriptionDeleted,
    Other(String),
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventKind::CheckoutCompleted => f.write_str("checkout.session.completed"),
            EventKind::SubscriptionCreated => f.write_str("customer.subscription.created"),
            EventKind::SubscriptionUpdated => f.write_str("customer.subscription.updated"),
            EventKind::SubscriptionDeleted => f.write_str("customer.subscription.deleted"),
            EventKind::Other(name) => f.write_str(name),
        }
    }
}

/// The record embedded in a processor event, reduced to the fields the
/// resolver and classifier need.
#[derive(Debug, Clone, Default)]
pub struct Subject {
    /// Metadata attached to the subject itself; the authoritative
    /// carrier of the internal user id when present.
    pub metadata: HashMap<String, String>,
    /// Processor-assigned customer reference, if the subject carries one.
    pub customer: Option<String>,
    /// Subscription status string as reported by the processor.
    pub status: Option<String>,
    /// Payment status of a checkout session.
    pub payment_status: Option<String>,
    /// Subscription id, where the subject knows it.
    pub subscription_id: Option<String>,
}

/// A verified processor event. Ephemeral: classified, applied,
/// discarded — never persisted verbatim.
#[derive(Debug, Clone)]
pub struct ExternalEvent {
    pub kind: EventKind,
    pub subject: Subject,
}

impl ExternalEvent {
    /// Reduces a verified Stripe event to the internal representation.
    /// Unknown event types and subject shapes degrade to `Other` with an
    /// empty subject rather than failing the call.
    pub fn from_stripe(event: Event) -> Self {
        let kind = match event.type_ {
            EventType::CheckoutSessionCompleted => EventKind::CheckoutCompleted,
            EventType::CustomerSubscriptionCreated => EventKind::SubscriptionCreated,
            EventType::CustomerSubscriptionUpdated => EventKind::SubscriptionUpdated,
            EventType::CustomerSubscriptionDeleted => EventKind::SubscriptionDeleted,
            other => EventKind::Other(other.to_string()),
        };

        let subject = match event.data.object {
            EventObject::CheckoutSession(session) => Subject {
                metadata: session.metadata.unwrap_or_default(),
                customer: session.customer.as_ref().map(|c| c.id().to_string()),
                status: None,
                payment_status: Some(session.payment_status.to_string()),
                subscription_id: session.subscription.as_ref().map(|s| s.id().to_string()),
            },
            EventObject::Subscription(subscription) => Subject {
                metadata: subscription.metadata,
                customer: Some(subscription.customer.id().to_string()),
                status: Some(subscription.status.to_string()),
                payment_status: None,
                subscription_id: Some(subscription.id.to_string()),
            },
            EventObject::Invoice(invoice) => Subject {
                metadata: invoice.metadata.unwrap_or_default(),
                customer: invoice.customer.as_ref().map(|c| c.id().to_string()),
                status: invoice.status.map(|s| s.to_string()),
                payment_status: None,
                subscription_id: invoice.subscription.as_ref().map(|s| s.id().to_string()),
            },
            _ => Subject::default(),
        };

        ExternalEvent { kind, subject }
    }
}
