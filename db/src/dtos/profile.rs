use crate::models::profile::UserRole;

/// Fields for the lazy creation of a profile on first authenticated
/// request. The role always starts at `Free`.
#[derive(Debug, Clone)]
pub struct NewProfile {
    pub uid: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
}

/// Authoritative subscription state derived from a processor event.
///
/// `subscription_id` and `customer_id` overwrite the stored values when
/// present and leave them untouched when absent.
#[derive(Debug, Clone)]
pub struct SubscriptionUpdate {
    pub role: UserRole,
    pub status: String,
    pub subscription_id: Option<String>,
    pub customer_id: Option<String>,
}
