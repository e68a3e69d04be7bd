use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Access tier assigned to a user.
///
/// The role is a pure function of the most recently reconciled
/// subscription status; it must never be `Premium` while the status is
/// in a non-entitled state. `Admin` is assigned out of band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "VARCHAR", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Free,
    Premium,
    Admin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Free => "free",
            UserRole::Premium => "premium",
            UserRole::Admin => "admin",
        }
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "free" => Ok(UserRole::Free),
            "premium" => Ok(UserRole::Premium),
            "admin" => Ok(UserRole::Admin),
            _ => Err(format!("Unknown role: {s}")),
        }
    }
}

/// Persisted mirror of an identity-provider account plus the
/// subscription state reconciled from processor events.
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub uid: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
    #[serde(rename = "photoURL")]
    pub photo_url: Option<String>,
    pub role: UserRole,
    pub stripe_customer_id: Option<String>,
    pub subscription_status: Option<String>,
    pub stripe_subscription_id: Option<String>,
    pub created_at: NaiveDateTime,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn role_roundtrips_through_strings() {
        for role in [UserRole::Free, UserRole::Premium, UserRole::Admin] {
            assert_eq!(UserRole::from_str(role.as_str()).unwrap(), role);
        }
        assert!(UserRole::from_str("superuser").is_err());
    }

    #[test]
    fn role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&UserRole::Premium).unwrap(), "\"premium\"");
    }

    #[test]
    fn profile_serializes_with_provider_field_names() {
        let profile = UserProfile {
            uid: "u1".into(),
            email: Some("a@b.c".into()),
            display_name: None,
            photo_url: None,
            role: UserRole::Free,
            stripe_customer_id: None,
            subscription_status: None,
            stripe_subscription_id: None,
            created_at: chrono::DateTime::from_timestamp(0, 0).unwrap().naive_utc(),
        };
        let json = serde_json::to_value(&profile).unwrap();
        assert!(json.get("displayName").is_some());
        assert!(json.get("photoURL").is_some());
        assert!(json.get("stripeCustomerId").is_some());
    }
}
