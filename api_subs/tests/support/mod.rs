use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use common::error::{AppError, Res};
use db::dtos::profile::{NewProfile, SubscriptionUpdate};
use db::models::profile::{UserProfile, UserRole};
use db::store::ProfileStore;
use identity::claims::{DecodedClaims, IdentityUser};
use identity::provider::IdentityProvider;

use api_subs::reconcile::resolve::CustomerDirectory;

pub fn profile(uid: &str) -> UserProfile {
    UserProfile {
        uid: uid.to_string(),
        email: Some(format!("{uid}@example.com")),
        display_name: None,
        photo_url: None,
        role: UserRole::Free,
        stripe_customer_id: None,
        subscription_status: None,
        stripe_subscription_id: None,
        created_at: chrono::Utc::now().naive_utc(),
    }
}

/// In-memory stand-in for the Postgres store, with the same merge
/// semantics as the SQL: authoritative updates overwrite ids only when
/// the event carries them, checkout merges never overwrite an existing
/// subscription id.
pub struct MemoryStore {
    profiles: Mutex<HashMap<String, UserProfile>>,
    fail_apply: bool,
}

impl MemoryStore {
    pub fn new(seed: Vec<UserProfile>) -> Self {
        MemoryStore {
            profiles: Mutex::new(seed.into_iter().map(|p| (p.uid.clone(), p)).collect()),
            fail_apply: false,
        }
    }

    pub fn failing_apply(seed: Vec<UserProfile>) -> Self {
        MemoryStore {
            fail_apply: true,
            ..Self::new(seed)
        }
    }

    pub fn profile(&self, uid: &str) -> Option<UserProfile> {
        self.profiles.lock().unwrap().get(uid).cloned()
    }
}

#[async_trait]
impl ProfileStore for MemoryStore {
    async fn get(&self, uid: &str) -> Res<Option<UserProfile>> {
        Ok(self.profile(uid))
    }

    async fn insert(&self, data: NewProfile) -> Res<UserProfile> {
        let mut profiles = self.profiles.lock().unwrap();
        let created = UserProfile {
            uid: data.uid.clone(),
            email: data.email,
            display_name: data.display_name,
            photo_url: data.photo_url,
            role: UserRole::Free,
            stripe_customer_id: None,
            subscription_status: None,
            stripe_subscription_id: None,
            created_at: chrono::Utc::now().naive_utc(),
        };
        let profile = profiles.entry(data.uid).or_insert(created);
        Ok(profile.clone())
    }

    async fn list(&self) -> Res<Vec<UserProfile>> {
        Ok(self.profiles.lock().unwrap().values().cloned().collect())
    }

    async fn apply_subscription(&self, uid: &str, update: &SubscriptionUpdate) -> Res<()> {
        if self.fail_apply {
            return Err(AppError::Internal("store unavailable".to_string()));
        }
        let mut profiles = self.profiles.lock().unwrap();
        let Some(profile) = profiles.get_mut(uid) else {
            return Ok(());
        };
        profile.role = update.role;
        profile.subscription_status = Some(update.status.clone());
        if update.subscription_id.is_some() {
            profile.stripe_subscription_id = update.subscription_id.clone();
        }
        if update.customer_id.is_some() {
            profile.stripe_customer_id = update.customer_id.clone();
        }
        Ok(())
    }

    async fn merge_checkout(
        &self,
        uid: &str,
        status: &str,
        subscription_id: Option<&str>,
    ) -> Res<()> {
        let mut profiles = self.profiles.lock().unwrap();
        let Some(profile) = profiles.get_mut(uid) else {
            return Ok(());
        };
        profile.subscription_status = Some(status.to_string());
        if profile.stripe_subscription_id.is_none() {
            profile.stripe_subscription_id = subscription_id.map(str::to_string);
        }
        Ok(())
    }

    async fn set_stripe_customer(&self, uid: &str, customer_id: &str) -> Res<()> {
        let mut profiles = self.profiles.lock().unwrap();
        if let Some(profile) = profiles.get_mut(uid) {
            profile.stripe_customer_id = Some(customer_id.to_string());
        }
        Ok(())
    }
}

/// Identity-provider double that records role-claim mirror calls and
/// can be told to fail them.
pub struct StaticIdentity {
    pub claims_set: Mutex<Vec<(String, String)>>,
    pub fail_claims: bool,
}

impl StaticIdentity {
    pub fn new() -> Self {
        StaticIdentity {
            claims_set: Mutex::new(Vec::new()),
            fail_claims: false,
        }
    }

    pub fn failing() -> Self {
        StaticIdentity {
            claims_set: Mutex::new(Vec::new()),
            fail_claims: true,
        }
    }

    pub fn recorded_claims(&self) -> Vec<(String, String)> {
        self.claims_set.lock().unwrap().clone()
    }
}

#[async_trait]
impl IdentityProvider for StaticIdentity {
    async fn verify_token(&self, _token: &str) -> Res<DecodedClaims> {
        Err(AppError::Unauthorized("Invalid token".to_string()))
    }

    async fn set_role_claim(&self, uid: &str, role: &str) -> Res<()> {
        if self.fail_claims {
            return Err(AppError::Internal("provider unreachable".to_string()));
        }
        self.claims_set
            .lock()
            .unwrap()
            .push((uid.to_string(), role.to_string()));
        Ok(())
    }

    async fn get_user(&self, _uid: &str) -> Res<Option<IdentityUser>> {
        Ok(None)
    }

    async fn list_users(&self) -> Res<Vec<IdentityUser>> {
        Ok(Vec::new())
    }
}

/// Customer directory backed by a map, counting lookups.
pub struct MapCustomers {
    records: HashMap<String, HashMap<String, String>>,
    lookups: Mutex<u32>,
}

impl MapCustomers {
    pub fn new(records: &[(&str, &str)]) -> Self {
        MapCustomers {
            records: records
                .iter()
                .map(|(customer, uid)| {
                    (
                        customer.to_string(),
                        HashMap::from([("userId".to_string(), uid.to_string())]),
                    )
                })
                .collect(),
            lookups: Mutex::new(0),
        }
    }

    pub fn lookup_count(&self) -> u32 {
        *self.lookups.lock().unwrap()
    }
}

#[async_trait]
impl CustomerDirectory for MapCustomers {
    async fn customer_metadata(&self, customer_id: &str) -> Res<HashMap<String, String>> {
        *self.lookups.lock().unwrap() += 1;
        Ok(self.records.get(customer_id).cloned().unwrap_or_default())
    }
}
