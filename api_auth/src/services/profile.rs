use std::collections::HashMap;

use common::error::Res;
use db::{
    dtos::profile::NewProfile,
    models::profile::{UserProfile, UserRole},
    store::ProfileStore,
};
use identity::{
    claims::{DecodedClaims, IdentityUser},
    provider::IdentityProvider,
};

/// Returns the stored profile for the verified caller, creating it with
/// role FREE on first authenticated request. Defaults come from the
/// provider's account record when it can be fetched, falling back to
/// the token claims.
pub async fn get_or_create(
    store: &dyn ProfileStore,
    identity: &dyn IdentityProvider,
    claims: &DecodedClaims,
) -> Res<UserProfile> {
    if let Some(profile) = store.get(&claims.uid).await? {
        return Ok(profile);
    }

    let record = identity.get_user(&claims.uid).await.unwrap_or_else(|e| {
        log::warn!("account record fetch for {} failed: {}", claims.uid, e);
        None
    });

    let (email, display_name, photo_url) = match record {
        Some(user) => (
            user.email.or_else(|| claims.email.clone()),
            user.display_name.or_else(|| claims.name.clone()),
            user.photo_url.or_else(|| claims.picture.clone()),
        ),
        None => (
            claims.email.clone(),
            claims.name.clone(),
            claims.picture.clone(),
        ),
    };

    store
        .insert(NewProfile {
            uid: claims.uid.clone(),
            email,
            display_name,
            photo_url,
        })
        .await
}

/// Lists every known identity with its stored profile; identities the
/// store has not seen yet appear with FREE defaults.
pub async fn list_known_users(
    store: &dyn ProfileStore,
    identity: &dyn IdentityProvider,
) -> Res<Vec<UserProfile>> {
    let mut stored: HashMap<String, UserProfile> = store
        .list()
        .await?
        .into_iter()
        .map(|profile| (profile.uid.clone(), profile))
        .collect();

    let mut users = Vec::new();
    for user in identity.list_users().await? {
        users.push(
            stored
                .remove(&user.uid)
                .unwrap_or_else(|| placeholder_profile(user)),
        );
    }
    // profiles the identity listing lagged behind on still count
    users.extend(stored.into_values());

    Ok(users)
}

fn placeholder_profile(user: IdentityUser) -> UserProfile {
    UserProfile {
        uid: user.uid,
        email: user.email,
        display_name: user.display_name,
        photo_url: user.photo_url,
        role: UserRole::Free,
        stripe_customer_id: None,
        subscription_status: None,
        stripe_subscription_id: None,
        created_at: chrono::Utc::now().naive_utc(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use common::error::AppError;
    use db::dtos::profile::SubscriptionUpdate;
    use std::sync::Mutex;

    struct MemoryStore {
        profiles: Mutex<HashMap<String, UserProfile>>,
    }

    impl MemoryStore {
        fn new() -> Self {
            MemoryStore {
                profiles: Mutex::new(HashMap::new()),
            }
        }

        fn with(profile: UserProfile) -> Self {
            let store = Self::new();
            store
                .profiles
                .lock()
                .unwrap()
                .insert(profile.uid.clone(), profile);
            store
        }
    }

    #[async_trait]
    impl ProfileStore for MemoryStore {
        async fn get(&self, uid: &str) -> Res<Option<UserProfile>> {
            Ok(self.profiles.lock().unwrap().get(uid).cloned())
        }

        async fn insert(&self, data: NewProfile) -> Res<UserProfile> {
            let profile = UserProfile {
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
            self.profiles
                .lock()
                .unwrap()
                .insert(data.uid, profile.clone());
            Ok(profile)
        }

        async fn list(&self) -> Res<Vec<UserProfile>> {
            Ok(self.profiles.lock().unwrap().values().cloned().collect())
        }

        async fn apply_subscription(&self, _: &str, _: &SubscriptionUpdate) -> Res<()> {
            unimplemented!("not used by profile service tests")
        }

        async fn merge_checkout(&self, _: &str, _: &str, _: Option<&str>) -> Res<()> {
            unimplemented!("not used by profile service tests")
        }

        async fn set_stripe_customer(&self, _: &str, _: &str) -> Res<()> {
            unimplemented!("not used by profile service tests")
        }
    }

    struct StaticIdentity {
        users: Vec<IdentityUser>,
    }

    #[async_trait]
    impl IdentityProvider for StaticIdentity {
        async fn verify_token(&self, _: &str) -> Res<DecodedClaims> {
            Err(AppError::Unauthorized("not used".to_string()))
        }

        async fn set_role_claim(&self, _: &str, _: &str) -> Res<()> {
            Ok(())
        }

        async fn get_user(&self, uid: &str) -> Res<Option<IdentityUser>> {
            Ok(self.users.iter().find(|user| user.uid == uid).cloned())
        }

        async fn list_users(&self) -> Res<Vec<IdentityUser>> {
            Ok(self.users.clone())
        }
    }

    fn claims(uid: &str) -> DecodedClaims {
        DecodedClaims {
            uid: uid.to_string(),
            email: Some(format!("{uid}@example.com")),
            name: Some("Token Name".to_string()),
            picture: None,
        }
    }

    #[actix_web::test]
    async fn first_request_creates_free_profile() {
        let store = MemoryStore::new();
        let identity = StaticIdentity { users: vec![] };

        let profile = get_or_create(&store, &identity, &claims("u1")).await.unwrap();

        assert_eq!(profile.uid, "u1");
        assert_eq!(profile.role, UserRole::Free);
        assert_eq!(profile.email.as_deref(), Some("u1@example.com"));
        assert!(store.get("u1").await.unwrap().is_some());
    }

    #[actix_web::test]
    async fn provider_record_wins_over_token_claims() {
        let store = MemoryStore::new();
        let identity = StaticIdentity {
            users: vec![IdentityUser {
                uid: "u1".to_string(),
                email: Some("record@example.com".to_string()),
                display_name: Some("Record Name".to_string()),
                photo_url: None,
            }],
        };

        let profile = get_or_create(&store, &identity, &claims("u1")).await.unwrap();

        assert_eq!(profile.email.as_deref(), Some("record@example.com"));
        assert_eq!(profile.display_name.as_deref(), Some("Record Name"));
    }

    #[actix_web::test]
    async fn existing_profile_is_returned_untouched() {
        let mut existing = placeholder_profile(IdentityUser {
            uid: "u1".to_string(),
            email: Some("old@example.com".to_string()),
            display_name: None,
            photo_url: None,
        });
        existing.role = UserRole::Premium;
        let store = MemoryStore::with(existing);
        let identity = StaticIdentity { users: vec![] };

        let profile = get_or_create(&store, &identity, &claims("u1")).await.unwrap();

        assert_eq!(profile.role, UserRole::Premium);
        assert_eq!(profile.email.as_deref(), Some("old@example.com"));
    }

    #[actix_web::test]
    async fn listing_includes_identities_without_profiles() {
        let store = MemoryStore::new();
        store.insert(NewProfile {
            uid: "stored".to_string(),
            email: None,
            display_name: None,
            photo_url: None,
        })
        .await
        .unwrap();
        let identity = StaticIdentity {
            users: vec![
                IdentityUser {
                    uid: "stored".to_string(),
                    email: None,
                    display_name: None,
                    photo_url: None,
                },
                IdentityUser {
                    uid: "fresh".to_string(),
                    email: Some("fresh@example.com".to_string()),
                    display_name: None,
                    photo_url: None,
                },
            ],
        };

        let users = list_known_users(&store, &identity).await.unwrap();

        assert_eq!(users.len(), 2);
        let fresh = users.iter().find(|u| u.uid == "fresh").unwrap();
        assert_eq!(fresh.role, UserRole::Free);
    }
}
