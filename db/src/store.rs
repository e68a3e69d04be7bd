use std::sync::Arc;

use async_trait::async_trait;
use common::error::Res;
use sqlx::PgPool;

use crate::{
    dtos::profile::{NewProfile, SubscriptionUpdate},
    models::profile::UserProfile,
    profile,
};

/// Persistence seam for user profiles.
///
/// The reconciliation driver and the auth middleware only see this
/// trait, so tests can substitute an in-memory double for Postgres.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn get(&self, uid: &str) -> Res<Option<UserProfile>>;
    async fn insert(&self, data: NewProfile) -> Res<UserProfile>;
    async fn list(&self) -> Res<Vec<UserProfile>>;
    async fn apply_subscription(&self, uid: &str, update: &SubscriptionUpdate) -> Res<()>;
    async fn merge_checkout(
        &self,
        uid: &str,
        status: &str,
        subscription_id: Option<&str>,
    ) -> Res<()>;
    async fn set_stripe_customer(&self, uid: &str, customer_id: &str) -> Res<()>;
}

pub struct PgProfileStore {
    pool: Arc<PgPool>,
}

impl PgProfileStore {
    pub fn new(pool: Arc<PgPool>) -> Self {
        PgProfileStore { pool }
    }
}

#[async_trait]
impl ProfileStore for PgProfileStore {
    async fn get(&self, uid: &str) -> Res<Option<UserProfile>> {
        profile::get_profile(&*self.pool, uid).await
    }

    async fn insert(&self, data: NewProfile) -> Res<UserProfile> {
        profile::insert_profile(&*self.pool, data).await
    }

    async fn list(&self) -> Res<Vec<UserProfile>> {
        profile::list_profiles(&*self.pool).await
    }

    async fn apply_subscription(&self, uid: &str, update: &SubscriptionUpdate) -> Res<()> {
        profile::apply_subscription(&*self.pool, uid, update).await
    }

    async fn merge_checkout(
        &self,
        uid: &str,
        status: &str,
        subscription_id: Option<&str>,
    ) -> Res<()> {
        profile::merge_checkout(&*self.pool, uid, status, subscription_id).await
    }

    async fn set_stripe_customer(&self, uid: &str, customer_id: &str) -> Res<()> {
        profile::set_stripe_customer(&*self.pool, uid, customer_id).await
    }
}
