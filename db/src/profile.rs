use common::error::{AppError, Res};
use sqlx::{Executor, Postgres};

use crate::{
    dtos::profile::{NewProfile, SubscriptionUpdate},
    models::profile::UserProfile,
};

pub async fn get_profile<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    uid: &str,
) -> Res<Option<UserProfile>> {
    sqlx::query_as::<_, UserProfile>("SELECT * FROM users WHERE uid = $1")
        .bind(uid)
        .fetch_optional(executor)
        .await
        .map_err(AppError::from)
}

pub async fn list_profiles<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
) -> Res<Vec<UserProfile>> {
    sqlx::query_as::<_, UserProfile>("SELECT * FROM users ORDER BY created_at")
        .fetch_all(executor)
        .await
        .map_err(AppError::from)
}

/// Inserts a fresh profile with role `free`. A concurrent first request
/// for the same uid is harmless: the no-op conflict update returns the
/// row the other request created.
pub async fn insert_profile<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    data: NewProfile,
) -> Res<UserProfile> {
    sqlx::query_as::<_, UserProfile>(
        r#"
        INSERT INTO users (uid, email, display_name, photo_url, role)
        VALUES ($1, $2, $3, $4, 'free')
        ON CONFLICT (uid) DO UPDATE SET uid = EXCLUDED.uid
        RETURNING *
        "#,
    )
    .bind(data.uid)
    .bind(data.email)
    .bind(data.display_name)
    .bind(data.photo_url)
    .fetch_one(executor)
    .await
    .map_err(AppError::from)
}

/// Applies an authoritative subscription event: role and status always
/// win, subscription/customer ids win only when the event carried them.
pub async fn apply_subscription<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    uid: &str,
    update: &SubscriptionUpdate,
) -> Res<()> {
    let result = sqlx::query(
        r#"
        UPDATE users
        SET role = $2,
            subscription_status = $3,
            stripe_subscription_id = COALESCE($4, stripe_subscription_id),
            stripe_customer_id = COALESCE($5, stripe_customer_id)
        WHERE uid = $1
        "#,
    )
    .bind(uid)
    .bind(update.role)
    .bind(&update.status)
    .bind(&update.subscription_id)
    .bind(&update.customer_id)
    .execute(executor)
    .await?;

    if result.rows_affected() == 0 {
        log::warn!("subscription update for unknown profile {uid}");
    }
    Ok(())
}

/// Tentative checkout merge: status is written, but an already stored
/// subscription id is never overwritten and the role is untouched.
pub async fn merge_checkout<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    uid: &str,
    status: &str,
    subscription_id: Option<&str>,
) -> Res<()> {
    let result = sqlx::query(
        r#"
        UPDATE users
        SET subscription_status = $2,
            stripe_subscription_id = COALESCE(stripe_subscription_id, $3)
        WHERE uid = $1
        "#,
    )
    .bind(uid)
    .bind(status)
    .bind(subscription_id)
    .execute(executor)
    .await?;

    if result.rows_affected() == 0 {
        log::warn!("checkout merge for unknown profile {uid}");
    }
    Ok(())
}

pub async fn set_stripe_customer<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    uid: &str,
    customer_id: &str,
) -> Res<()> {
    sqlx::query("UPDATE users SET stripe_customer_id = $2 WHERE uid = $1")
        .bind(uid)
        .bind(customer_id)
        .execute(executor)
        .await?;
    Ok(())
}
