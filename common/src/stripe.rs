use stripe::{Client, CreateCustomer, Customer, CustomerId};

use crate::error::{AppError, Res};

/// Metadata key under which the internal user identifier travels on
/// Stripe customers, checkout sessions and subscriptions.
pub const USER_ID_KEY: &str = "userId";

pub fn create_client(secret_key: &str) -> Client {
    Client::new(secret_key)
}

/// Retrieve customer object based on customer ID.
pub async fn get_customer(client: &Client, customer_id: &str) -> Res<Customer> {
    let id = customer_id.parse::<CustomerId>().map_err(|e| {
        AppError::Internal(format!(
            "Failed to parse customer id: {}. {}",
            customer_id, e
        ))
    })?;
    Customer::retrieve(client, &id, &[])
        .await
        .map_err(AppError::from)
}

/// Creates a Stripe customer carrying the internal user id in its
/// metadata, so webhook events referencing the customer can be resolved
/// back to the user.
pub async fn create_customer(client: &Client, uid: &str, email: Option<&str>) -> Res<Customer> {
    let params = CreateCustomer {
        email,
        metadata: Some(std::collections::HashMap::from([(
            USER_ID_KEY.to_string(),
            uid.to_string(),
        )])),
        ..Default::default()
    };

    Customer::create(client, params)
        .await
        .map_err(AppError::from)
}
