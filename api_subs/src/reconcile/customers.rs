use std::collections::HashMap;

use async_trait::async_trait;
use common::error::Res;
use stripe::Client;

use super::resolve::CustomerDirectory;

/// Production [`CustomerDirectory`] backed by the Stripe API.
pub struct StripeCustomers {
    client: Client,
}

impl StripeCustomers {
    pub fn new(client: Client) -> Self {
        StripeCustomers { client }
    }
}

#[async_trait]
impl CustomerDirectory for StripeCustomers {
    async fn customer_metadata(&self, customer_id: &str) -> Res<HashMap<String, String>> {
        let customer = common::stripe::get_customer(&self.client, customer_id).await?;
        Ok(customer.metadata.unwrap_or_default())
    }
}
