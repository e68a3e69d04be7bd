use async_trait::async_trait;
use common::error::Res;

use crate::claims::{DecodedClaims, IdentityUser};

/// Identity-provider seam.
///
/// Covers the four operations this backend consumes: bearer-token
/// verification, the role custom-claim mirror, and account
/// lookup/listing. Injected as a trait object so tests can substitute
/// a double for the remote provider.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Verifies a bearer ID token and returns its decoded claims.
    async fn verify_token(&self, token: &str) -> Res<DecodedClaims>;

    /// Mirrors the given role into the provider's custom claims so that
    /// subsequent token verifications carry it without a store read.
    async fn set_role_claim(&self, uid: &str, role: &str) -> Res<()>;

    /// Fetches a single account record, `None` if the uid is unknown.
    async fn get_user(&self, uid: &str) -> Res<Option<IdentityUser>>;

    /// Lists all account records known to the provider.
    async fn list_users(&self) -> Res<Vec<IdentityUser>>;
}
