use serde::Serialize;

/// Claims extracted from a verified bearer ID token.
#[derive(Debug, Clone, Serialize)]
pub struct DecodedClaims {
    pub uid: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub picture: Option<String>,
}

/// An account record as reported by the identity provider.
#[derive(Debug, Clone)]
pub struct IdentityUser {
    pub uid: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
}
