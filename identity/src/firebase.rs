use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::Utc;
use common::env_config::FirebaseConfig;
use common::error::{AppError, Res};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, decode_header, encode,
};
use log::{info, warn};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use crate::claims::{DecodedClaims, IdentityUser};
use crate::provider::IdentityProvider;

const JWKS_URL: &str =
    "https://www.googleapis.com/service_accounts/v1/jwk/securetoken@system.gserviceaccount.com";
const OAUTH_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const IDENTITY_TOOLKIT_URL: &str = "https://identitytoolkit.googleapis.com/v1";
const OAUTH_SCOPE: &str = "https://www.googleapis.com/auth/identitytoolkit";

/// How long fetched signing keys and admin tokens are reused. Tokens
/// carry their own expiry; keys rotate rarely.
const JWKS_TTL: Duration = Duration::from_secs(3600);

#[derive(Debug, Clone, Deserialize)]
struct Jwk {
    kid: String,
    n: String,
    e: String,
}

#[derive(Debug, Deserialize)]
struct JwkSet {
    keys: Vec<Jwk>,
}

/// Claims of a Firebase ID token relevant to this backend.
#[derive(Debug, Deserialize)]
struct IdTokenClaims {
    sub: String,
    email: Option<String>,
    name: Option<String>,
    picture: Option<String>,
}

#[derive(Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiUserInfo {
    local_id: String,
    email: Option<String>,
    display_name: Option<String>,
    photo_url: Option<String>,
    custom_attributes: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountsPage {
    #[serde(default)]
    users: Vec<ApiUserInfo>,
    next_page_token: Option<String>,
}

struct CachedToken {
    value: String,
    expires_at: Instant,
}

/// Firebase-backed implementation of [`IdentityProvider`].
///
/// ID tokens are verified locally against the securetoken JWKS; the
/// admin operations (custom claims, account lookup/listing) go through
/// the identitytoolkit REST surface with a service-account OAuth token.
pub struct FirebaseIdentity {
    client: Client,
    project_id: String,
    client_email: String,
    private_key: String,
    jwks: Mutex<Option<(Instant, HashMap<String, Jwk>)>>,
    token: Mutex<Option<CachedToken>>,
}

impl FirebaseIdentity {
    pub fn new(config: &FirebaseConfig) -> Self {
        FirebaseIdentity {
            client: Client::new(),
            project_id: config.project_id.clone(),
            client_email: config.client_email.clone(),
            private_key: config.private_key.clone(),
            jwks: Mutex::new(None),
            token: Mutex::new(None),
        }
    }

    fn api_url(&self, operation: &str) -> String {
        format!(
            "{}/projects/{}/{}",
            IDENTITY_TOOLKIT_URL, self.project_id, operation
        )
    }

    /// Returns the decoding key for the given key id, refreshing the
    /// cached key set when it is stale or does not contain the id.
    async fn signing_key(&self, kid: &str) -> Res<DecodingKey> {
        {
            let cache = self.jwks.lock().unwrap();
            if let Some((fetched_at, keys)) = cache.as_ref() {
                if fetched_at.elapsed() < JWKS_TTL {
                    if let Some(jwk) = keys.get(kid) {
                        return DecodingKey::from_rsa_components(&jwk.n, &jwk.e)
                            .map_err(AppError::from);
                    }
                }
            }
        }

        let key_set = self
            .client
            .get(JWKS_URL)
            .send()
            .await?
            .json::<JwkSet>()
            .await?;
        let keys: HashMap<String, Jwk> = key_set
            .keys
            .into_iter()
            .map(|jwk| (jwk.kid.clone(), jwk))
            .collect();

        let jwk = keys.get(kid).cloned();
        *self.jwks.lock().unwrap() = Some((Instant::now(), keys));

        let jwk = jwk.ok_or_else(|| {
            AppError::Unauthorized("Identity token signed with unknown key".to_string())
        })?;
        DecodingKey::from_rsa_components(&jwk.n, &jwk.e).map_err(AppError::from)
    }

    /// Exchanges a service-account assertion for an OAuth access token,
    /// reusing the cached token while it is still valid.
    async fn admin_token(&self) -> Res<String> {
        {
            let cache = self.token.lock().unwrap();
            if let Some(cached) = cache.as_ref() {
                if cached.expires_at > Instant::now() {
                    return Ok(cached.value.clone());
                }
            }
        }

        let issued_at = Utc::now().timestamp();
        let assertion = encode(
            &Header::new(Algorithm::RS256),
            &AssertionClaims {
                iss: &self.client_email,
                scope: OAUTH_SCOPE,
                aud: OAUTH_TOKEN_URL,
                iat: issued_at,
                exp: issued_at + 3600,
            },
            &EncodingKey::from_rsa_pem(self.private_key.as_bytes())?,
        )?;

        let response = self
            .client
            .post(OAUTH_TOKEN_URL)
            .form(&[
                ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
                ("assertion", assertion.as_str()),
            ])
            .send()
            .await?;
        let token = expect_ok(response, "service account token exchange")
            .await?
            .json::<TokenResponse>()
            .await?;

        let mut cache = self.token.lock().unwrap();
        *cache = Some(CachedToken {
            value: token.access_token.clone(),
            // refresh a minute early so in-flight requests never carry
            // an expired token
            expires_at: Instant::now() + Duration::from_secs(token.expires_in.saturating_sub(60)),
        });
        Ok(token.access_token)
    }
}

#[async_trait]
impl IdentityProvider for FirebaseIdentity {
    async fn verify_token(&self, token: &str) -> Res<DecodedClaims> {
        let header = decode_header(token)
            .map_err(|e| AppError::Unauthorized(format!("Invalid identity token: {e}")))?;
        let kid = header.kid.ok_or_else(|| {
            AppError::Unauthorized("Identity token missing key id".to_string())
        })?;
        let key = self.signing_key(&kid).await?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[self.project_id.as_str()]);
        validation.set_issuer(&[format!(
            "https://securetoken.google.com/{}",
            self.project_id
        )]);

        let data = decode::<IdTokenClaims>(token, &key, &validation)
            .map_err(|e| AppError::Unauthorized(format!("Invalid identity token: {e}")))?;

        Ok(DecodedClaims {
            uid: data.claims.sub,
            email: data.claims.email,
            name: data.claims.name,
            picture: data.claims.picture,
        })
    }

    async fn set_role_claim(&self, uid: &str, role: &str) -> Res<()> {
        let token = self.admin_token().await?;

        // claims set out of band must survive, so the role is merged
        // into the account's current claims instead of replacing them
        let response = self
            .client
            .post(self.api_url("accounts:lookup"))
            .bearer_auth(&token)
            .json(&serde_json::json!({ "localId": [uid] }))
            .send()
            .await?;
        let page = expect_ok(response, "account lookup")
            .await?
            .json::<AccountsPage>()
            .await?;
        let existing = page
            .users
            .into_iter()
            .next()
            .and_then(|user| user.custom_attributes);
        let custom_attributes = merge_role_claim(existing.as_deref(), role);

        let response = self
            .client
            .post(self.api_url("accounts:update"))
            .bearer_auth(&token)
            .json(&serde_json::json!({
                "localId": uid,
                "customAttributes": custom_attributes,
            }))
            .send()
            .await?;
        expect_ok(response, "custom claim update").await?;

        info!("role claim for {} set to {}", uid, role);
        Ok(())
    }

    async fn get_user(&self, uid: &str) -> Res<Option<IdentityUser>> {
        let token = self.admin_token().await?;

        let response = self
            .client
            .post(self.api_url("accounts:lookup"))
            .bearer_auth(&token)
            .json(&serde_json::json!({ "localId": [uid] }))
            .send()
            .await?;
        let page = expect_ok(response, "account lookup")
            .await?
            .json::<AccountsPage>()
            .await?;

        Ok(page.users.into_iter().next().map(user_from_api))
    }

    async fn list_users(&self) -> Res<Vec<IdentityUser>> {
        let token = self.admin_token().await?;
        let mut users = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut request = self
                .client
                .get(self.api_url("accounts:batchGet"))
                .bearer_auth(&token)
                .query(&[("maxResults", "1000")]);
            if let Some(next) = &page_token {
                request = request.query(&[("nextPageToken", next.as_str())]);
            }

            let page = expect_ok(request.send().await?, "account listing")
                .await?
                .json::<AccountsPage>()
                .await?;
            users.extend(page.users.into_iter().map(user_from_api));

            match page.next_page_token {
                Some(next) if !next.is_empty() => page_token = Some(next),
                _ => break,
            }
        }

        Ok(users)
    }
}

/// Merges the role into an account's existing custom-claims blob.
/// Unparseable or absent claims start from an empty object.
fn merge_role_claim(existing: Option<&str>, role: &str) -> String {
    let mut claims = existing
        .and_then(|raw| {
            serde_json::from_str::<serde_json::Map<String, serde_json::Value>>(raw).ok()
        })
        .unwrap_or_default();
    claims.insert(
        "role".to_string(),
        serde_json::Value::String(role.to_string()),
    );
    serde_json::Value::Object(claims).to_string()
}

fn user_from_api(info: ApiUserInfo) -> IdentityUser {
    IdentityUser {
        uid: info.local_id,
        email: info.email,
        display_name: info.display_name,
        photo_url: info.photo_url,
    }
}

async fn expect_ok(response: reqwest::Response, context: &str) -> Res<reqwest::Response> {
    if response.status() == StatusCode::OK {
        return Ok(response);
    }
    let error_body = response
        .json::<serde_json::Value>()
        .await
        .unwrap_or_else(|_| serde_json::json!({"error": {"message": "unknown error"}}));
    let message = error_body["error"]["message"]
        .as_str()
        .unwrap_or("unknown error")
        .to_string();
    warn!("{} failed: {}", context, message);
    Err(AppError::Internal(format!("{context} failed: {message}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_response_maps_to_identity_user() {
        let page: AccountsPage = serde_json::from_str(
            r#"{
                "users": [{
                    "localId": "u1",
                    "email": "u1@example.com",
                    "displayName": "User One",
                    "photoUrl": "https://example.com/u1.png"
                }]
            }"#,
        )
        .unwrap();

        let user = user_from_api(page.users.into_iter().next().unwrap());
        assert_eq!(user.uid, "u1");
        assert_eq!(user.email.as_deref(), Some("u1@example.com"));
        assert_eq!(user.display_name.as_deref(), Some("User One"));
        assert_eq!(user.photo_url.as_deref(), Some("https://example.com/u1.png"));
    }

    #[test]
    fn empty_lookup_response_deserializes() {
        let page: AccountsPage = serde_json::from_str("{}").unwrap();
        assert!(page.users.is_empty());
        assert!(page.next_page_token.is_none());
    }

    #[test]
    fn lookup_response_carries_custom_attributes() {
        let page: AccountsPage = serde_json::from_str(
            r#"{"users": [{"localId": "u1", "customAttributes": "{\"beta\":true}"}]}"#,
        )
        .unwrap();

        let user = page.users.into_iter().next().unwrap();
        assert_eq!(user.custom_attributes.as_deref(), Some("{\"beta\":true}"));
    }

    #[test]
    fn role_claim_merge_preserves_existing_claims() {
        let merged = merge_role_claim(Some(r#"{"beta":true,"role":"free"}"#), "premium");
        let value: serde_json::Value = serde_json::from_str(&merged).unwrap();

        assert_eq!(value["beta"], true);
        assert_eq!(value["role"], "premium");
    }

    #[test]
    fn role_claim_merge_starts_fresh_without_usable_claims() {
        for existing in [None, Some("not json")] {
            let merged = merge_role_claim(existing, "free");
            let value: serde_json::Value = serde_json::from_str(&merged).unwrap();

            assert_eq!(value, serde_json::json!({ "role": "free" }));
        }
    }
}
