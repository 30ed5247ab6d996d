/*
 * Responsibility
 * - hosted Identity Provider の adapter
 *   - session token はローカルで検証 (SessionVerifier)
 *   - user record の更新/一覧は provider の REST API (secret key 認証)
 * - HTTP client のタイムアウトは reqwest のデフォルトに任せる (ここでは retry もしない)
 */
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use url::Url;

use super::claims::{Role, SessionClaims};
use super::provider::{ClaimsError, IdentityError, IdentityProvider, UserRecord};
use super::session_jwt::SessionVerifier;

// Provider's maximum page size.
const USER_PAGE_SIZE: usize = 100;
// Upper bound on pages fetched for one listing.
const MAX_USER_PAGES: usize = 20;

#[derive(Debug, Deserialize)]
struct ProviderUser {
    id: String,
    #[serde(default)]
    first_name: Option<String>,
    #[serde(default)]
    last_name: Option<String>,
    #[serde(default)]
    primary_email_address_id: Option<String>,
    #[serde(default)]
    email_addresses: Vec<ProviderEmail>,
    #[serde(default)]
    public_metadata: Option<ProviderMetadata>,
}

#[derive(Debug, Deserialize)]
struct ProviderEmail {
    id: String,
    email_address: String,
}

// `role` stays raw JSON: one malformed record must not fail the whole listing.
#[derive(Debug, Default, Deserialize)]
struct ProviderMetadata {
    #[serde(default)]
    role: Option<serde_json::Value>,
}

impl From<ProviderUser> for UserRecord {
    fn from(user: ProviderUser) -> Self {
        let primary_email = user.primary_email_address_id.as_deref().and_then(|primary| {
            user.email_addresses
                .iter()
                .find(|e| e.id == primary)
                .map(|e| e.email_address.clone())
        });

        let role = match Role::from_metadata(user.public_metadata.as_ref().and_then(|m| m.role.as_ref())) {
            Ok(role) => role,
            Err(err) => {
                tracing::warn!(user_id = %user.id, error = %err, "unrecognized role in user metadata");
                Role::None
            }
        };

        UserRecord {
            id: user.id,
            first_name: user.first_name,
            last_name: user.last_name,
            primary_email,
            role,
        }
    }
}

/// Hosted identity provider: local session verification + remote user API.
#[derive(Clone)]
pub struct HostedIdentityProvider {
    verifier: SessionVerifier,
    http: reqwest::Client,
    api_url: Url,
    secret_key: String,
}

impl std::fmt::Debug for HostedIdentityProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Do not print the secret key
        f.debug_struct("HostedIdentityProvider")
            .field("verifier", &self.verifier)
            .field("api_url", &self.api_url.as_str())
            .finish()
    }
}

impl HostedIdentityProvider {
    pub fn new(
        verifier: SessionVerifier,
        api_url: &str,
        secret_key: impl Into<String>,
    ) -> Result<Self, IdentityError> {
        let api_url = Url::parse(api_url)
            .map_err(|e| IdentityError::InvalidConfig(format!("invalid api url: {e}")))?;
        if api_url.cannot_be_a_base() {
            return Err(IdentityError::InvalidConfig(
                "api url cannot be a base".to_string(),
            ));
        }

        let http = reqwest::Client::builder()
            .user_agent(concat!("role-gate/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            verifier,
            http,
            api_url,
            secret_key: secret_key.into(),
        })
    }

    // Build `{api_url}/{segments...}`; each segment is percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, IdentityError> {
        let mut url = self.api_url.clone();
        {
            let mut path = url.path_segments_mut().map_err(|_| {
                IdentityError::InvalidConfig("api url cannot be a base".to_string())
            })?;
            path.pop_if_empty().extend(segments);
        }
        Ok(url)
    }

    fn users_url(&self, query: Option<&str>, offset: usize) -> Result<Url, IdentityError> {
        let mut url = self.endpoint(&["v1", "users"])?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs
                .append_pair("limit", &USER_PAGE_SIZE.to_string())
                .append_pair("offset", &offset.to_string())
                .append_pair("order_by", "-created_at");
            if let Some(q) = query {
                pairs.append_pair("query", q);
            }
        }
        Ok(url)
    }

    async fn list_users_page(
        &self,
        query: Option<&str>,
        offset: usize,
    ) -> Result<Vec<ProviderUser>, IdentityError> {
        let response = self
            .http
            .get(self.users_url(query, offset)?)
            .bearer_auth(&self.secret_key)
            .send()
            .await?;

        Self::ensure_success(response)
            .await?
            .json()
            .await
            .map_err(|e| IdentityError::InvalidResponse(e.to_string()))
    }

    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, IdentityError> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        Err(IdentityError::Rejected { status, body })
    }
}

#[async_trait]
impl IdentityProvider for HostedIdentityProvider {
    fn provider_name(&self) -> &'static str {
        "hosted"
    }

    fn verify_claims(&self, token: &str) -> Result<SessionClaims, ClaimsError> {
        self.verifier.verify_session(token)
    }

    async fn update_user_role(&self, user_id: &str, role: Role) -> Result<(), IdentityError> {
        let url = self.endpoint(&["v1", "users", user_id, "metadata"])?;

        // Metadata is merged at the provider; a null value removes the key.
        let body = json!({ "public_metadata": { "role": role.as_str() } });

        let response = self
            .http
            .patch(url)
            .bearer_auth(&self.secret_key)
            .json(&body)
            .send()
            .await?;

        Self::ensure_success(response).await?;
        Ok(())
    }

    async fn list_users(&self, query: Option<&str>) -> Result<Vec<UserRecord>, IdentityError> {
        let mut users = Vec::new();

        for page in 0..MAX_USER_PAGES {
            let batch = self.list_users_page(query, page * USER_PAGE_SIZE).await?;
            let last = batch.len() < USER_PAGE_SIZE;
            users.extend(batch.into_iter().map(UserRecord::from));
            if last {
                return Ok(users);
            }
        }

        tracing::warn!(
            fetched = users.len(),
            pages = MAX_USER_PAGES,
            "user listing truncated; narrow it with a search"
        );
        Ok(users)
    }
}
