//! Identity Provider port.
//!
//! The hosted provider is the service of record for users, sessions and roles.
//! Everything in this crate talks to it through `IdentityProvider`, so the access
//! filter and the role administration service can run against a fake in tests.

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use super::claims::{Role, SessionClaims};

/// Session token could not be turned into trusted claims.
///
/// Callers in the request path treat every variant as "not signed in" (fail closed).
#[derive(Debug, Error)]
pub enum ClaimsError {
    #[error("session token verification failed: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
    #[error("empty '{0}' claim")]
    EmptyClaim(&'static str),
    #[error("malformed session token: {0}")]
    Malformed(String),
}

/// Errors from calls to the provider's user API.
#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("identity provider transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("identity provider rejected the request ({status}): {body}")]
    Rejected { status: u16, body: String },
    #[error("identity provider returned an unexpected response: {0}")]
    InvalidResponse(String),
    #[error("identity provider misconfigured: {0}")]
    InvalidConfig(String),
}

/// The provider's view of a user, as shown in the admin listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserRecord {
    pub id: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub primary_email: Option<String>,
    pub role: Role,
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    // Provider name (for logging).
    fn provider_name(&self) -> &'static str;

    // Verify a session token and extract the claims this service relies on.
    fn verify_claims(&self, token: &str) -> Result<SessionClaims, ClaimsError>;

    // Set (or clear, with `Role::None`) the role stored in the user's public metadata.
    //
    // Exactly one upstream call per invocation; no retry.
    async fn update_user_role(&self, user_id: &str, role: Role) -> Result<(), IdentityError>;

    // List users, optionally filtered by a free-text query.
    async fn list_users(&self, query: Option<&str>) -> Result<Vec<UserRecord>, IdentityError>;
}
