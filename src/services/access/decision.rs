/*
 * Responsibility
 * - リクエスト毎の認可判定 (Allow / RedirectToSignIn / RedirectToHome)
 * - HTTP には依存しない純粋なロジック (middleware は結果を redirect に変換するだけ)
 *
 * Rule order (first match wins):
 * 1. admin-only route and caller is not an admin  -> home
 * 2. non-public route and caller is not signed in -> sign-in (with return URL)
 * 3. otherwise                                    -> allow
 */
use std::sync::Arc;

use url::form_urlencoded;

use crate::services::access::routes::{RouteClass, RouteTable};
use crate::services::identity::{Role, SessionClaims};

pub const HOME_PATH: &str = "/";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessDecision {
    Allow,
    RedirectToSignIn { return_to: String },
    RedirectToHome,
}

/// Decide for an already classified route.
///
/// `claims` is `None` both for anonymous callers and for callers whose token
/// failed verification.
pub fn decide(
    class: RouteClass,
    claims: Option<&SessionClaims>,
    return_to: &str,
) -> AccessDecision {
    if class == RouteClass::AdminOnly {
        let is_admin = match claims.map(|c| c.role) {
            Some(Role::Admin) => true,
            Some(Role::Moderator) | Some(Role::None) | None => false,
        };
        // Anonymous callers land here too: an admin route never advertises sign-in.
        if !is_admin {
            return AccessDecision::RedirectToHome;
        }
    }

    if class != RouteClass::Public && claims.is_none() {
        return AccessDecision::RedirectToSignIn {
            return_to: return_to.to_string(),
        };
    }

    AccessDecision::Allow
}

/// Route table + sign-in location. Immutable after start-up.
#[derive(Debug, Clone)]
pub struct AccessPolicy {
    routes: Arc<RouteTable>,
    sign_in_url: String,
}

impl AccessPolicy {
    pub fn new(routes: RouteTable, sign_in_url: impl Into<String>) -> Self {
        Self {
            routes: Arc::new(routes),
            sign_in_url: sign_in_url.into(),
        }
    }

    /// Classify `path` and decide. `return_to` is the URL to come back to after sign-in.
    pub fn evaluate(
        &self,
        path: &str,
        return_to: &str,
        claims: Option<&SessionClaims>,
    ) -> AccessDecision {
        decide(self.routes.classify(path), claims, return_to)
    }

    /// `Location` for a sign-in redirect: `{sign_in_url}?redirect_url={return_to}`.
    pub fn sign_in_location(&self, return_to: &str) -> String {
        let query = form_urlencoded::Serializer::new(String::new())
            .append_pair("redirect_url", return_to)
            .finish();
        let sep = if self.sign_in_url.contains('?') { '&' } else { '?' };
        format!("{}{}{}", self.sign_in_url, sep, query)
    }
}
