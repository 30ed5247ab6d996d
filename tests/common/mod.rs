#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use axum::Router;
use axum::body::{self, Body};
use axum::http::{Request, Response, header};
use tower::util::ServiceExt; // for `oneshot`

use role_gate::config::Config;
use role_gate::{build_app, build_router};
use role_gate::services::access::{AccessPolicy, RouteTable};
use role_gate::services::cache::{CachedViews, MemoryCacheClient, ViewCache};
use role_gate::services::identity::{
    ClaimsError, IdentityError, IdentityProvider, Role, SessionClaims, UserRecord,
};
use role_gate::state::AppState;

pub const ADMIN_TOKEN: &str = "token-admin";
pub const MODERATOR_TOKEN: &str = "token-moderator";
pub const MEMBER_TOKEN: &str = "token-member";

/// In-process identity provider: fixed tokens, an in-memory user directory,
/// and a log of every role update it receives.
#[derive(Default)]
pub struct FakeIdentity {
    pub users: Mutex<Vec<UserRecord>>,
    pub updates: Mutex<Vec<(String, Role)>>,
    pub list_calls: Mutex<Vec<Option<String>>>,
    pub fail_updates: AtomicBool,
}

impl FakeIdentity {
    pub fn with_users(ids: &[(&str, Role)]) -> Self {
        let users = ids
            .iter()
            .map(|(id, role)| UserRecord {
                id: id.to_string(),
                first_name: None,
                last_name: None,
                primary_email: Some(format!("{id}@example.com")),
                role: *role,
            })
            .collect();
        Self {
            users: Mutex::new(users),
            ..Default::default()
        }
    }

    pub fn role_of(&self, id: &str) -> Option<Role> {
        self.users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.id == id)
            .map(|u| u.role)
    }

    pub fn update_count(&self) -> usize {
        self.updates.lock().unwrap().len()
    }

    pub fn list_count(&self) -> usize {
        self.list_calls.lock().unwrap().len()
    }
}

#[async_trait]
impl IdentityProvider for FakeIdentity {
    fn provider_name(&self) -> &'static str {
        "fake"
    }

    fn verify_claims(&self, token: &str) -> Result<SessionClaims, ClaimsError> {
        let claims = match token {
            ADMIN_TOKEN => SessionClaims::new("user_admin", Role::Admin),
            MODERATOR_TOKEN => SessionClaims::new("user_mod", Role::Moderator),
            MEMBER_TOKEN => SessionClaims::new("user_member", Role::None),
            _ => return Err(ClaimsError::Malformed("unknown test token".to_string())),
        };
        Ok(claims.with_session_id(format!("sess_{token}")))
    }

    async fn update_user_role(&self, user_id: &str, role: Role) -> Result<(), IdentityError> {
        self.updates
            .lock()
            .unwrap()
            .push((user_id.to_string(), role));

        if self.fail_updates.load(Ordering::SeqCst) {
            return Err(IdentityError::Rejected {
                status: 503,
                body: "service unavailable".to_string(),
            });
        }

        let mut users = self.users.lock().unwrap();
        match users.iter_mut().find(|u| u.id == user_id) {
            Some(user) => {
                user.role = role;
                Ok(())
            }
            None => Err(IdentityError::Rejected {
                status: 404,
                body: "user not found".to_string(),
            }),
        }
    }

    async fn list_users(&self, query: Option<&str>) -> Result<Vec<UserRecord>, IdentityError> {
        self.list_calls
            .lock()
            .unwrap()
            .push(query.map(str::to_string));

        let users = self.users.lock().unwrap();
        Ok(users
            .iter()
            .filter(|u| query.is_none_or(|q| u.id.contains(q)))
            .cloned()
            .collect())
    }
}

pub struct TestApp {
    pub router: Router,
    pub identity: Arc<FakeIdentity>,
    pub views: Arc<CachedViews<MemoryCacheClient>>,
}

impl TestApp {
    pub fn new(identity: FakeIdentity) -> Result<Self> {
        Self::build(identity, None)
    }

    /// Same app wrapped in every production layer (headers, CORS, request id, timeout).
    pub fn with_layers(identity: FakeIdentity, config: &Config) -> Result<Self> {
        Self::build(identity, Some(config))
    }

    fn build(identity: FakeIdentity, config: Option<&Config>) -> Result<Self> {
        let identity = Arc::new(identity);
        let views = Arc::new(CachedViews::new_with_cache(
            Arc::new(MemoryCacheClient::new()),
            "test:views",
            Duration::from_secs(60),
        ));

        let access = AccessPolicy::new(RouteTable::defaults()?, "/sign-in");
        let state = AppState::new(
            access,
            identity.clone(),
            views.clone() as Arc<dyn ViewCache>,
            "__session",
        );

        let router = match config {
            Some(config) => build_app(state, config),
            None => build_router(state),
        };

        Ok(Self {
            router,
            identity,
            views,
        })
    }

    pub async fn send(&self, req: Request<Body>) -> Result<Response<Body>> {
        Ok(self.router.clone().oneshot(req).await?)
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> Result<Response<Body>> {
        let mut builder = Request::builder().method("GET").uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        self.send(builder.body(Body::empty())?).await
    }

    pub async fn post_form(
        &self,
        uri: &str,
        token: Option<&str>,
        form: &str,
    ) -> Result<Response<Body>> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        self.send(builder.body(Body::from(form.to_string()))?).await
    }

    /// Form post with arbitrary headers (cookie session, Origin, fetch metadata).
    pub async fn post_form_with(
        &self,
        uri: &str,
        headers: &[(&str, &str)],
        form: &str,
    ) -> Result<Response<Body>> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        self.send(builder.body(Body::from(form.to_string()))?).await
    }
}

pub fn test_config(pairs: &[(&str, &str)]) -> Result<Config> {
    let base = [
        ("SESSION_JWT_SECRET", "test-secret"),
        ("IDP_API_URL", "https://api.idp.example"),
        ("IDP_SECRET_KEY", "sk_test"),
    ];
    let lookup = |key: &str| {
        pairs
            .iter()
            .chain(base.iter())
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.to_string())
    };
    Ok(Config::from_lookup(lookup)?)
}

pub fn location(resp: &Response<Body>) -> Option<&str> {
    resp.headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
}

pub async fn json_body(resp: Response<Body>) -> Result<serde_json::Value> {
    let bytes = body::to_bytes(resp.into_body(), 1_048_576).await?;
    Ok(serde_json::from_slice(&bytes)?)
}
