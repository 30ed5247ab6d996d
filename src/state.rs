/*
 * Responsibility
 * - Router に紐づける共有コンテキスト (AppState)
 *   - access policy (immutable route table), identity provider, role/listing services
 * - Clone 前提で持つ (内部は Arc/Clone cheap)
 */
use std::sync::Arc;

use crate::services::{
    access::AccessPolicy,
    cache::ViewCache,
    identity::IdentityProvider,
    listing::AdminListingService,
    roles::RoleAdminService,
};

pub const DEFAULT_SESSION_COOKIE: &str = "__session";

#[derive(Clone)]
pub struct AppState {
    pub access: AccessPolicy,
    pub identity: Arc<dyn IdentityProvider>,
    pub roles: RoleAdminService,
    pub listing: AdminListingService,
    pub session_cookie_name: Arc<str>,
}

impl AppState {
    pub fn new(
        access: AccessPolicy,
        identity: Arc<dyn IdentityProvider>,
        views: Arc<dyn ViewCache>,
        session_cookie_name: &str,
    ) -> Self {
        Self {
            access,
            roles: RoleAdminService::new(identity.clone(), views.clone()),
            listing: AdminListingService::new(identity.clone(), views),
            identity,
            session_cookie_name: Arc::from(session_cookie_name),
        }
    }
}
