//! Admin listing view.
//!
//! The unfiltered listing is rendered once and kept in the view cache under
//! `ADMIN_LISTING_PATH` until a role mutation revalidates it or the TTL expires.
//! Searches always go to the provider.
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::services::cache::ViewCache;
use crate::services::identity::{IdentityError, IdentityProvider, UserRecord};
use crate::services::roles::ADMIN_LISTING_PATH;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    Hit,
    Miss,
    Bypass,
}

impl CacheStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheStatus::Hit => "hit",
            CacheStatus::Miss => "miss",
            CacheStatus::Bypass => "bypass",
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AdminListing {
    pub search: Option<String>,
    pub users: Vec<UserRecord>,
    pub generated_at: DateTime<Utc>,
}

/// Rendered listing (JSON body) plus where it came from.
#[derive(Debug, Clone)]
pub struct ListingView {
    pub body: String,
    pub cache: CacheStatus,
}

#[derive(Clone)]
pub struct AdminListingService {
    identity: Arc<dyn IdentityProvider>,
    views: Arc<dyn ViewCache>,
}

impl AdminListingService {
    pub fn new(identity: Arc<dyn IdentityProvider>, views: Arc<dyn ViewCache>) -> Self {
        Self { identity, views }
    }

    pub async fn render(&self, search: Option<&str>) -> Result<ListingView, IdentityError> {
        let search = search.map(str::trim).filter(|s| !s.is_empty());

        if let Some(query) = search {
            let body = self.fetch(Some(query)).await?;
            return Ok(ListingView {
                body,
                cache: CacheStatus::Bypass,
            });
        }

        match self.views.get(ADMIN_LISTING_PATH).await {
            Ok(Some(body)) => {
                return Ok(ListingView {
                    body,
                    cache: CacheStatus::Hit,
                });
            }
            Ok(None) => {}
            // Cache is best-effort; fall through to the provider.
            Err(err) => tracing::warn!(error = %err, "view cache read failed"),
        }

        let body = self.fetch(None).await?;
        if let Err(err) = self.views.put(ADMIN_LISTING_PATH, &body).await {
            tracing::warn!(error = %err, "view cache write failed");
        }

        Ok(ListingView {
            body,
            cache: CacheStatus::Miss,
        })
    }

    async fn fetch(&self, query: Option<&str>) -> Result<String, IdentityError> {
        let users = self.identity.list_users(query).await?;
        let listing = AdminListing {
            search: query.map(str::to_string),
            users,
            generated_at: Utc::now(),
        };
        serde_json::to_string(&listing).map_err(|e| IdentityError::InvalidResponse(e.to_string()))
    }
}
