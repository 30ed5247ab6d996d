/*
 * Responsibility
 * - /admin 系 handler (admin-only route)
 *   - GET  /admin               : user 一覧 (view cache 経由, ?search= は cache bypass)
 *   - POST /admin/roles/set     : form (id, role) -> RoleAdminService::set_role
 *   - POST /admin/roles/remove  : form (id)       -> RoleAdminService::revoke_role
 * - filter で admin 以外は弾かれているが、service 側でも caller の role を再確認する
 * - role 変更の POST は SameOrigin で cross-origin を 403 にする (cookie session のため)
 */
use axum::{
    Form,
    extract::{Query, State},
    http::{HeaderName, HeaderValue, header},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;

use crate::{
    api::dto::roles::{RemoveRoleForm, SetRoleForm},
    api::extractors::{SameOrigin, SessionCtxExtractor},
    error::AppError,
    services::roles::ADMIN_LISTING_PATH,
    state::AppState,
};

pub const VIEW_CACHE_HEADER: &str = "x-view-cache";

#[derive(Debug, Deserialize)]
pub struct ListingQuery {
    pub search: Option<String>,
}

pub async fn admin_listing(
    State(state): State<AppState>,
    Query(query): Query<ListingQuery>,
) -> Result<Response, AppError> {
    let view = state.listing.render(query.search.as_deref()).await?;

    Ok((
        [
            (
                header::CONTENT_TYPE,
                HeaderValue::from_static("application/json"),
            ),
            (
                HeaderName::from_static(VIEW_CACHE_HEADER),
                HeaderValue::from_static(view.cache.as_str()),
            ),
        ],
        view.body,
    )
        .into_response())
}

pub async fn set_role(
    State(state): State<AppState>,
    _origin: SameOrigin,
    SessionCtxExtractor(ctx): SessionCtxExtractor,
    Form(form): Form<SetRoleForm>,
) -> Result<Redirect, AppError> {
    let assignment = form
        .into_assignment()
        .map_err(|e| AppError::bad_request("INVALID_ROLE_ASSIGNMENT", e.message()))?;

    state.roles.set_role(ctx.claims.as_ref(), &assignment).await?;

    // Post/Redirect/Get back to the (now revalidated) listing.
    Ok(Redirect::to(ADMIN_LISTING_PATH))
}

pub async fn remove_role(
    State(state): State<AppState>,
    _origin: SameOrigin,
    SessionCtxExtractor(ctx): SessionCtxExtractor,
    Form(form): Form<RemoveRoleForm>,
) -> Result<Redirect, AppError> {
    let assignment = form
        .into_assignment()
        .map_err(|e| AppError::bad_request("INVALID_ROLE_ASSIGNMENT", e.message()))?;

    state
        .roles
        .revoke_role(ctx.claims.as_ref(), &assignment.target_user_id)
        .await?;

    Ok(Redirect::to(ADMIN_LISTING_PATH))
}
