/*
 * Responsibility
 * - GET /user-profile (default-protected)
 * - filter が未ログインを弾くので、ここに来る時点で claims はある前提
 */
use axum::Json;

use crate::api::dto::session::ProfileResponse;
use crate::api::extractors::SessionCtxExtractor;
use crate::error::AppError;

pub async fn user_profile(
    SessionCtxExtractor(ctx): SessionCtxExtractor,
) -> Result<Json<ProfileResponse>, AppError> {
    let claims = ctx.claims.ok_or_else(|| {
        tracing::error!("user-profile reached without a session; check the route table");
        AppError::Internal
    })?;

    Ok(Json(claims.into()))
}
