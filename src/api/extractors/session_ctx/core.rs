use axum::extract::FromRequestParts;
use axum::http::{StatusCode, request::Parts};

use crate::state::AppState;

use super::SessionCtx;

/// Handler で SessionCtx を受け取るための extractor
/// access filter が SessionCtx を request.extensions() に insert 済みである前提
/// 見つからない場合は 500 を返す（filter が router に掛かっていない = 配線ミス）
pub struct SessionCtxExtractor(pub SessionCtx);

impl FromRequestParts<AppState> for SessionCtxExtractor
where
    AppState: Send + Sync,
{
    type Rejection = StatusCode;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<SessionCtx>()
            .cloned()
            .map(SessionCtxExtractor)
            .ok_or_else(|| {
                tracing::error!("SessionCtx missing; access filter is not applied to this route");
                StatusCode::INTERNAL_SERVER_ERROR
            })
    }
}
