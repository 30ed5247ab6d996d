/*
 * Responsibility
 * - GET / (public): ログイン状態と role を返すだけ
 */
use axum::Json;

use crate::api::dto::session::HomeResponse;
use crate::api::extractors::SessionCtxExtractor;

pub async fn home(SessionCtxExtractor(ctx): SessionCtxExtractor) -> Json<HomeResponse> {
    Json(HomeResponse {
        signed_in: ctx.is_signed_in(),
        role: ctx.role(),
    })
}
