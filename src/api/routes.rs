/*
 * Responsibility
 * - URL 構造を定義
 * - 認可 (public / admin-only / default-protected) は route table 側の責務なので、ここでは持たない
 *   (access filter は app.rs で router 全体に掛ける)
 */
use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

use crate::api::handlers::{
    admin::{admin_listing, remove_role, set_role},
    health::health,
    home::home,
    profile::user_profile,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home))
        .route("/health", get(health))
        .route("/user-profile", get(user_profile))
        .route("/admin", get(admin_listing))
        .route("/admin/roles/set", post(set_role))
        .route("/admin/roles/remove", post(remove_role))
}
