/*
 * Responsibility
 * - Handler から見える「セッションコンテキスト」の型
 * - access filter が Allow 時に request extensions に格納し、handler はこの型だけを受け取る
 *
 * Notes
 * - public route では未ログインでも Allow されるので claims は Option
 * - claims はトークン発行時点のスナップショット
 */
use crate::services::identity::{Role, SessionClaims};

#[derive(Debug, Clone, Default)]
pub struct SessionCtx {
    pub claims: Option<SessionClaims>,
}

impl SessionCtx {
    pub fn new(claims: Option<SessionClaims>) -> Self {
        Self { claims }
    }

    pub fn is_signed_in(&self) -> bool {
        self.claims.is_some()
    }

    pub fn role(&self) -> Role {
        self.claims.as_ref().map(|c| c.role).unwrap_or_default()
    }
}
