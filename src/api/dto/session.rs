/*
 * Responsibility
 * - home / user-profile の response DTO
 */
use serde::Serialize;

use crate::services::identity::{Role, SessionClaims};

#[derive(Debug, Serialize)]
pub struct HomeResponse {
    pub signed_in: bool,
    pub role: Role,
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub id: String,
    pub session_id: Option<String>,
    pub role: Role,
}

impl From<SessionClaims> for ProfileResponse {
    fn from(c: SessionClaims) -> Self {
        Self {
            id: c.user_id,
            session_id: c.session_id,
            role: c.role,
        }
    }
}
