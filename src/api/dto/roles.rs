/*
 * Responsibility
 * - role 変更フォーム (x-www-form-urlencoded) の DTO
 * - `id` と `role` 以外のフィールドは読まない
 */
use serde::Deserialize;

use crate::services::identity::{Role, UnknownRole};
use crate::services::roles::RoleAssignment;

#[derive(Debug, Deserialize)]
pub struct SetRoleForm {
    pub id: Option<String>,
    // Missing or empty: revoke
    pub role: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RemoveRoleForm {
    pub id: Option<String>,
}

#[derive(Debug, PartialEq, Eq)]
pub enum FormError {
    MissingId,
    UnknownRole(UnknownRole),
}

impl FormError {
    pub fn message(&self) -> String {
        match self {
            FormError::MissingId => "id is required".to_string(),
            FormError::UnknownRole(e) => e.to_string(),
        }
    }
}

fn required_id(id: Option<String>) -> Result<String, FormError> {
    id.map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or(FormError::MissingId)
}

impl SetRoleForm {
    pub fn into_assignment(self) -> Result<RoleAssignment, FormError> {
        let id = required_id(self.id)?;
        let role = match self.role.as_deref().map(str::trim) {
            None | Some("") => Role::None,
            Some(raw) => raw.parse().map_err(FormError::UnknownRole)?,
        };
        Ok(RoleAssignment::grant(id, role))
    }
}

impl RemoveRoleForm {
    pub fn into_assignment(self) -> Result<RoleAssignment, FormError> {
        Ok(RoleAssignment::revoke(required_id(self.id)?))
    }
}
