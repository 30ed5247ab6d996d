/*
 * Responsibility
 * - Role Administration Service (grant / revoke)
 * - 呼び出し元が admin であることを確認してから Identity Provider に 1 回だけ更新を投げる
 * - 成功時のみ admin listing の view cache を revalidate (失敗してもエラーにしない)
 *
 * Notes
 * - 呼び出し元自身の session claims は更新しない (次の token refresh まで古いまま)
 * - 同一ユーザーへの同時更新は provider 側で last-write-wins
 */
use std::sync::Arc;

use thiserror::Error;

use crate::services::cache::ViewCache;
use crate::services::identity::{IdentityError, IdentityProvider, Role, SessionClaims};

/// View that renders user roles; revalidated after every successful mutation.
pub const ADMIN_LISTING_PATH: &str = "/admin";

#[derive(Debug, Error)]
pub enum RoleAdminError {
    #[error("not authorized")]
    Unauthorized,
    #[error("invalid role assignment: {0}")]
    InvalidRequest(&'static str),
    #[error("failed to update role for user {user_id}")]
    MutationFailed {
        user_id: String,
        #[source]
        source: IdentityError,
    },
}

/// A validated `(target, role)` pair. `Role::None` means revoke.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleAssignment {
    pub target_user_id: String,
    pub role: Role,
}

impl RoleAssignment {
    pub fn grant(target_user_id: impl Into<String>, role: Role) -> Self {
        Self {
            target_user_id: target_user_id.into(),
            role,
        }
    }

    pub fn revoke(target_user_id: impl Into<String>) -> Self {
        Self::grant(target_user_id, Role::None)
    }
}

#[derive(Clone)]
pub struct RoleAdminService {
    identity: Arc<dyn IdentityProvider>,
    views: Arc<dyn ViewCache>,
}

impl RoleAdminService {
    pub fn new(identity: Arc<dyn IdentityProvider>, views: Arc<dyn ViewCache>) -> Self {
        Self { identity, views }
    }

    /// Set `target_user_id`'s role to `role` (`Admin` or `Moderator`).
    pub async fn grant_role(
        &self,
        caller: Option<&SessionClaims>,
        target_user_id: &str,
        role: Role,
    ) -> Result<(), RoleAdminError> {
        let actor = authorize(caller)?;
        if role == Role::None {
            return Err(RoleAdminError::InvalidRequest(
                "role must be admin or moderator",
            ));
        }
        self.apply(actor, target_user_id, role).await
    }

    /// Clear `target_user_id`'s role. Revoking an absent role succeeds.
    pub async fn revoke_role(
        &self,
        caller: Option<&SessionClaims>,
        target_user_id: &str,
    ) -> Result<(), RoleAdminError> {
        let actor = authorize(caller)?;
        self.apply(actor, target_user_id, Role::None).await
    }

    /// Form-submission entry point: grant when a role is present, revoke otherwise.
    pub async fn set_role(
        &self,
        caller: Option<&SessionClaims>,
        assignment: &RoleAssignment,
    ) -> Result<(), RoleAdminError> {
        match assignment.role {
            Role::None => self.revoke_role(caller, &assignment.target_user_id).await,
            role @ (Role::Admin | Role::Moderator) => {
                self.grant_role(caller, &assignment.target_user_id, role)
                    .await
            }
        }
    }

    async fn apply(
        &self,
        actor: &SessionClaims,
        target_user_id: &str,
        role: Role,
    ) -> Result<(), RoleAdminError> {
        let target = target_user_id.trim();
        if target.is_empty() {
            return Err(RoleAdminError::InvalidRequest("target user id is required"));
        }

        if let Err(source) = self.identity.update_user_role(target, role).await {
            tracing::warn!(
                actor = %actor.user_id,
                user_id = target,
                %role,
                provider = self.identity.provider_name(),
                error = %source,
                "role update failed"
            );
            return Err(RoleAdminError::MutationFailed {
                user_id: target.to_string(),
                source,
            });
        }

        tracing::info!(actor = %actor.user_id, user_id = target, %role, "role updated");

        if let Err(err) = self.views.revalidate(ADMIN_LISTING_PATH).await {
            tracing::warn!(
                path = ADMIN_LISTING_PATH,
                error = %err,
                "failed to revalidate view after role update"
            );
        }

        Ok(())
    }
}

fn authorize(caller: Option<&SessionClaims>) -> Result<&SessionClaims, RoleAdminError> {
    match caller {
        Some(claims) if claims.role.is_admin() => Ok(claims),
        Some(claims) => {
            tracing::warn!(caller = %claims.user_id, role = %claims.role, "non-admin role mutation attempt");
            Err(RoleAdminError::Unauthorized)
        }
        None => Err(RoleAdminError::Unauthorized),
    }
}
