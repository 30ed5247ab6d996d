/*
 * Responsibility
 * - Role (closed enum) と SessionClaims (検証済みセッションの中身) の定義
 * - Identity Provider の生文字列 role を Role に変換する唯一の場所
 */
use std::{fmt, str::FromStr};

use serde::{Serialize, Serializer};
use serde_json::Value;
use thiserror::Error;

/// Elevated role carried in the provider's public metadata.
///
/// `None` is the absence of an elevated role, not an unknown value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Role {
    #[default]
    None,
    Admin,
    Moderator,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown role: {0:?}")]
pub struct UnknownRole(pub String);

impl Role {
    /// Wire value stored at the provider (`None` is stored as null).
    pub fn as_str(&self) -> Option<&'static str> {
        match self {
            Role::None => None,
            Role::Admin => Some("admin"),
            Role::Moderator => Some("moderator"),
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }

    /// Convert the raw metadata value as stored at the provider.
    ///
    /// Missing or null means `Role::None`. A string must be a known role;
    /// any other JSON type is reported as unknown.
    pub fn from_metadata(raw: Option<&Value>) -> Result<Self, UnknownRole> {
        match raw {
            None | Some(Value::Null) => Ok(Role::None),
            Some(Value::String(s)) => s.parse(),
            Some(other) => Err(UnknownRole(other.to_string())),
        }
    }
}

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "moderator" => Ok(Role::Moderator),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str().unwrap_or("none"))
    }
}

impl Serialize for Role {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.as_str().serialize(serializer)
    }
}

/// Verified session claims attached to a single request.
///
/// - `user_id` は Identity Provider が発行した opaque ID (`sub`)
/// - `role` はトークン発行時点のスナップショット (次の refresh まで古い可能性あり)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionClaims {
    pub user_id: String,
    pub session_id: Option<String>,
    pub role: Role,
}

impl SessionClaims {
    pub fn new(user_id: impl Into<String>, role: Role) -> Self {
        Self {
            user_id: user_id.into(),
            session_id: None,
            role,
        }
    }

    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }
}
