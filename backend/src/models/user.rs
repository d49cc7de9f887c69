use async_graphql::{Enum, SimpleObject};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Access level of a user. Stored as text, exposed as a GraphQL enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Enum, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "USER",
            Role::Admin => "ADMIN",
        }
    }

    pub fn parse(s: &str) -> Option<Role> {
        match s {
            "USER" => Some(Role::User),
            "ADMIN" => Some(Role::Admin),
            _ => None,
        }
    }
}

/// User record, created on first authentication and refreshed on every login.
#[derive(Debug, Clone, Serialize, SimpleObject)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// System-generated identifier, immutable.
    pub id: Uuid,
    /// Subject issued by the identity provider; the reconciliation key.
    pub auth0_sub: String,
    /// Display name, recomputed from claims on every login.
    pub username: String,
    /// Contact address, recomputed from claims on every login.
    pub email: Option<String>,
    /// Whether the account is usable. Only changed by admin mutations.
    pub is_active: bool,
    /// Only changed by admin mutations, never by login.
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_login_at: Option<DateTime<Utc>>,
}
