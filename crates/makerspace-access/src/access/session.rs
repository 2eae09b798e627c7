//! Sessions: a member plus the capabilities resolved from their role.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{AccessError, Result};
use crate::member::UserId;

use super::capability::{
    CapabilitySet, ACCESS_CHECK, ACCESS_CHECK_ANY, SKILLS_APPROVE, SKILLS_REJECT, SKILLS_REQUEST,
};

/// Role reported by the identity provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Member,
    Staff,
    Admin,
}

impl Role {
    /// Parse a provider role string. Unknown roles get the least privilege.
    pub fn parse(raw: &str) -> Self {
        raw.parse().unwrap_or(Self::Member)
    }

    /// The capability set this role confers.
    pub fn capabilities(&self) -> CapabilitySet {
        match self {
            Self::Member => CapabilitySet::from_uris(&[SKILLS_REQUEST, ACCESS_CHECK]),
            Self::Staff => CapabilitySet::from_uris(&[
                SKILLS_REQUEST,
                ACCESS_CHECK,
                ACCESS_CHECK_ANY,
                SKILLS_APPROVE,
                SKILLS_REJECT,
            ]),
            Self::Admin => CapabilitySet::from_uris(&["*"]),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Member => "member",
            Self::Staff => "staff",
            Self::Admin => "admin",
        }
    }
}

impl FromStr for Role {
    type Err = AccessError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "member" | "user" => Ok(Self::Member),
            "staff" | "instructor" => Ok(Self::Staff),
            "admin" | "administrator" => Ok(Self::Admin),
            other => Err(AccessError::Validation(format!("unknown role '{other}'"))),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The acting member for a sequence of workflow calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: UserId,
    pub role: Role,
    pub capabilities: CapabilitySet,
}

impl Session {
    /// Resolve a session for `user_id` acting with `role`.
    pub fn new(user_id: UserId, role: Role) -> Self {
        Self::with_capabilities(user_id, role, role.capabilities())
    }

    /// Session with an explicit capability set, independent of role.
    pub fn with_capabilities(user_id: UserId, role: Role, capabilities: CapabilitySet) -> Self {
        Self {
            user_id,
            role,
            capabilities,
        }
    }

    pub fn require(&self, capability: &str) -> Result<()> {
        self.capabilities.require(capability)
    }
}
