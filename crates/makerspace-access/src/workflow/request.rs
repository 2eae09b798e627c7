//! Skill requests: a member asking to be certified for a skill.
//!
//! ```text
//! pending ──approve──▶ approved   (terminal, creates a grant)
//!    │
//!    └────reject────▶ rejected    (terminal)
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{AccessError, Result};
use crate::grant::GrantId;
use crate::member::UserId;
use crate::skill::SkillId;

/// Unique identifier for a skill request.
///
/// Format: `sreq_` + base58 of the first 16 bytes of SHA-256.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RequestId(pub String);

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Request lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
}

impl RequestStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

impl std::fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A member's request to be certified for a skill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillRequest {
    pub id: RequestId,
    /// Requesting member.
    pub user_id: UserId,
    /// Requested skill.
    pub skill_id: SkillId,
    pub status: RequestStatus,
    /// Submission timestamp (microseconds since epoch).
    pub requested_at: u64,
    /// Member's notes on the request.
    #[serde(default)]
    pub notes: Option<String>,
    /// When the request reached a terminal state.
    #[serde(default)]
    pub resolved_at: Option<u64>,
    /// Staff member who approved or rejected it.
    #[serde(default)]
    pub resolved_by: Option<UserId>,
    /// Approval notes or rejection reason.
    #[serde(default)]
    pub resolution_notes: Option<String>,
    /// Grant created on approval.
    #[serde(default)]
    pub grant_id: Option<GrantId>,
}

impl SkillRequest {
    /// Create a pending request submitted at `now`.
    pub fn new(user_id: UserId, skill_id: SkillId, notes: Option<String>, now: u64) -> Self {
        let id = RequestId(crate::ids::derive_id(
            "sreq",
            &[&user_id.0, &skill_id.0],
            now,
        ));
        Self {
            id,
            user_id,
            skill_id,
            status: RequestStatus::Pending,
            requested_at: now,
            notes,
            resolved_at: None,
            resolved_by: None,
            resolution_notes: None,
            grant_id: None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == RequestStatus::Pending
    }

    /// Fail with `InvalidStateTransition` unless the request is pending.
    pub fn ensure_pending(&self, action: &str) -> Result<()> {
        if self.is_pending() {
            Ok(())
        } else {
            Err(AccessError::InvalidStateTransition(format!(
                "cannot {action} request {}: already {}",
                self.id, self.status
            )))
        }
    }

    /// Move to `approved`, recording the grant that was created.
    pub fn approve(
        &mut self,
        by: UserId,
        notes: Option<String>,
        grant_id: GrantId,
        now: u64,
    ) -> Result<()> {
        self.ensure_pending("approve")?;
        self.status = RequestStatus::Approved;
        self.resolved_at = Some(now);
        self.resolved_by = Some(by);
        self.resolution_notes = notes;
        self.grant_id = Some(grant_id);
        Ok(())
    }

    /// Move to `rejected`.
    pub fn reject(&mut self, by: UserId, reason: Option<String>, now: u64) -> Result<()> {
        self.ensure_pending("reject")?;
        self.status = RequestStatus::Rejected;
        self.resolved_at = Some(now);
        self.resolved_by = Some(by);
        self.resolution_notes = reason;
        Ok(())
    }
}
