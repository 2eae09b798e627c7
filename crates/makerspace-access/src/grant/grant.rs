//! Skill grants: a record that a member holds a skill.
//!
//! A grant is *active* iff its status is `certified` and it has either no
//! expiry or an expiry strictly in the future. Expiry wins over status: a
//! grant past its `expires_at` is never active, even if nobody has swept
//! it to `expired` yet.

use serde::{Deserialize, Serialize};

use crate::error::{AccessError, Result};
use crate::member::UserId;
use crate::skill::{SkillId, SkillLevel};

/// Unique identifier for a grant.
///
/// Format: `grant_` + base58 of the first 16 bytes of SHA-256.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GrantId(pub String);

impl std::fmt::Display for GrantId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle status of a grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantStatus {
    Pending,
    Certified,
    Expired,
    Revoked,
}

impl GrantStatus {
    /// Return a stable string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Certified => "certified",
            Self::Expired => "expired",
            Self::Revoked => "revoked",
        }
    }
}

impl std::fmt::Display for GrantStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A member's certification for one skill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSkillGrant {
    /// Unique grant ID.
    pub id: GrantId,
    /// Member holding the skill.
    pub user_id: UserId,
    /// Skill being certified.
    pub skill_id: SkillId,
    /// Certified proficiency.
    pub level: SkillLevel,
    /// Current status.
    pub status: GrantStatus,
    /// Certification timestamp (microseconds since epoch).
    pub certified_at: u64,
    /// Expiry timestamp (None = until revoked).
    pub expires_at: Option<u64>,
    /// Staff member who certified the grant.
    pub certified_by: UserId,
    /// Notes recorded at certification time.
    #[serde(default)]
    pub notes: Option<String>,
    /// Hex SHA-256 over the immutable fields.
    pub grant_hash: String,
}

impl UserSkillGrant {
    /// Does this grant satisfy a skill requirement at time `now`?
    pub fn is_active_at(&self, now: u64) -> bool {
        self.status == GrantStatus::Certified && !self.is_expired_at(now)
    }

    /// Does this grant satisfy a skill requirement right now?
    pub fn is_active(&self) -> bool {
        self.is_active_at(crate::time::now_micros())
    }

    /// Has the expiry passed at time `now`? Grants without expiry never expire.
    pub fn is_expired_at(&self, now: u64) -> bool {
        self.expires_at.is_some_and(|expiry| expiry <= now)
    }

    /// Recompute the hash over the immutable fields.
    pub fn compute_hash(&self) -> String {
        let input = format!(
            "{}:{}:{}:{}:{}:{}:{}",
            self.id.0,
            self.user_id.0,
            self.skill_id.0,
            self.level.as_str(),
            self.certified_at,
            self.expires_at.map(|e| e.to_string()).unwrap_or_default(),
            self.certified_by.0,
        );
        crate::ids::content_hash(&input)
    }

    /// Check that the stored hash matches the grant's fields.
    pub fn verify_hash(&self) -> Result<()> {
        if self.compute_hash() != self.grant_hash {
            return Err(AccessError::IntegrityViolation(format!(
                "grant {} hash mismatch",
                self.id
            )));
        }
        Ok(())
    }
}

/// Builder for certified grants.
pub struct GrantBuilder {
    user_id: UserId,
    skill_id: SkillId,
    certified_by: UserId,
    level: SkillLevel,
    expires_at: Option<u64>,
    valid_for: Option<u64>,
    notes: Option<String>,
}

impl GrantBuilder {
    /// Start building a grant of `skill_id` to `user_id`, certified by `certified_by`.
    pub fn new(user_id: UserId, skill_id: SkillId, certified_by: UserId) -> Self {
        Self {
            user_id,
            skill_id,
            certified_by,
            level: SkillLevel::Basic,
            expires_at: None,
            valid_for: None,
            notes: None,
        }
    }

    pub fn level(mut self, level: SkillLevel) -> Self {
        self.level = level;
        self
    }

    /// Set an absolute expiry.
    pub fn expires_at(mut self, expires_at: u64) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    /// Set an expiry relative to the certification time.
    pub fn valid_for(mut self, micros: u64) -> Self {
        self.valid_for = Some(micros);
        self
    }

    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Certify the grant at the current time.
    pub fn certify(self) -> Result<UserSkillGrant> {
        self.certify_at(crate::time::now_micros())
    }

    /// Certify the grant at the given time.
    pub fn certify_at(self, now: u64) -> Result<UserSkillGrant> {
        let expires_at = match (self.expires_at, self.valid_for) {
            (Some(abs), _) => Some(abs),
            (None, Some(rel)) => Some(now.saturating_add(rel)),
            (None, None) => None,
        };

        if let Some(expiry) = expires_at {
            if expiry <= now {
                return Err(AccessError::Validation(format!(
                    "grant expiry {expiry} is not after certification time {now}"
                )));
            }
        }

        let id = GrantId(crate::ids::derive_id(
            "grant",
            &[&self.user_id.0, &self.skill_id.0],
            now,
        ));

        let mut grant = UserSkillGrant {
            id,
            user_id: self.user_id,
            skill_id: self.skill_id,
            level: self.level,
            status: GrantStatus::Certified,
            certified_at: now,
            expires_at,
            certified_by: self.certified_by,
            notes: self.notes,
            grant_hash: String::new(),
        };
        grant.grant_hash = grant.compute_hash();
        Ok(grant)
    }
}
