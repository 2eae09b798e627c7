//! Revocation: withdrawing a certified grant.
//!
//! A revocation record is written alongside the grant's status change.
//! When a ledger is loaded, any grant with a revocation record is treated
//! as revoked regardless of the status stored on the grant itself.

use serde::{Deserialize, Serialize};

use crate::member::UserId;

use super::grant::GrantId;

/// A revocation record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Revocation {
    /// Grant being revoked.
    pub grant_id: GrantId,
    /// Staff member who revoked it.
    pub revoked_by: UserId,
    /// Revocation timestamp (microseconds since epoch).
    pub revoked_at: u64,
    /// Reason for revocation.
    pub reason: RevocationReason,
}

impl Revocation {
    /// Create a revocation record stamped at `now`.
    pub fn new(grant_id: GrantId, revoked_by: UserId, reason: RevocationReason, now: u64) -> Self {
        Self {
            grant_id,
            revoked_by,
            revoked_at: now,
            reason,
        }
    }
}

/// Reason for revocation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RevocationReason {
    /// Member broke a safety rule while using the equipment.
    SafetyViolation,
    /// Certification was issued by mistake.
    AdministrativeError,
    /// Member asked for the grant to be withdrawn.
    MemberRequest,
    /// Membership ended.
    MembershipEnded,
    /// Custom reason.
    Custom(String),
}

impl RevocationReason {
    /// Return a stable string representation.
    pub fn as_str(&self) -> &str {
        match self {
            Self::SafetyViolation => "safety_violation",
            Self::AdministrativeError => "administrative_error",
            Self::MemberRequest => "member_request",
            Self::MembershipEnded => "membership_ended",
            Self::Custom(s) => s.as_str(),
        }
    }

    /// Parse a reason string; unrecognized text becomes `Custom`.
    pub fn parse(s: &str) -> Self {
        match s.trim() {
            "safety_violation" => Self::SafetyViolation,
            "administrative_error" => Self::AdministrativeError,
            "member_request" => Self::MemberRequest,
            "membership_ended" => Self::MembershipEnded,
            other => Self::Custom(other.to_string()),
        }
    }
}
