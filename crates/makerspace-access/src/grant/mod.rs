//! Grant ledger records: who holds which skill, and until when.
//!
//! The grant module provides:
//! - Certified, expiring skill grants with a tamper-evident hash
//! - Activity checks against an explicit clock
//! - Revocation records

pub mod grant;
pub mod revocation;

pub use grant::{GrantBuilder, GrantId, GrantStatus, UserSkillGrant};
pub use revocation::{Revocation, RevocationReason};
