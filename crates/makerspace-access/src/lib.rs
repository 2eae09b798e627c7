//! Makerspace Access — skill-gated equipment access for makerspaces.
//!
//! Provides a skill catalog, a per-member ledger of skill grants, a pure
//! access evaluator, the request/approve/reject/revoke workflow that
//! mutates the ledger, and a JSON filesystem store for all of it.

pub mod access;
pub mod config;
pub mod error;
pub mod grant;
pub mod ids;
pub mod index;
pub mod member;
pub mod skill;
pub mod storage;
pub mod time;
pub mod workflow;

// Re-export primary types
pub use access::{
    accessible_equipment, can_access_equipment, can_access_equipment_at, AccessDecision,
    Capability, CapabilitySet, Role, Session,
};
pub use config::AccessConfig;
pub use error::{AccessError, Result};
pub use grant::{GrantBuilder, GrantId, GrantStatus, Revocation, RevocationReason, UserSkillGrant};
pub use member::UserId;
pub use skill::{EquipmentId, Skill, SkillBuilder, SkillId, SkillLevel, SkillStatus};
pub use storage::LedgerStore;
pub use workflow::{RequestId, RequestStatus, SkillLedger, SkillRequest};
