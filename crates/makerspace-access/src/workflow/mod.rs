//! Skill request workflow and the ledger it mutates.
//!
//! The workflow module provides:
//! - Skill requests with a pending → approved/rejected lifecycle
//! - The [`SkillLedger`] holding catalog, grants, requests and revocations
//! - Capability-checked catalog, request and revocation operations

pub mod ledger;
pub mod request;

pub use ledger::SkillLedger;
pub use request::{RequestId, RequestStatus, SkillRequest};
