//! Equipment access: the evaluator and the capability sessions that
//! guard workflow mutations.
//!
//! The access module provides:
//! - The pure equipment access evaluator
//! - Capability URIs with wildcard matching
//! - Role-derived sessions resolved once per actor

pub mod capability;
pub mod evaluator;
pub mod session;

pub use capability::{capability_uri_covers, Capability, CapabilitySet};
pub use evaluator::{
    accessible_equipment, can_access_equipment, can_access_equipment_at, AccessDecision,
};
pub use session::{Role, Session};
