//! Skill catalog — the certifiable skills and the equipment they gate.

pub mod skill;

pub use skill::{EquipmentId, Skill, SkillBuilder, SkillId, SkillLevel, SkillStatus};
