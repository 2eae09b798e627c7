//! Skills — certifiable capabilities that gate equipment.
//!
//! A skill names a proficiency level and the set of equipment it unlocks.
//! Once a grant references a skill, the skill is never edited in place;
//! administrators can only disable it and create a new one.

use std::collections::BTreeSet;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{AccessError, Result};

/// Unique identifier for a skill.
///
/// Format: `skill_` + base58 of the first 16 bytes of SHA-256.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SkillId(pub String);

impl std::fmt::Display for SkillId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a bookable piece of equipment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EquipmentId(pub String);

impl EquipmentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Parse a user-supplied equipment ID, rejecting blank input.
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(AccessError::Validation(
                "equipment id must not be empty".into(),
            ));
        }
        Ok(Self(trimmed.to_string()))
    }
}

impl std::fmt::Display for EquipmentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Proficiency level, ordered from least to most demanding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkillLevel {
    Basic,
    Intermediate,
    Advanced,
    Expert,
}

impl SkillLevel {
    /// Return a stable string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Basic => "basic",
            Self::Intermediate => "intermediate",
            Self::Advanced => "advanced",
            Self::Expert => "expert",
        }
    }
}

impl FromStr for SkillLevel {
    type Err = AccessError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "basic" => Ok(Self::Basic),
            "intermediate" => Ok(Self::Intermediate),
            "advanced" => Ok(Self::Advanced),
            "expert" => Ok(Self::Expert),
            other => Err(AccessError::Validation(format!(
                "unknown skill level '{other}' (expected basic, intermediate, advanced, expert)"
            ))),
        }
    }
}

impl std::fmt::Display for SkillLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a skill currently gates equipment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkillStatus {
    Active,
    Disabled,
}

/// A catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Skill {
    /// Unique skill ID.
    pub id: SkillId,
    /// Display name, also used in missing-skill reports.
    pub name: String,
    /// Free-form grouping (e.g. "woodshop", "electronics").
    pub category: String,
    /// Proficiency a certification for this skill attests to.
    pub required_level: SkillLevel,
    /// Equipment this skill is required for.
    pub equipment_ids: BTreeSet<EquipmentId>,
    /// Active or disabled.
    pub status: SkillStatus,
    /// Creation timestamp (microseconds since epoch).
    pub created_at: u64,
    /// Optional longer description.
    #[serde(default)]
    pub description: Option<String>,
}

impl Skill {
    /// Is this skill currently enforced?
    pub fn is_active(&self) -> bool {
        self.status == SkillStatus::Active
    }

    /// Does this skill gate the given equipment?
    pub fn gates(&self, equipment: &EquipmentId) -> bool {
        self.equipment_ids.contains(equipment)
    }
}

/// Builder for catalog entries.
pub struct SkillBuilder {
    name: String,
    category: String,
    required_level: SkillLevel,
    equipment_ids: BTreeSet<EquipmentId>,
    description: Option<String>,
}

impl SkillBuilder {
    /// Start building a skill with the given display name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            category: "general".to_string(),
            required_level: SkillLevel::Basic,
            equipment_ids: BTreeSet::new(),
            description: None,
        }
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn level(mut self, level: SkillLevel) -> Self {
        self.required_level = level;
        self
    }

    /// Add a piece of equipment this skill unlocks.
    pub fn equipment(mut self, id: impl Into<String>) -> Self {
        self.equipment_ids.insert(EquipmentId(id.into()));
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Validate and finalize the skill.
    pub fn build(self) -> Result<Skill> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(AccessError::Validation("skill name must not be empty".into()));
        }
        if self.equipment_ids.iter().any(|e| e.0.trim().is_empty()) {
            return Err(AccessError::Validation(format!(
                "skill '{name}' lists an empty equipment id"
            )));
        }

        let now = crate::time::now_micros();
        let id = SkillId(crate::ids::derive_id("skill", &[&name, &self.category], now));

        Ok(Skill {
            id,
            name,
            category: self.category,
            required_level: self.required_level,
            equipment_ids: self.equipment_ids,
            status: SkillStatus::Active,
            created_at: now,
            description: self.description,
        })
    }
}
