//! Access evaluator: can a member use a piece of equipment?
//!
//! Equipment is gated by every *active* catalog skill that lists it.
//! A member may use it iff they hold an active grant for each of those
//! skills. Equipment no active skill lists is unrestricted.
//!
//! Evaluation is pure: no side effects, and the same inputs at the same
//! `now` always produce the same decision. Missing skills are sorted by
//! name so the output is stable regardless of catalog order.

use std::collections::{BTreeSet, HashSet};

use serde::{Deserialize, Serialize};

use crate::grant::UserSkillGrant;
use crate::skill::{EquipmentId, Skill, SkillId};

/// Outcome of an access check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessDecision {
    /// Equipment that was evaluated.
    pub equipment_id: EquipmentId,
    /// True iff no required skill is missing.
    pub can_access: bool,
    /// Names of required skills without an active grant, sorted.
    pub missing_skills: Vec<String>,
    /// IDs of every active skill that gates this equipment, sorted.
    pub required_skills: Vec<SkillId>,
}

impl AccessDecision {
    /// Is the equipment gated by any active skill?
    pub fn is_restricted(&self) -> bool {
        !self.required_skills.is_empty()
    }
}

/// Evaluate access to `equipment` for the holder of `grants`, at the current time.
///
/// `grants` is the caller's own grant list; grants belonging to other
/// members must be filtered out beforehand.
pub fn can_access_equipment(
    equipment: &EquipmentId,
    grants: &[UserSkillGrant],
    catalog: &[Skill],
) -> AccessDecision {
    can_access_equipment_at(equipment, grants, catalog, crate::time::now_micros())
}

/// Evaluate access at an explicit time.
pub fn can_access_equipment_at(
    equipment: &EquipmentId,
    grants: &[UserSkillGrant],
    catalog: &[Skill],
    now: u64,
) -> AccessDecision {
    let held = active_skill_ids(grants.iter(), now);
    evaluate(equipment, &held, catalog.iter())
}

/// List every catalog-referenced equipment ID the grant holder can use at `now`, sorted.
pub fn accessible_equipment(
    grants: &[UserSkillGrant],
    catalog: &[Skill],
    now: u64,
) -> Vec<EquipmentId> {
    let held = active_skill_ids(grants.iter(), now);
    let referenced: BTreeSet<&EquipmentId> = catalog
        .iter()
        .flat_map(|skill| skill.equipment_ids.iter())
        .collect();

    referenced
        .into_iter()
        .filter(|equipment| evaluate(equipment, &held, catalog.iter()).can_access)
        .cloned()
        .collect()
}

/// Skill IDs covered by an active grant at `now`.
pub(crate) fn active_skill_ids<'a, I>(grants: I, now: u64) -> HashSet<&'a SkillId>
where
    I: Iterator<Item = &'a UserSkillGrant>,
{
    grants
        .filter(|grant| grant.is_active_at(now))
        .map(|grant| &grant.skill_id)
        .collect()
}

/// Core evaluation over a pre-computed set of held skills.
pub(crate) fn evaluate<'a, I>(
    equipment: &EquipmentId,
    held: &HashSet<&SkillId>,
    catalog: I,
) -> AccessDecision
where
    I: Iterator<Item = &'a Skill>,
{
    let mut required: Vec<&Skill> = catalog
        .filter(|skill| skill.is_active() && skill.gates(equipment))
        .collect();
    required.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));

    let missing_skills: Vec<String> = required
        .iter()
        .filter(|skill| !held.contains(&skill.id))
        .map(|skill| skill.name.clone())
        .collect();

    let mut required_skills: Vec<SkillId> = required.iter().map(|s| s.id.clone()).collect();
    required_skills.sort();

    AccessDecision {
        equipment_id: equipment.clone(),
        can_access: missing_skills.is_empty(),
        missing_skills,
        required_skills,
    }
}
