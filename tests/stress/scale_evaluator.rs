//! Scale test: access evaluation over large catalogs and ledgers.
//!
//! Validates that decisions stay correct and deterministic with thousands
//! of skills, grants and members.

use std::time::Instant;

use makerspace_access::{
    accessible_equipment, can_access_equipment_at, EquipmentId, GrantBuilder, Role, Session,
    Skill, SkillBuilder, SkillLedger, UserId, UserSkillGrant,
};

const NOW: u64 = 1_700_000_000_000_000;

/// `count` skills; skill `i` gates `tool-{i}` and the shared `shared-bench`.
fn make_catalog(count: usize) -> Vec<Skill> {
    (0..count)
        .map(|i| {
            SkillBuilder::new(format!("Skill {i:05}"))
                .equipment(format!("tool-{i}"))
                .equipment("shared-bench")
                .build()
                .expect("valid skill")
        })
        .collect()
}

fn certify(user: &UserId, skill: &Skill, expires_at: Option<u64>) -> UserSkillGrant {
    let mut builder = GrantBuilder::new(user.clone(), skill.id.clone(), UserId::new("staff"));
    if let Some(at) = expires_at {
        builder = builder.expires_at(at);
    }
    builder.certify_at(NOW - 1).expect("certify")
}

#[test]
fn stress_evaluate_5k_skill_catalog() {
    let catalog = make_catalog(5_000);
    let user = UserId::new("maker");

    // Every other skill held; every fourth of those already expired.
    let grants: Vec<UserSkillGrant> = catalog
        .iter()
        .enumerate()
        .filter(|(i, _)| i % 2 == 0)
        .map(|(i, skill)| {
            let expiry = if i % 8 == 0 { Some(NOW) } else { None };
            certify(&user, skill, expiry)
        })
        .collect();

    let start = Instant::now();
    for (i, _) in catalog.iter().enumerate() {
        let decision =
            can_access_equipment_at(&EquipmentId::new(format!("tool-{i}")), &grants, &catalog, NOW);
        let expected = i % 2 == 0 && i % 8 != 0;
        assert_eq!(decision.can_access, expected, "tool-{i}");
        assert_eq!(decision.required_skills.len(), 1);
    }
    let elapsed = start.elapsed();
    assert!(elapsed.as_secs() < 60, "evaluation too slow: {elapsed:?}");

    // The shared bench needs every skill.
    let shared = can_access_equipment_at(&EquipmentId::new("shared-bench"), &grants, &catalog, NOW);
    assert!(!shared.can_access);
    assert_eq!(shared.required_skills.len(), 5_000);
    let expected_missing = 5_000 - grants.iter().filter(|g| g.is_active_at(NOW)).count();
    assert_eq!(shared.missing_skills.len(), expected_missing);

    let mut sorted = shared.missing_skills.clone();
    sorted.sort();
    assert_eq!(shared.missing_skills, sorted, "missing skills must be sorted");
}

#[test]
fn stress_accessible_equipment_is_deterministic() {
    let catalog = make_catalog(1_000);
    let user = UserId::new("maker");
    let grants: Vec<UserSkillGrant> = catalog
        .iter()
        .filter(|s| s.name.ends_with('7'))
        .map(|s| certify(&user, s, None))
        .collect();

    let first = accessible_equipment(&grants, &catalog, NOW);
    let mut reversed_grants = grants.clone();
    reversed_grants.reverse();
    let mut reversed_catalog = catalog.clone();
    reversed_catalog.reverse();
    let second = accessible_equipment(&reversed_grants, &reversed_catalog, NOW);

    assert_eq!(first, second);
    assert_eq!(first.len(), 100);
    let mut sorted = first.clone();
    sorted.sort();
    assert_eq!(first, sorted);
    assert!(!first.contains(&EquipmentId::new("shared-bench")));
}

#[test]
fn stress_ledger_1k_members_request_and_approve() {
    let admin = Session::new(UserId::new("admin"), Role::Admin);
    let staff = Session::new(UserId::new("staff"), Role::Staff);
    let mut ledger = SkillLedger::new();

    let skills: Vec<_> = make_catalog(20)
        .into_iter()
        .map(|s| ledger.add_skill(&admin, s).expect("add skill"))
        .collect();

    for m in 0..1_000 {
        let session = Session::new(UserId::new(format!("member-{m:04}")), Role::Member);
        let skill = &skills[m % skills.len()];
        let request = ledger.request_skill(&session, skill, None).expect("request");
        if m % 3 == 0 {
            ledger
                .reject_skill_request(&staff, &request, None)
                .expect("reject");
        } else {
            ledger
                .approve_skill_request(&staff, &request, None)
                .expect("approve");
        }
    }

    assert_eq!(ledger.all_requests().len(), 1_000);
    assert!(ledger.pending_requests().is_empty());
    assert_eq!(ledger.all_grants().len(), 666);

    for m in 0..1_000 {
        let user = UserId::new(format!("member-{m:04}"));
        let tool = EquipmentId::new(format!("tool-{}", m % skills.len()));
        let decision = ledger.can_access(&staff, &user, &tool).expect("staff may check");
        assert_eq!(decision.can_access, m % 3 != 0, "{user}");
    }
}
