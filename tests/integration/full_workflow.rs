//! Integration test: full end-to-end workflow.
//!
//! Tests the complete lifecycle:
//! 1. Build the skill catalog
//! 2. Member requests a skill
//! 3. Staff approves the request
//! 4. Member gains equipment access
//! 5. Admin revokes the grant and access is lost
//! 6. Grants expire with the configured validity window

use std::sync::atomic::{AtomicU64, Ordering};

use makerspace_access::access::capability::{
    ACCESS_CHECK_ANY, CATALOG_WRITE, GRANTS_SWEEP, SKILLS_REVOKE,
};
use makerspace_access::{
    AccessConfig, AccessError, EquipmentId, GrantStatus, RequestStatus, RevocationReason, Role,
    Session, SkillBuilder, SkillLedger, SkillLevel, UserId,
};

const DAY: u64 = 86_400_000_000;

static EXPIRY_CLOCK: AtomicU64 = AtomicU64::new(10 * DAY);

fn expiry_clock() -> u64 {
    EXPIRY_CLOCK.load(Ordering::SeqCst)
}

fn admin() -> Session {
    Session::new(UserId::new("admin"), Role::Admin)
}

fn staff() -> Session {
    Session::new(UserId::new("sam"), Role::Staff)
}

fn member(name: &str) -> Session {
    Session::new(UserId::new(name), Role::Member)
}

/// Ask, as staff, whether `user` may use `equipment`.
fn allowed(ledger: &SkillLedger, user: &str, equipment: &EquipmentId) -> bool {
    ledger
        .can_access(&staff(), &UserId::new(user), equipment)
        .expect("staff may check any member")
        .can_access
}

#[test]
fn full_workflow_request_to_revocation() {
    let mut ledger = SkillLedger::new();
    let laser = EquipmentId::new("laser-01");
    let lathe = EquipmentId::new("lathe-02");

    // ── Step 1: Build the skill catalog ─────────────────────────────────
    let laser_skill = ledger
        .add_skill(
            &admin(),
            SkillBuilder::new("Laser Cutter Safety")
                .category("fabrication")
                .level(SkillLevel::Basic)
                .equipment("laser-01")
                .build()
                .expect("valid skill"),
        )
        .expect("admin can edit the catalog");
    let metal_skill = ledger
        .add_skill(
            &admin(),
            SkillBuilder::new("Metal Lathe")
                .category("metalwork")
                .level(SkillLevel::Intermediate)
                .equipment("lathe-02")
                .build()
                .expect("valid skill"),
        )
        .expect("admin can edit the catalog");

    assert!(laser_skill.0.starts_with("skill_"));
    assert_eq!(ledger.catalog().len(), 2);

    // Before any grant, both tools are restricted and locked.
    let decision = ledger.can_access(&staff(), &UserId::new("alice"), &laser).unwrap();
    assert!(decision.is_restricted());
    assert!(!decision.can_access);
    assert_eq!(decision.missing_skills, vec!["Laser Cutter Safety".to_string()]);

    // Unreferenced equipment is open to everyone.
    assert!(allowed(&ledger, "alice", &EquipmentId::new("hand-drill")));

    // ── Step 2: Member requests a skill ─────────────────────────────────
    let alice = member("alice");
    let request_id = ledger
        .request_skill(&alice, &laser_skill, Some("took the intro class".into()))
        .expect("member can request an active skill");
    assert!(request_id.0.starts_with("sreq_"));
    assert_eq!(ledger.pending_requests().len(), 1);

    // A second pending request for the same skill is refused.
    let dup = ledger.request_skill(&alice, &laser_skill, None);
    assert!(matches!(dup, Err(AccessError::DuplicateRequest(_))));

    // Members cannot approve their own requests.
    let self_approve = ledger.approve_skill_request(&alice, &request_id, None);
    assert!(matches!(self_approve, Err(AccessError::PermissionDenied(_))));

    // ── Step 3: Staff approves the request ──────────────────────────────
    let grant_id = ledger
        .approve_skill_request(&staff(), &request_id, Some("good technique".into()))
        .expect("staff can approve");
    assert!(grant_id.0.starts_with("grant_"));

    let request = ledger.request(&request_id).expect("request kept");
    assert_eq!(request.status, RequestStatus::Approved);
    assert_eq!(request.grant_id.as_ref(), Some(&grant_id));
    assert!(ledger.pending_requests().is_empty());

    let grant = ledger.grant(&grant_id).expect("grant stored");
    assert_eq!(grant.status, GrantStatus::Certified);
    assert_eq!(grant.level, SkillLevel::Basic);
    assert_eq!(grant.certified_by, UserId::new("sam"));
    assert!(grant.verify_hash().is_ok());

    // Approving the same request again creates nothing.
    let again = ledger.approve_skill_request(&staff(), &request_id, None);
    assert!(matches!(again, Err(AccessError::InvalidStateTransition(_))));
    assert_eq!(ledger.grants_for(&UserId::new("alice")).len(), 1);

    // ── Step 4: Member gains equipment access ───────────────────────────
    let decision = ledger.can_access(&staff(), &UserId::new("alice"), &laser).unwrap();
    assert!(decision.can_access);
    assert!(decision.missing_skills.is_empty());
    assert!(!allowed(&ledger, "alice", &lathe));
    let alice_session = member("alice");
    assert_eq!(
        ledger
            .accessible_equipment(&alice_session, &alice_session.user_id)
            .unwrap(),
        vec![laser.clone()]
    );

    // Members may only check their own access.
    let peek = ledger.can_access(&member("bob"), &alice_session.user_id, &laser);
    match peek {
        Err(AccessError::PermissionDenied(cap)) => assert_eq!(cap, ACCESS_CHECK_ANY),
        other => panic!("expected PermissionDenied, got {other:?}"),
    }

    // Another member is unaffected.
    assert!(!allowed(&ledger, "bob", &laser));

    // Holding the skill blocks a fresh request.
    let held = ledger.request_skill(&alice, &laser_skill, None);
    assert!(matches!(held, Err(AccessError::AlreadyCertified(_))));

    // ── Step 5: Admin revokes the grant ─────────────────────────────────
    let denied = ledger.revoke_skill(&staff(), &grant_id, RevocationReason::SafetyViolation);
    match denied {
        Err(AccessError::PermissionDenied(cap)) => assert_eq!(cap, SKILLS_REVOKE),
        other => panic!("expected PermissionDenied, got {other:?}"),
    }

    let revocation = ledger
        .revoke_skill(&admin(), &grant_id, RevocationReason::SafetyViolation)
        .expect("admin can revoke");
    assert_eq!(revocation.grant_id, grant_id);
    assert_eq!(revocation.revoked_by, UserId::new("admin"));
    assert_eq!(ledger.grant(&grant_id).unwrap().status, GrantStatus::Revoked);
    assert!(!allowed(&ledger, "alice", &laser));

    // Revocation is terminal.
    let twice = ledger.revoke_skill(&admin(), &grant_id, RevocationReason::AdministrativeError);
    assert!(matches!(twice, Err(AccessError::InvalidStateTransition(_))));

    // The member can start over with a new request.
    let retry = ledger
        .request_skill(&alice, &laser_skill, None)
        .expect("revoked skill can be re-requested");
    ledger
        .reject_skill_request(&staff(), &retry, Some("retake the safety class".into()))
        .expect("staff can reject");
    assert_eq!(ledger.request(&retry).unwrap().status, RequestStatus::Rejected);
    assert!(!allowed(&ledger, "alice", &laser));

    // Staff cannot touch the catalog.
    let catalog_edit = ledger.disable_skill(&staff(), &metal_skill);
    match catalog_edit {
        Err(AccessError::PermissionDenied(cap)) => assert_eq!(cap, CATALOG_WRITE),
        other => panic!("expected PermissionDenied, got {other:?}"),
    }
}

#[test]
fn full_workflow_grant_expiry() {
    let config = AccessConfig::new("/tmp/unused").with_grant_validity_days(30);
    let mut ledger = SkillLedger::with_config(&config).with_clock(expiry_clock);

    let skill = ledger
        .add_skill(
            &admin(),
            SkillBuilder::new("CNC Router")
                .level(SkillLevel::Advanced)
                .equipment("cnc-01")
                .build()
                .unwrap(),
        )
        .unwrap();
    let cnc = EquipmentId::new("cnc-01");
    let carol = member("carol");

    let request = ledger.request_skill(&carol, &skill, None).unwrap();
    let grant_id = ledger.approve_skill_request(&staff(), &request, None).unwrap();

    let grant = ledger.grant(&grant_id).unwrap();
    assert_eq!(grant.expires_at, Some(40 * DAY));
    assert!(allowed(&ledger, "carol", &cnc));

    // Exactly at expiry the grant is no longer active.
    EXPIRY_CLOCK.store(40 * DAY, Ordering::SeqCst);
    assert!(!allowed(&ledger, "carol", &cnc));
    assert_eq!(ledger.grant(&grant_id).unwrap().status, GrantStatus::Certified);

    // Only admins may sweep; sweeping records the expiry.
    let refused = ledger.sweep_expired(&carol);
    match refused {
        Err(AccessError::PermissionDenied(cap)) => assert_eq!(cap, GRANTS_SWEEP),
        other => panic!("expected PermissionDenied, got {other:?}"),
    }
    assert_eq!(ledger.grant(&grant_id).unwrap().status, GrantStatus::Certified);

    let swept = ledger.sweep_expired(&admin()).unwrap();
    assert_eq!(swept, vec![grant_id.clone()]);
    assert_eq!(ledger.grant(&grant_id).unwrap().status, GrantStatus::Expired);
    assert!(ledger.sweep_expired(&admin()).unwrap().is_empty());

    // An expired grant cannot be revoked, but the skill can be re-requested.
    let revoke = ledger.revoke_skill(&admin(), &grant_id, RevocationReason::MembershipEnded);
    assert!(matches!(revoke, Err(AccessError::InvalidStateTransition(_))));
    assert!(ledger.request_skill(&carol, &skill, None).is_ok());
}

#[test]
fn full_workflow_disabled_skill_stops_gating() {
    let mut ledger = SkillLedger::new();
    let skill = ledger
        .add_skill(
            &admin(),
            SkillBuilder::new("Welding")
                .equipment("welder-01")
                .build()
                .unwrap(),
        )
        .unwrap();
    let welder = EquipmentId::new("welder-01");
    let dave = member("dave");

    assert!(!ledger.can_access(&dave, &dave.user_id, &welder).unwrap().can_access);

    ledger.disable_skill(&admin(), &skill).unwrap();

    let decision = ledger.can_access(&dave, &dave.user_id, &welder).unwrap();
    assert!(decision.can_access);
    assert!(!decision.is_restricted());

    let request = ledger.request_skill(&dave, &skill, None);
    assert!(matches!(request, Err(AccessError::SkillDisabled(_))));
}
