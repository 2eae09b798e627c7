//! Skill ledger — catalog, grants and requests, plus the workflow that
//! mutates them.
//!
//! Every mutation and every per-member access check takes the acting
//! [`Session`] and checks its capability set before touching state. A
//! failed call leaves the ledger unchanged.

use std::collections::{BTreeMap, BTreeSet};

use log::{debug, info, warn};

use crate::access::capability::{
    ACCESS_CHECK, ACCESS_CHECK_ANY, CATALOG_WRITE, GRANTS_SWEEP, SKILLS_APPROVE, SKILLS_REJECT,
    SKILLS_REQUEST, SKILLS_REVOKE,
};
use crate::access::evaluator::{active_skill_ids, evaluate};
use crate::access::{AccessDecision, Session};
use crate::config::AccessConfig;
use crate::error::{AccessError, Result};
use crate::grant::{
    GrantBuilder, GrantId, GrantStatus, Revocation, RevocationReason, UserSkillGrant,
};
use crate::index::{GrantIndex, RequestIndex};
use crate::member::UserId;
use crate::skill::{EquipmentId, Skill, SkillId, SkillStatus};

use super::request::{RequestId, SkillRequest};

/// The in-memory skill ledger.
#[derive(Debug, Clone)]
pub struct SkillLedger {
    skills: BTreeMap<SkillId, Skill>,
    grants: GrantIndex,
    requests: RequestIndex,
    /// Lifetime of newly certified grants (None = no expiry).
    grant_validity: Option<u64>,
    clock: fn() -> u64,
}

impl Default for SkillLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl SkillLedger {
    /// An empty ledger whose grants never expire.
    pub fn new() -> Self {
        Self {
            skills: BTreeMap::new(),
            grants: GrantIndex::new(),
            requests: RequestIndex::new(),
            grant_validity: None,
            clock: crate::time::now_micros,
        }
    }

    /// An empty ledger using the grant lifetime from `config`.
    pub fn with_config(config: &AccessConfig) -> Self {
        Self::new().with_grant_validity(config.grant_validity_micros())
    }

    pub fn with_grant_validity(mut self, micros: Option<u64>) -> Self {
        self.grant_validity = micros;
        self
    }

    /// Replace the time source.
    pub fn with_clock(mut self, clock: fn() -> u64) -> Self {
        self.clock = clock;
        self
    }

    /// Rebuild a ledger from stored records.
    ///
    /// Revocation records are authoritative: a grant with a revocation is
    /// marked revoked even if its stored status says otherwise.
    pub fn with_records(
        mut self,
        skills: Vec<Skill>,
        grants: Vec<UserSkillGrant>,
        requests: Vec<SkillRequest>,
        revocations: Vec<Revocation>,
    ) -> Self {
        for skill in skills {
            self.skills.insert(skill.id.clone(), skill);
        }
        for grant in grants {
            self.grants.insert(grant);
        }
        for request in requests {
            self.requests.insert(request);
        }
        for revocation in revocations {
            if let Some(grant) = self.grants.get_mut(&revocation.grant_id) {
                if grant.status != GrantStatus::Revoked {
                    warn!(
                        "grant {} has a revocation record but status {}; marking revoked",
                        grant.id, grant.status
                    );
                    grant.status = GrantStatus::Revoked;
                }
            }
            self.grants.insert_revocation(revocation);
        }
        self
    }

    pub fn now(&self) -> u64 {
        (self.clock)()
    }

    // ── Catalog administration ───────────────────────────────────────────────

    /// Add a skill to the catalog.
    pub fn add_skill(&mut self, session: &Session, skill: Skill) -> Result<SkillId> {
        session.require(CATALOG_WRITE)?;

        if self.skills.contains_key(&skill.id) {
            return Err(AccessError::Validation(format!(
                "skill {} already exists",
                skill.id
            )));
        }
        let duplicate_name = self
            .skills
            .values()
            .any(|s| s.is_active() && s.name.eq_ignore_ascii_case(&skill.name));
        if duplicate_name {
            return Err(AccessError::Validation(format!(
                "an active skill named '{}' already exists",
                skill.name
            )));
        }

        let id = skill.id.clone();
        info!(
            "skill {} ('{}') added by {} gating {} equipment",
            id,
            skill.name,
            session.user_id,
            skill.equipment_ids.len()
        );
        self.skills.insert(id.clone(), skill);
        Ok(id)
    }

    /// Disable a skill. Disabled skills stop gating equipment and cannot
    /// be requested; existing grants are kept.
    pub fn disable_skill(&mut self, session: &Session, skill_id: &SkillId) -> Result<()> {
        session.require(CATALOG_WRITE)?;

        let skill = self
            .skills
            .get_mut(skill_id)
            .ok_or_else(|| AccessError::NotFound(format!("skill not found: {skill_id}")))?;

        if skill.status == SkillStatus::Disabled {
            return Err(AccessError::InvalidStateTransition(format!(
                "skill {skill_id} is already disabled"
            )));
        }

        skill.status = SkillStatus::Disabled;
        info!(
            "skill {} disabled by {}; {} existing grant(s) kept",
            skill_id,
            session.user_id,
            self.grants.by_skill(skill_id).len()
        );
        Ok(())
    }

    // ── Request workflow ─────────────────────────────────────────────────────

    /// Submit a request for the session's member to be certified in `skill_id`.
    pub fn request_skill(
        &mut self,
        session: &Session,
        skill_id: &SkillId,
        notes: Option<String>,
    ) -> Result<RequestId> {
        session.require(SKILLS_REQUEST)?;
        let now = self.now();
        let user = &session.user_id;

        let skill = self
            .skills
            .get(skill_id)
            .ok_or_else(|| AccessError::NotFound(format!("skill not found: {skill_id}")))?;

        if !skill.is_active() {
            debug!("request by {user} for disabled skill {skill_id} refused");
            return Err(AccessError::SkillDisabled(skill.name.clone()));
        }

        if self.has_active_grant(user, skill_id, now) {
            debug!("request by {user} for already-held skill {skill_id} refused");
            return Err(AccessError::AlreadyCertified(format!(
                "{user} already holds an active grant for '{}'",
                skill.name
            )));
        }

        let duplicate = self
            .requests
            .by_user(user)
            .into_iter()
            .find(|r| r.is_pending() && &r.skill_id == skill_id);
        if let Some(existing) = duplicate {
            return Err(AccessError::DuplicateRequest(format!(
                "{user} already has pending request {} for '{}'",
                existing.id, skill.name
            )));
        }

        let request = SkillRequest::new(user.clone(), skill_id.clone(), notes, now);
        let id = request.id.clone();
        info!("skill request {id} created by {user} for {skill_id}");
        self.requests.insert(request);
        Ok(id)
    }

    /// Approve a pending request, certifying the member in the requested skill.
    ///
    /// Returns the new grant's ID. A request that is not pending is refused
    /// with `InvalidStateTransition` and no grant is created.
    pub fn approve_skill_request(
        &mut self,
        session: &Session,
        request_id: &RequestId,
        notes: Option<String>,
    ) -> Result<GrantId> {
        session.require(SKILLS_APPROVE)?;
        let now = self.now();

        let request = self
            .requests
            .get(request_id)
            .ok_or_else(|| {
                AccessError::NotFound(format!("skill request not found: {request_id}"))
            })?;
        request.ensure_pending("approve")?;

        let skill = self.skills.get(&request.skill_id).ok_or_else(|| {
            AccessError::NotFound(format!("skill not found: {}", request.skill_id))
        })?;

        let mut builder = GrantBuilder::new(
            request.user_id.clone(),
            skill.id.clone(),
            session.user_id.clone(),
        )
        .level(skill.required_level);
        if let Some(validity) = self.grant_validity {
            builder = builder.valid_for(validity);
        }
        if let Some(n) = &notes {
            builder = builder.notes(n.clone());
        }
        let grant = builder.certify_at(now)?;
        let grant_id = grant.id.clone();

        if let Some(request) = self.requests.get_mut(request_id) {
            request.approve(session.user_id.clone(), notes, grant_id.clone(), now)?;
        }

        info!(
            "skill request {} approved by {}; grant {} issued to {}",
            request_id, session.user_id, grant_id, grant.user_id
        );
        self.grants.insert(grant);
        Ok(grant_id)
    }

    /// Reject a pending request. No grant is created.
    pub fn reject_skill_request(
        &mut self,
        session: &Session,
        request_id: &RequestId,
        reason: Option<String>,
    ) -> Result<()> {
        session.require(SKILLS_REJECT)?;
        let now = self.now();

        let request = self
            .requests
            .get_mut(request_id)
            .ok_or_else(|| {
                AccessError::NotFound(format!("skill request not found: {request_id}"))
            })?;
        request.reject(session.user_id.clone(), reason, now)?;

        info!("skill request {} rejected by {}", request_id, session.user_id);
        Ok(())
    }

    /// Revoke a certified grant. The grant can never become active again;
    /// the member needs a brand-new grant.
    pub fn revoke_skill(
        &mut self,
        session: &Session,
        grant_id: &GrantId,
        reason: RevocationReason,
    ) -> Result<Revocation> {
        session.require(SKILLS_REVOKE)?;
        let now = self.now();

        let grant = self
            .grants
            .get_mut(grant_id)
            .ok_or_else(|| AccessError::NotFound(format!("grant not found: {grant_id}")))?;

        if grant.status != GrantStatus::Certified {
            return Err(AccessError::InvalidStateTransition(format!(
                "cannot revoke grant {grant_id}: status is {}",
                grant.status
            )));
        }

        grant.status = GrantStatus::Revoked;
        let revocation = Revocation::new(grant_id.clone(), session.user_id.clone(), reason, now);
        info!(
            "grant {} revoked by {} ({})",
            grant_id,
            session.user_id,
            revocation.reason.as_str()
        );
        self.grants.insert_revocation(revocation.clone());
        Ok(revocation)
    }

    /// Mark certified grants whose expiry has passed as `expired`.
    ///
    /// Returns the IDs that changed, sorted.
    pub fn sweep_expired(&mut self, session: &Session) -> Result<Vec<GrantId>> {
        session.require(GRANTS_SWEEP)?;
        let now = self.now();
        let mut swept = Vec::new();

        for id in self.grants.ids() {
            if let Some(grant) = self.grants.get_mut(&id) {
                if grant.status == GrantStatus::Certified && grant.is_expired_at(now) {
                    grant.status = GrantStatus::Expired;
                    swept.push(id);
                }
            }
        }

        swept.sort();
        if !swept.is_empty() {
            info!("{} grant(s) marked expired by {}", swept.len(), session.user_id);
        }
        Ok(swept)
    }

    // ── Evaluation ───────────────────────────────────────────────────────────

    /// Can `user` use `equipment` right now?
    ///
    /// Needs `access:check`; asking about another member also needs
    /// `access:check_any`.
    pub fn can_access(
        &self,
        session: &Session,
        user: &UserId,
        equipment: &EquipmentId,
    ) -> Result<AccessDecision> {
        require_check(session, user)?;
        let held = active_skill_ids(self.grants.by_user(user).into_iter(), self.now());
        Ok(evaluate(equipment, &held, self.skills.values()))
    }

    /// Every catalog-referenced equipment ID `user` can use right now, sorted.
    pub fn accessible_equipment(
        &self,
        session: &Session,
        user: &UserId,
    ) -> Result<Vec<EquipmentId>> {
        require_check(session, user)?;
        let held = active_skill_ids(self.grants.by_user(user).into_iter(), self.now());
        let referenced: BTreeSet<&EquipmentId> = self
            .skills
            .values()
            .flat_map(|skill| skill.equipment_ids.iter())
            .collect();

        Ok(referenced
            .into_iter()
            .filter(|equipment| evaluate(equipment, &held, self.skills.values()).can_access)
            .cloned()
            .collect())
    }

    /// Does `user` hold an active grant for `skill` at `now`?
    pub fn has_active_grant(&self, user: &UserId, skill: &SkillId, now: u64) -> bool {
        self.grants
            .by_user(user)
            .into_iter()
            .any(|g| &g.skill_id == skill && g.is_active_at(now))
    }

    // ── Queries ──────────────────────────────────────────────────────────────

    pub fn skill(&self, id: &SkillId) -> Option<&Skill> {
        self.skills.get(id)
    }

    /// The catalog sorted by skill name.
    pub fn catalog(&self) -> Vec<&Skill> {
        let mut skills: Vec<&Skill> = self.skills.values().collect();
        skills.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        skills
    }

    pub fn grant(&self, id: &GrantId) -> Option<&UserSkillGrant> {
        self.grants.get(id)
    }

    /// Grants held by `user`, oldest first.
    pub fn grants_for(&self, user: &UserId) -> Vec<&UserSkillGrant> {
        let mut grants = self.grants.by_user(user);
        grants.sort_by(|a, b| a.certified_at.cmp(&b.certified_at).then_with(|| a.id.cmp(&b.id)));
        grants
    }

    /// Every grant, oldest first.
    pub fn all_grants(&self) -> Vec<&UserSkillGrant> {
        let mut grants: Vec<&UserSkillGrant> = self.grants.iter().collect();
        grants.sort_by(|a, b| a.certified_at.cmp(&b.certified_at).then_with(|| a.id.cmp(&b.id)));
        grants
    }

    pub fn request(&self, id: &RequestId) -> Option<&SkillRequest> {
        self.requests.get(id)
    }

    /// Requests submitted by `user`, oldest first.
    pub fn requests_for(&self, user: &UserId) -> Vec<&SkillRequest> {
        let mut requests = self.requests.by_user(user);
        sort_requests(&mut requests);
        requests
    }

    /// Every request, oldest first.
    pub fn all_requests(&self) -> Vec<&SkillRequest> {
        let mut requests: Vec<&SkillRequest> = self.requests.iter().collect();
        sort_requests(&mut requests);
        requests
    }

    /// Requests still awaiting a decision, oldest first.
    pub fn pending_requests(&self) -> Vec<&SkillRequest> {
        let mut requests: Vec<&SkillRequest> =
            self.requests.iter().filter(|r| r.is_pending()).collect();
        sort_requests(&mut requests);
        requests
    }

    pub fn revocation(&self, grant_id: &GrantId) -> Option<&Revocation> {
        self.grants.get_revocation(grant_id)
    }

    /// Every revocation, oldest first.
    pub fn revocations(&self) -> Vec<&Revocation> {
        let mut revocations: Vec<&Revocation> = self.grants.revocations().collect();
        revocations.sort_by(|a, b| {
            a.revoked_at
                .cmp(&b.revoked_at)
                .then_with(|| a.grant_id.cmp(&b.grant_id))
        });
        revocations
    }
}

fn require_check(session: &Session, user: &UserId) -> Result<()> {
    session.require(ACCESS_CHECK)?;
    if user != &session.user_id {
        session.require(ACCESS_CHECK_ANY)?;
    }
    Ok(())
}

fn sort_requests(requests: &mut [&SkillRequest]) {
    requests.sort_by(|a, b| {
        a.requested_at
            .cmp(&b.requested_at)
            .then_with(|| a.id.cmp(&b.id))
    });
}
