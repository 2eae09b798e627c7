//! In-memory indexes over grants and skill requests.
//!
//! - [`GrantIndex`] — grants by ID, member and skill, plus revocations.
//! - [`RequestIndex`] — skill requests by ID and member.
//!
//! Both hold owned copies of the records. Secondary indexes only ever
//! hold IDs; status changes go through `get_mut` on the primary map, so
//! the secondary indexes never need rewriting.

use std::collections::HashMap;

use crate::grant::{GrantId, Revocation, UserSkillGrant};
use crate::member::UserId;
use crate::skill::SkillId;
use crate::workflow::{RequestId, SkillRequest};

// ── GrantIndex ────────────────────────────────────────────────────────────────

/// In-memory index over [`UserSkillGrant`] and [`Revocation`] records.
#[derive(Debug, Default, Clone)]
pub struct GrantIndex {
    /// Primary store: grant ID → grant.
    by_id: HashMap<GrantId, UserSkillGrant>,
    /// Secondary index: member → grant IDs.
    by_user: HashMap<UserId, Vec<GrantId>>,
    /// Secondary index: skill → grant IDs.
    by_skill: HashMap<SkillId, Vec<GrantId>>,
    /// Revocation map: grant ID → revocation record.
    revocations: HashMap<GrantId, Revocation>,
}

impl GrantIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a grant. An existing grant with the same ID is replaced.
    pub fn insert(&mut self, grant: UserSkillGrant) {
        let id = grant.id.clone();
        let user = grant.user_id.clone();
        let skill = grant.skill_id.clone();

        if self.by_id.insert(id.clone(), grant).is_none() {
            self.by_user.entry(user).or_default().push(id.clone());
            self.by_skill.entry(skill).or_default().push(id);
        }
    }

    /// Insert a revocation record, keyed by the revoked grant.
    pub fn insert_revocation(&mut self, revocation: Revocation) {
        self.revocations
            .insert(revocation.grant_id.clone(), revocation);
    }

    pub fn get(&self, id: &GrantId) -> Option<&UserSkillGrant> {
        self.by_id.get(id)
    }

    pub fn get_mut(&mut self, id: &GrantId) -> Option<&mut UserSkillGrant> {
        self.by_id.get_mut(id)
    }

    /// All grants held by `user`, in insertion order.
    pub fn by_user(&self, user: &UserId) -> Vec<&UserSkillGrant> {
        self.by_user
            .get(user)
            .map(|ids| ids.iter().filter_map(|id| self.by_id.get(id)).collect())
            .unwrap_or_default()
    }

    /// All grants of `skill`, in insertion order.
    pub fn by_skill(&self, skill: &SkillId) -> Vec<&UserSkillGrant> {
        self.by_skill
            .get(skill)
            .map(|ids| ids.iter().filter_map(|id| self.by_id.get(id)).collect())
            .unwrap_or_default()
    }

    pub fn is_revoked(&self, id: &GrantId) -> bool {
        self.revocations.contains_key(id)
    }

    pub fn get_revocation(&self, id: &GrantId) -> Option<&Revocation> {
        self.revocations.get(id)
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Every grant, in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = &UserSkillGrant> {
        self.by_id.values()
    }

    /// IDs of every grant, for callers that mutate while scanning.
    pub fn ids(&self) -> Vec<GrantId> {
        self.by_id.keys().cloned().collect()
    }

    /// Every revocation, in unspecified order.
    pub fn revocations(&self) -> impl Iterator<Item = &Revocation> {
        self.revocations.values()
    }
}

// ── RequestIndex ──────────────────────────────────────────────────────────────

/// In-memory index over [`SkillRequest`] records.
#[derive(Debug, Default, Clone)]
pub struct RequestIndex {
    by_id: HashMap<RequestId, SkillRequest>,
    by_user: HashMap<UserId, Vec<RequestId>>,
}

impl RequestIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a request. An existing request with the same ID is replaced.
    pub fn insert(&mut self, request: SkillRequest) {
        let id = request.id.clone();
        let user = request.user_id.clone();
        if self.by_id.insert(id.clone(), request).is_none() {
            self.by_user.entry(user).or_default().push(id);
        }
    }

    pub fn get(&self, id: &RequestId) -> Option<&SkillRequest> {
        self.by_id.get(id)
    }

    pub fn get_mut(&mut self, id: &RequestId) -> Option<&mut SkillRequest> {
        self.by_id.get_mut(id)
    }

    /// All requests submitted by `user`, in insertion order.
    pub fn by_user(&self, user: &UserId) -> Vec<&SkillRequest> {
        self.by_user
            .get(user)
            .map(|ids| ids.iter().filter_map(|id| self.by_id.get(id)).collect())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SkillRequest> {
        self.by_id.values()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
