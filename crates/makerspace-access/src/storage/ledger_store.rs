//! Ledger persistence.
//!
//! Stores skills, grants, requests and revocations as JSON files under a
//! directory tree:
//!
//! ```text
//! {base_dir}/
//! ├── skills/           — catalog entries
//! │   └── {skill_id}.json
//! ├── grants/           — member grants
//! │   └── {grant_id}.json
//! ├── requests/         — skill requests
//! │   └── {request_id}.json
//! └── revocations/      — revocation records, named by grant
//!     └── {grant_id}.json
//! ```
//!
//! Every file is a versioned wrapper keyed by record kind:
//! ```json
//! { "version": 1, "grant": { ... UserSkillGrant ... } }
//! ```

use std::path::{Path, PathBuf};

use log::debug;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::AccessConfig;
use crate::error::{AccessError, Result};
use crate::grant::{GrantId, Revocation, UserSkillGrant};
use crate::skill::{Skill, SkillId};
use crate::workflow::{RequestId, SkillLedger, SkillRequest};

// ── File format constants ─────────────────────────────────────────────────────

const LEDGER_FILE_VERSION: u32 = 1;

const SKILLS_DIR: &str = "skills";
const GRANTS_DIR: &str = "grants";
const REQUESTS_DIR: &str = "requests";
const REVOCATIONS_DIR: &str = "revocations";

const SKILL_KEY: &str = "skill";
const GRANT_KEY: &str = "grant";
const REQUEST_KEY: &str = "request";
const REVOCATION_KEY: &str = "revocation";

// ── LedgerStore ───────────────────────────────────────────────────────────────

/// Filesystem-backed store for the skill ledger.
pub struct LedgerStore {
    base_dir: PathBuf,
}

impl LedgerStore {
    /// Create a new `LedgerStore` rooted at `base_dir`.
    ///
    /// Creates the four record sub-directories if they do not already exist.
    ///
    /// # Errors
    ///
    /// Returns `AccessError::Io` if any directory cannot be created.
    pub fn new(base_dir: impl Into<PathBuf>) -> Result<Self> {
        let base_dir = base_dir.into();
        for sub in [SKILLS_DIR, GRANTS_DIR, REQUESTS_DIR, REVOCATIONS_DIR] {
            std::fs::create_dir_all(base_dir.join(sub))?;
        }
        Ok(Self { base_dir })
    }

    /// Open the store at the configured data directory.
    pub fn open(config: &AccessConfig) -> Result<Self> {
        Self::new(config.data_dir.clone())
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    // ── Skills ────────────────────────────────────────────────────────────────

    pub fn save_skill(&self, skill: &Skill) -> Result<()> {
        self.write_record(SKILLS_DIR, &skill.id.0, SKILL_KEY, skill)
    }

    /// # Errors
    ///
    /// Returns `AccessError::NotFound` if no file exists for `id`.
    pub fn load_skill(&self, id: &SkillId) -> Result<Skill> {
        self.read_record(SKILLS_DIR, &id.0, SKILL_KEY)
    }

    pub fn list_skills(&self) -> Result<Vec<SkillId>> {
        Ok(self.list_ids(SKILLS_DIR)?.into_iter().map(SkillId).collect())
    }

    // ── Grants ────────────────────────────────────────────────────────────────

    /// Persist a grant. The grant's hash is checked before writing.
    pub fn save_grant(&self, grant: &UserSkillGrant) -> Result<()> {
        grant.verify_hash()?;
        self.write_record(GRANTS_DIR, &grant.id.0, GRANT_KEY, grant)
    }

    /// Load a grant and verify its hash.
    ///
    /// # Errors
    ///
    /// Returns `AccessError::NotFound` if no file exists for `id`, and
    /// `AccessError::IntegrityViolation` if the file was edited.
    pub fn load_grant(&self, id: &GrantId) -> Result<UserSkillGrant> {
        let grant: UserSkillGrant = self.read_record(GRANTS_DIR, &id.0, GRANT_KEY)?;
        grant.verify_hash()?;
        Ok(grant)
    }

    pub fn list_grants(&self) -> Result<Vec<GrantId>> {
        Ok(self.list_ids(GRANTS_DIR)?.into_iter().map(GrantId).collect())
    }

    // ── Requests ──────────────────────────────────────────────────────────────

    pub fn save_request(&self, request: &SkillRequest) -> Result<()> {
        self.write_record(REQUESTS_DIR, &request.id.0, REQUEST_KEY, request)
    }

    pub fn load_request(&self, id: &RequestId) -> Result<SkillRequest> {
        self.read_record(REQUESTS_DIR, &id.0, REQUEST_KEY)
    }

    pub fn list_requests(&self) -> Result<Vec<RequestId>> {
        Ok(self.list_ids(REQUESTS_DIR)?.into_iter().map(RequestId).collect())
    }

    // ── Revocations ───────────────────────────────────────────────────────────

    /// Persist a revocation, named by the revoked grant.
    pub fn save_revocation(&self, revocation: &Revocation) -> Result<()> {
        self.write_record(
            REVOCATIONS_DIR,
            &revocation.grant_id.0,
            REVOCATION_KEY,
            revocation,
        )
    }

    pub fn load_revocation(&self, id: &GrantId) -> Result<Revocation> {
        self.read_record(REVOCATIONS_DIR, &id.0, REVOCATION_KEY)
    }

    pub fn list_revocations(&self) -> Result<Vec<GrantId>> {
        Ok(self
            .list_ids(REVOCATIONS_DIR)?
            .into_iter()
            .map(GrantId)
            .collect())
    }

    /// Return `true` if a revocation file exists for the given grant.
    pub fn is_revoked(&self, id: &GrantId) -> bool {
        self.record_path(REVOCATIONS_DIR, &id.0).exists()
    }

    // ── Whole ledger ──────────────────────────────────────────────────────────

    /// Load every record into a ledger configured from `config`.
    pub fn load_ledger(&self, config: &AccessConfig) -> Result<SkillLedger> {
        let skills = self
            .list_skills()?
            .iter()
            .map(|id| self.load_skill(id))
            .collect::<Result<Vec<_>>>()?;
        let grants = self
            .list_grants()?
            .iter()
            .map(|id| self.load_grant(id))
            .collect::<Result<Vec<_>>>()?;
        let requests = self
            .list_requests()?
            .iter()
            .map(|id| self.load_request(id))
            .collect::<Result<Vec<_>>>()?;
        let revocations = self
            .list_revocations()?
            .iter()
            .map(|id| self.load_revocation(id))
            .collect::<Result<Vec<_>>>()?;

        debug!(
            "loaded ledger from {}: {} skills, {} grants, {} requests, {} revocations",
            self.base_dir.display(),
            skills.len(),
            grants.len(),
            requests.len(),
            revocations.len()
        );

        Ok(SkillLedger::with_config(config).with_records(skills, grants, requests, revocations))
    }

    /// Persist every record of `ledger`, overwriting existing files.
    pub fn save_ledger(&self, ledger: &SkillLedger) -> Result<()> {
        for skill in ledger.catalog() {
            self.save_skill(skill)?;
        }
        for grant in ledger.all_grants() {
            self.save_grant(grant)?;
        }
        for request in ledger.all_requests() {
            self.save_request(request)?;
        }
        for revocation in ledger.revocations() {
            self.save_revocation(revocation)?;
        }
        Ok(())
    }

    // ── Internal helpers ──────────────────────────────────────────────────────

    /// Serialize and write a record to `{base_dir}/{sub_dir}/{id}.json`.
    fn write_record<T: Serialize>(
        &self,
        sub_dir: &str,
        id: &str,
        key: &str,
        record: &T,
    ) -> Result<()> {
        let value = serde_json::to_value(record)
            .map_err(|e| AccessError::SerializationError(e.to_string()))?;
        let mut wrapper = serde_json::Map::new();
        wrapper.insert("version".into(), LEDGER_FILE_VERSION.into());
        wrapper.insert(key.into(), value);

        let json = serde_json::to_string_pretty(&wrapper)
            .map_err(|e| AccessError::SerializationError(e.to_string()))?;
        std::fs::write(self.record_path(sub_dir, id), json.as_bytes())?;
        Ok(())
    }

    /// Read and unwrap a record from `{base_dir}/{sub_dir}/{id}.json`.
    fn read_record<T: DeserializeOwned>(&self, sub_dir: &str, id: &str, key: &str) -> Result<T> {
        let path = self.record_path(sub_dir, id);
        if !path.exists() {
            return Err(AccessError::NotFound(format!("{key} not found: {id}")));
        }

        let bytes = std::fs::read(&path)?;
        let mut wrapper: serde_json::Map<String, serde_json::Value> =
            serde_json::from_slice(&bytes).map_err(|e| {
                AccessError::InvalidFileFormat(format!(
                    "failed to parse {key} file {}: {e}",
                    path.display()
                ))
            })?;

        let version = wrapper.get("version").and_then(|v| v.as_u64());
        if version != Some(u64::from(LEDGER_FILE_VERSION)) {
            return Err(AccessError::InvalidFileFormat(format!(
                "unsupported {key} file version {:?} in {}",
                version,
                path.display()
            )));
        }

        let value = wrapper.remove(key).ok_or_else(|| {
            AccessError::InvalidFileFormat(format!("missing '{key}' in {}", path.display()))
        })?;
        serde_json::from_value(value).map_err(|e| {
            AccessError::InvalidFileFormat(format!(
                "failed to parse {key} in {}: {e}",
                path.display()
            ))
        })
    }

    fn record_path(&self, sub_dir: &str, id: &str) -> PathBuf {
        self.base_dir.join(sub_dir).join(format!("{id}.json"))
    }

    /// Read a directory listing and extract IDs from `{id}.json` filenames, sorted.
    fn list_ids(&self, sub_dir: &str) -> Result<Vec<String>> {
        let dir = self.base_dir.join(sub_dir);
        let mut ids = Vec::new();

        for entry in std::fs::read_dir(&dir)? {
            let entry = entry?;
            let name = entry.file_name();
            let name_str = name.to_string_lossy();

            if let Some(stem) = name_str.strip_suffix(".json") {
                ids.push(stem.to_string());
            }
        }

        ids.sort();
        Ok(ids)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
