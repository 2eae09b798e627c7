//! Capability URIs and wildcard matching.
//!
//! Capabilities use a URI scheme `area:action` with wildcards:
//!   - `skills:approve` — approve skill requests
//!   - `skills:*` — any skill workflow action
//!   - `*` — everything

use serde::{Deserialize, Serialize};

use crate::error::{AccessError, Result};

/// Submit a skill request for oneself.
pub const SKILLS_REQUEST: &str = "skills:request";
/// Approve a pending skill request.
pub const SKILLS_APPROVE: &str = "skills:approve";
/// Reject a pending skill request.
pub const SKILLS_REJECT: &str = "skills:reject";
/// Revoke a certified grant.
pub const SKILLS_REVOKE: &str = "skills:revoke";
/// Add or disable catalog entries.
pub const CATALOG_WRITE: &str = "catalog:write";
/// Ask the evaluator about one's own equipment access.
pub const ACCESS_CHECK: &str = "access:check";
/// Ask the evaluator about any member's equipment access.
pub const ACCESS_CHECK_ANY: &str = "access:check_any";
/// Record lapsed grants as expired.
pub const GRANTS_SWEEP: &str = "grants:sweep";

/// A single granted capability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capability {
    /// Capability URI (e.g. "skills:approve", "skills:*").
    pub uri: String,
}

impl Capability {
    pub fn new(uri: impl Into<String>) -> Self {
        Self { uri: uri.into() }
    }

    /// Check whether this capability covers a requested URI.
    pub fn covers(&self, requested: &str) -> bool {
        capability_uri_covers(&self.uri, requested)
    }
}

/// Check whether a granted URI covers a requested URI.
///
/// - `*` matches everything
/// - `area:*` matches `area` and anything under `area:`
/// - otherwise the URIs must match exactly
pub fn capability_uri_covers(granted: &str, requested: &str) -> bool {
    if granted == "*" || granted == requested {
        return true;
    }

    if let Some(prefix) = granted.strip_suffix(":*") {
        if requested == prefix {
            return true;
        }
        if requested.starts_with(prefix) && requested.as_bytes().get(prefix.len()) == Some(&b':') {
            return true;
        }
    }

    false
}

/// The capabilities a session holds, resolved once from its role.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilitySet {
    capabilities: Vec<Capability>,
}

impl CapabilitySet {
    pub fn new(capabilities: Vec<Capability>) -> Self {
        Self { capabilities }
    }

    /// Build a set from URI strings.
    pub fn from_uris(uris: &[&str]) -> Self {
        Self::new(uris.iter().map(|u| Capability::new(*u)).collect())
    }

    /// Add a capability.
    pub fn with(mut self, uri: &str) -> Self {
        self.capabilities.push(Capability::new(uri));
        self
    }

    /// Does any capability in the set cover `requested`?
    pub fn covers(&self, requested: &str) -> bool {
        self.capabilities.iter().any(|cap| cap.covers(requested))
    }

    /// Does the set cover every one of `requested`?
    pub fn covers_all(&self, requested: &[&str]) -> bool {
        requested.iter().all(|req| self.covers(req))
    }

    /// Return `PermissionDenied` unless `requested` is covered.
    pub fn require(&self, requested: &str) -> Result<()> {
        if self.covers(requested) {
            Ok(())
        } else {
            Err(AccessError::PermissionDenied(requested.to_string()))
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Capability> {
        self.capabilities.iter()
    }
}
