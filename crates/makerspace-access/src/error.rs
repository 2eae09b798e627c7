//! Error types for Makerspace Access.
//!
//! Every failure in the library is returned as a typed value; nothing in
//! the evaluator or the workflow panics on bad input.

/// Error types covering catalog, ledger, workflow and storage operations.
#[derive(Debug, thiserror::Error)]
pub enum AccessError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid state transition: {0}")]
    InvalidStateTransition(String),

    #[error("Skill already certified: {0}")]
    AlreadyCertified(String),

    #[error("Duplicate skill request: {0}")]
    DuplicateRequest(String),

    #[error("Skill disabled: {0}")]
    SkillDisabled(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Permission denied: missing capability {0}")]
    PermissionDenied(String),

    #[error("Integrity violation: {0}")]
    IntegrityViolation(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Invalid file format: {0}")]
    InvalidFileFormat(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AccessError {
    /// True for errors that reject a caller's request on domain grounds
    /// (as opposed to storage or configuration failures).
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidStateTransition(_)
                | Self::AlreadyCertified(_)
                | Self::DuplicateRequest(_)
                | Self::SkillDisabled(_)
                | Self::Validation(_)
        )
    }
}

/// Convenience Result alias.
pub type Result<T> = std::result::Result<T, AccessError>;
