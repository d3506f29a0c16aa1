//! Error taxonomy for sk.

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, SkError>;

/// Errors produced by the skill routing engine.
#[derive(Debug, Error)]
pub enum SkError {
    /// A source string that is not `local` or `owner/repo[@ref]`.
    #[error("malformed skill reference: {0}")]
    MalformedReference(String),

    /// A skill directory that does not exist (local path, or subpath
    /// missing after a clone).
    #[error("skill not found: {0}")]
    SkillNotFound(String),

    /// Clone/network/timeout failure for a remote source.
    #[error("fetch failed for {src}: {reason}")]
    FetchFailure { src: String, reason: String },

    /// Unparseable or unusable configuration.
    #[error("configuration error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("git error: {0}")]
    Git(#[from] git2::Error),

    /// Every attempted skill failed during a sync run.
    #[error("{0}")]
    SyncFailed(String),
}

impl SkError {
    /// Short machine-readable code for JSON output.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::MalformedReference(_) => "malformed_reference",
            Self::SkillNotFound(_) => "skill_not_found",
            Self::FetchFailure { .. } => "fetch_failure",
            Self::Config(_) => "config_error",
            Self::Io(_) => "io_error",
            Self::Serialization(_) => "serialization_error",
            Self::Git(_) => "git_error",
            Self::SyncFailed(_) => "sync_failed",
        }
    }
}
