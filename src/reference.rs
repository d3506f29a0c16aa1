//! Skill reference model.
//!
//! A skill is identified by a source string plus an optional path. The
//! source is either the sentinel `local` or `owner/repo[@ref]`. Parsing
//! yields a closed [`SourceId`] so the rest of the engine never touches
//! the raw sentinel.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SkError};

/// Sentinel source string for skills that live on the local filesystem.
pub const LOCAL_SOURCE: &str = "local";

/// A skill reference as written in the configuration document.
///
/// Two references are the same skill identity iff `source` and `path`
/// are byte-equal. The ref suffix is part of `source`, so pinning to a
/// different ref is a different identity for fetch purposes, but name
/// derivation ignores it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillRef {
    /// `local` or `owner/repo[@ref]`.
    pub source: String,
    /// Subdirectory within the source (monorepo skill), or the
    /// filesystem location for local sources.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl SkillRef {
    /// Build a remote reference with no subpath.
    #[must_use]
    pub fn remote(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            path: None,
        }
    }

    /// Build a local reference rooted at `path`.
    #[must_use]
    pub fn local(path: impl Into<String>) -> Self {
        Self {
            source: LOCAL_SOURCE.to_string(),
            path: Some(path.into()),
        }
    }

    /// Set the subpath.
    #[must_use]
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Identity key used for deduplication and in-sync comparison.
    #[must_use]
    pub fn identity(&self) -> String {
        format!("{}::{}", self.source, self.path.as_deref().unwrap_or(""))
    }

    /// Parse the source string into its typed form.
    pub fn source_id(&self) -> Result<SourceId> {
        parse_source(&self.source)
    }

    /// Derive the base install name: the final path segment when a path
    /// is present, the repo name otherwise.
    ///
    /// Pure and side-effect-free; called repeatedly during collision
    /// resolution.
    pub fn base_name(&self) -> Result<String> {
        if let Some(path) = &self.path {
            let trimmed = path.trim_end_matches('/');
            let segment = trimmed.rsplit('/').next().unwrap_or(trimmed);
            if segment.is_empty() {
                return Err(SkError::MalformedReference(format!(
                    "reference path has no final segment: {path}"
                )));
            }
            return Ok(segment.to_string());
        }
        match self.source_id()? {
            SourceId::Remote { repo, .. } => Ok(repo),
            SourceId::Local => Err(SkError::MalformedReference(
                "local reference requires a path".to_string(),
            )),
        }
    }

    /// Owner segment used to qualify install names on collision.
    pub fn owner(&self) -> Result<String> {
        match self.source_id()? {
            SourceId::Remote { owner, .. } => Ok(owner),
            SourceId::Local => Ok(LOCAL_SOURCE.to_string()),
        }
    }
}

/// Typed form of a source string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceId {
    /// The `local` sentinel; never sent to the fetch transport.
    Local,
    /// A GitHub-hosted repository, optionally pinned to a ref.
    Remote {
        owner: String,
        repo: String,
        git_ref: Option<String>,
    },
}

/// Parse `local` or `owner/repo[@ref]`.
pub fn parse_source(source: &str) -> Result<SourceId> {
    if source == LOCAL_SOURCE {
        return Ok(SourceId::Local);
    }

    let Some((owner, rest)) = source.split_once('/') else {
        return Err(SkError::MalformedReference(format!(
            "expected owner/repo[@ref] or local, got: {source}"
        )));
    };
    if owner.is_empty() || rest.is_empty() {
        return Err(SkError::MalformedReference(format!(
            "empty owner or repo segment in: {source}"
        )));
    }

    let (repo, git_ref) = match rest.split_once('@') {
        Some((repo, git_ref)) => (repo, Some(git_ref)),
        None => (rest, None),
    };
    if repo.is_empty() {
        return Err(SkError::MalformedReference(format!(
            "empty repo segment in: {source}"
        )));
    }
    if git_ref == Some("") {
        return Err(SkError::MalformedReference(format!(
            "empty ref after @ in: {source}"
        )));
    }

    Ok(SourceId::Remote {
        owner: owner.to_string(),
        repo: repo.to_string(),
        git_ref: git_ref.map(str::to_string),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_owner_repo() {
        let id = parse_source("obra/tdd").unwrap();
        assert_eq!(
            id,
            SourceId::Remote {
                owner: "obra".to_string(),
                repo: "tdd".to_string(),
                git_ref: None,
            }
        );
    }

    #[test]
    fn parse_owner_repo_with_ref() {
        let id = parse_source("obra/tdd@v2").unwrap();
        assert_eq!(
            id,
            SourceId::Remote {
                owner: "obra".to_string(),
                repo: "tdd".to_string(),
                git_ref: Some("v2".to_string()),
            }
        );
    }

    #[test]
    fn parse_local_sentinel() {
        assert_eq!(parse_source("local").unwrap(), SourceId::Local);
    }

    #[test]
    fn parse_rejects_missing_slash() {
        assert!(matches!(
            parse_source("tdd"),
            Err(SkError::MalformedReference(_))
        ));
    }

    #[test]
    fn parse_rejects_empty_segments() {
        assert!(parse_source("/tdd").is_err());
        assert!(parse_source("obra/").is_err());
        assert!(parse_source("obra/tdd@").is_err());
    }

    #[test]
    fn base_name_prefers_path_segment() {
        let skill = SkillRef::remote("obra/superpowers").with_path("skills/tdd");
        assert_eq!(skill.base_name().unwrap(), "tdd");
    }

    #[test]
    fn base_name_falls_back_to_repo() {
        let skill = SkillRef::remote("obra/tdd");
        assert_eq!(skill.base_name().unwrap(), "tdd");
    }

    #[test]
    fn base_name_ignores_ref_suffix() {
        let skill = SkillRef::remote("obra/tdd@v2");
        assert_eq!(skill.base_name().unwrap(), "tdd");
    }

    #[test]
    fn base_name_handles_trailing_slash() {
        let skill = SkillRef::local("/home/user/skills/writing/");
        assert_eq!(skill.base_name().unwrap(), "writing");
    }

    #[test]
    fn local_without_path_is_malformed() {
        let skill = SkillRef {
            source: LOCAL_SOURCE.to_string(),
            path: None,
        };
        assert!(skill.base_name().is_err());
    }

    #[test]
    fn identity_includes_path() {
        let a = SkillRef::remote("obra/superpowers").with_path("skills/tdd");
        let b = SkillRef::remote("obra/superpowers").with_path("skills/debug");
        assert_ne!(a.identity(), b.identity());
        assert_eq!(a.identity(), a.clone().identity());
    }

    #[test]
    fn identity_distinguishes_pinned_refs() {
        let a = SkillRef::remote("obra/tdd");
        let b = SkillRef::remote("obra/tdd@v2");
        assert_ne!(a.identity(), b.identity());
    }

    #[test]
    fn owner_of_local_is_sentinel() {
        let skill = SkillRef::local("/tmp/s");
        assert_eq!(skill.owner().unwrap(), "local");
    }
}
