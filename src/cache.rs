//! Content-addressed skill cache.
//!
//! Fetched remote sources live under
//! `<root>/github/<owner>/<repo>/<commitSha>[/<subpath>]`. Entries are
//! immutable once written; an entry survives garbage collection purely
//! because some project's persisted state still names its commit SHA.

use std::path::{Path, PathBuf};

use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::error::Result;
use crate::state::SyncState;
use crate::utils::fs::{copy_dir_recursive, dir_size, ensure_dir};

/// Handle on the cache root directory.
#[derive(Debug, Clone)]
pub struct CacheDir {
    root: PathBuf,
}

/// Outcome of a reclaim pass.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct ReclaimReport {
    pub removed: usize,
    pub freed_bytes: u64,
}

impl CacheDir {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn github_dir(&self) -> PathBuf {
        self.root.join("github")
    }

    fn repo_dir(&self, owner: &str, repo: &str) -> PathBuf {
        self.github_dir().join(owner).join(repo)
    }

    /// Directory of one immutable cache entry.
    #[must_use]
    pub fn entry_dir(&self, owner: &str, repo: &str, sha: &str) -> PathBuf {
        self.repo_dir(owner, repo).join(sha)
    }

    /// Deterministic temp-clone location for a source string, so
    /// retried invocations converge on the same path and can be
    /// cleaned idempotently.
    #[must_use]
    pub fn temp_clone_dir(&self, source: &str) -> PathBuf {
        let digest = Sha256::digest(source.as_bytes());
        let key = hex::encode(&digest[..8]);
        self.root.join("tmp").join(format!("clone-{key}"))
    }

    /// Probe for any cached commit of `owner/repo` whose optional
    /// subpath exists. Returns the skill path plus the commit SHA.
    /// Deterministic among multiple hits: the lexicographically
    /// greatest SHA directory wins.
    #[must_use]
    pub fn lookup(
        &self,
        owner: &str,
        repo: &str,
        subpath: Option<&str>,
    ) -> Option<(PathBuf, String)> {
        let repo_dir = self.repo_dir(owner, repo);
        let entries = std::fs::read_dir(&repo_dir).ok()?;

        let mut shas: Vec<String> = entries
            .filter_map(std::result::Result::ok)
            .filter(|e| e.path().is_dir())
            .filter_map(|e| e.file_name().to_str().map(str::to_string))
            .collect();
        shas.sort();

        for sha in shas.into_iter().rev() {
            let entry = repo_dir.join(&sha);
            let skill_path = match subpath {
                Some(sub) => entry.join(sub),
                None => entry.clone(),
            };
            if skill_path.is_dir() {
                debug!(owner, repo, sha, "cache hit");
                return Some((skill_path, sha));
            }
        }
        None
    }

    /// Copy a fetched tree into the cache. Existing entries are
    /// immutable and returned as-is. Returns the skill path inside the
    /// entry.
    pub fn store(
        &self,
        owner: &str,
        repo: &str,
        sha: &str,
        subpath: Option<&str>,
        fetched_root: &Path,
    ) -> Result<PathBuf> {
        let entry = self.entry_dir(owner, repo, sha);
        let (src, dst) = match subpath {
            Some(sub) => (fetched_root.join(sub), entry.join(sub)),
            None => (fetched_root.to_path_buf(), entry.clone()),
        };
        if !dst.is_dir() {
            ensure_dir(&entry)?;
            copy_dir_recursive(&src, &dst)?;
        }
        Ok(dst)
    }

    /// Mark-reachable-then-sweep garbage collection: delete every SHA
    /// directory not named by any installed skill in `state`, then
    /// prune emptied repo and owner directories.
    pub fn reclaim(&self, state: &SyncState) -> Result<ReclaimReport> {
        let github = self.github_dir();
        if !github.is_dir() {
            return Ok(ReclaimReport::default());
        }

        let reachable = state.reachable_commits();
        let mut report = ReclaimReport::default();

        for owner in read_dirs(&github)? {
            for repo in read_dirs(&owner)? {
                for sha_dir in read_dirs(&repo)? {
                    let sha = sha_dir
                        .file_name()
                        .and_then(|n| n.to_str())
                        .unwrap_or_default()
                        .to_string();
                    if reachable.contains(&sha) {
                        continue;
                    }
                    let freed = dir_size(&sha_dir);
                    std::fs::remove_dir_all(&sha_dir)?;
                    report.removed += 1;
                    report.freed_bytes += freed;
                    debug!(sha, freed, "swept unreachable cache entry");
                }
                remove_if_empty(&repo)?;
            }
            remove_if_empty(&owner)?;
        }

        Ok(report)
    }
}

fn read_dirs(path: &Path) -> Result<Vec<PathBuf>> {
    let mut dirs: Vec<PathBuf> = std::fs::read_dir(path)?
        .filter_map(std::result::Result::ok)
        .map(|e| e.path())
        .filter(|p| p.is_dir())
        .collect();
    dirs.sort();
    Ok(dirs)
}

fn remove_if_empty(path: &Path) -> Result<()> {
    if std::fs::read_dir(path)?.next().is_none() {
        std::fs::remove_dir(path)?;
    }
    Ok(())
}
