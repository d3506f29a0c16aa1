//! Content fetching.
//!
//! Resolves a skill reference to a filesystem path: local passthrough,
//! cache-hit lookup, or clone-and-cache on a miss. The clone transport
//! is the `git` binary, treated as an opaque primitive and bounded by a
//! fixed timeout; the resulting commit SHA is read with git2.

pub mod cleanup;

use std::path::PathBuf;
use std::time::Duration;

use tokio::process::Command;
use tracing::{debug, info};

use crate::cache::CacheDir;
use crate::error::{Result, SkError};
use crate::reference::{SkillRef, SourceId};
use crate::utils::paths;

use cleanup::TempDirGuard;

/// Fixed clone timeout; an elapsed clone is a fetch failure.
pub const CLONE_TIMEOUT: Duration = Duration::from_secs(120);

/// A fetched skill: where its content lives, and the commit it came
/// from (None for local sources).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedSkill {
    pub path: PathBuf,
    pub commit_sha: Option<String>,
}

/// The fetch contract consumed by the sync orchestrator.
pub trait Fetch {
    async fn fetch(&self, skill: &SkillRef) -> Result<FetchedSkill>;
}

/// Cache-backed fetcher cloning from GitHub.
pub struct GitFetcher {
    cache: CacheDir,
    url_base: String,
    clone_timeout: Duration,
}

impl GitFetcher {
    #[must_use]
    pub fn new(cache: CacheDir) -> Self {
        Self {
            cache,
            url_base: "https://github.com".to_string(),
            clone_timeout: CLONE_TIMEOUT,
        }
    }

    /// Override the clone URL base (file:// roots in tests).
    #[must_use]
    pub fn with_url_base(mut self, base: impl Into<String>) -> Self {
        self.url_base = base.into();
        self
    }

    /// Override the clone timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.clone_timeout = timeout;
        self
    }

    fn fetch_local(skill: &SkillRef) -> Result<FetchedSkill> {
        let Some(path) = &skill.path else {
            return Err(SkError::MalformedReference(
                "local reference requires a path".to_string(),
            ));
        };
        let dir = paths::expand_home(path);
        if !dir.is_dir() {
            return Err(SkError::SkillNotFound(format!(
                "local skill directory does not exist: {}",
                dir.display()
            )));
        }
        Ok(FetchedSkill {
            path: dir,
            commit_sha: None,
        })
    }

    async fn fetch_remote(
        &self,
        skill: &SkillRef,
        owner: &str,
        repo: &str,
        git_ref: Option<&str>,
    ) -> Result<FetchedSkill> {
        let subpath = skill.path.as_deref();

        if let Some((path, sha)) = self.cache.lookup(owner, repo, subpath) {
            return Ok(FetchedSkill {
                path,
                commit_sha: Some(sha),
            });
        }

        let temp = self.cache.temp_clone_dir(&skill.source);
        if temp.exists() {
            // A previous interrupted run left this behind; the path is
            // deterministic, so pre-cleaning makes retries idempotent.
            std::fs::remove_dir_all(&temp)?;
        }
        if let Some(parent) = temp.parent() {
            crate::utils::fs::ensure_dir(parent)?;
        }
        let guard = TempDirGuard::new(temp.clone());

        let url = format!("{}/{owner}/{repo}.git", self.url_base);
        info!(source = %skill.source, url, "cloning");
        self.clone_into(skill, &url, git_ref, &guard).await?;

        let sha = head_commit(guard.path())?;

        if let Some(sub) = subpath {
            if !guard.path().join(sub).is_dir() {
                return Err(SkError::SkillNotFound(format!(
                    "path {sub} does not exist in {owner}/{repo}"
                )));
            }
        }

        let path = self.cache.store(owner, repo, &sha, subpath, guard.path())?;
        debug!(source = %skill.source, sha, "cached");
        Ok(FetchedSkill {
            path,
            commit_sha: Some(sha),
        })
    }

    async fn clone_into(
        &self,
        skill: &SkillRef,
        url: &str,
        git_ref: Option<&str>,
        guard: &TempDirGuard,
    ) -> Result<()> {
        let mut cmd = Command::new("git");
        cmd.arg("clone").arg("--depth").arg("1");
        if let Some(git_ref) = git_ref {
            cmd.arg("--branch").arg(git_ref);
        }
        cmd.arg(url).arg(guard.path());
        cmd.kill_on_drop(true);

        let output = tokio::time::timeout(self.clone_timeout, cmd.output())
            .await
            .map_err(|_| SkError::FetchFailure {
                src: skill.source.clone(),
                reason: format!("clone timed out after {}s", self.clone_timeout.as_secs()),
            })?
            .map_err(|err| SkError::FetchFailure {
                src: skill.source.clone(),
                reason: format!("failed to run git: {err}"),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SkError::FetchFailure {
                src: skill.source.clone(),
                reason: stderr.trim().to_string(),
            });
        }
        Ok(())
    }
}

impl Fetch for GitFetcher {
    async fn fetch(&self, skill: &SkillRef) -> Result<FetchedSkill> {
        match skill.source_id()? {
            SourceId::Local => Self::fetch_local(skill),
            SourceId::Remote {
                owner,
                repo,
                git_ref,
            } => {
                self.fetch_remote(skill, &owner, &repo, git_ref.as_deref())
                    .await
            }
        }
    }
}

/// HEAD commit SHA of a completed clone.
fn head_commit(repo_path: &std::path::Path) -> Result<String> {
    let repo = git2::Repository::open(repo_path)?;
    let commit = repo.head()?.peel_to_commit()?;
    Ok(commit.id().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache(dir: &tempfile::TempDir) -> CacheDir {
        CacheDir::new(dir.path().join("cache"))
    }

    #[tokio::test]
    async fn local_fetch_returns_directory() {
        let dir = tempfile::tempdir().unwrap();
        let skill_dir = dir.path().join("my-skill");
        std::fs::create_dir_all(&skill_dir).unwrap();

        let fetcher = GitFetcher::new(cache(&dir));
        let fetched = fetcher
            .fetch(&SkillRef::local(skill_dir.to_string_lossy()))
            .await
            .unwrap();
        assert_eq!(fetched.path, skill_dir);
        assert_eq!(fetched.commit_sha, None);
    }

    #[tokio::test]
    async fn local_fetch_missing_directory_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = GitFetcher::new(cache(&dir));
        let err = fetcher
            .fetch(&SkillRef::local(
                dir.path().join("absent").to_string_lossy(),
            ))
            .await
            .unwrap_err();
        assert!(matches!(err, SkError::SkillNotFound(_)));
    }

    #[tokio::test]
    async fn cache_hit_skips_the_transport() {
        let dir = tempfile::tempdir().unwrap();
        let cache = cache(&dir);
        let entry = cache.entry_dir("obra", "tdd", "sha42");
        std::fs::create_dir_all(&entry).unwrap();
        std::fs::write(entry.join("SKILL.md"), "---\nname: tdd\n---\n").unwrap();

        // url_base points nowhere: a transport attempt would fail loudly.
        let fetcher = GitFetcher::new(cache).with_url_base("file:///nonexistent");
        let fetched = fetcher.fetch(&SkillRef::remote("obra/tdd")).await.unwrap();
        assert_eq!(fetched.commit_sha.as_deref(), Some("sha42"));
        assert_eq!(fetched.path, entry);
    }

    #[tokio::test]
    async fn clone_failure_is_fetch_failure_and_cleans_temp() {
        let dir = tempfile::tempdir().unwrap();
        let cache = cache(&dir);
        let temp = cache.temp_clone_dir("obra/absent");
        let fetcher = GitFetcher::new(cache).with_url_base(format!(
            "file://{}",
            dir.path().join("no-repos").display()
        ));

        let err = fetcher
            .fetch(&SkillRef::remote("obra/absent"))
            .await
            .unwrap_err();
        assert!(matches!(err, SkError::FetchFailure { .. }));
        assert!(!temp.exists());
    }
}
