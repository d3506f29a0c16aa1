//! Sync orchestration.
//!
//! Reconciles the resolved skill set for a project against the
//! installed set recorded in state: fetches sources, replaces install
//! directories per agent target, removes conditional orphans, and
//! reports partial failures without aborting sibling skills. State
//! updates are copy-on-write; a dry run returns no state at all.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};

use crate::agents::AgentTarget;
use crate::error::Result;
use crate::fetch::{Fetch, FetchedSkill};
use crate::manifest::rewrite_manifest_name;
use crate::resolver::{ResolvedSkill, SkillType};
use crate::state::{InstalledSkill, ProjectState, SyncState};
use crate::utils::fs::{copy_dir_recursive, read_optional};

/// One skill's failure within a run.
#[derive(Debug, Clone, Serialize)]
pub struct SyncError {
    pub install_name: String,
    pub message: String,
}

/// A target skipped to avoid clobbering a directory the router does not
/// manage.
#[derive(Debug, Clone, Serialize)]
pub struct SkippedTarget {
    pub install_name: String,
    pub path: String,
}

/// An agent target whose path is not covered by the project's ignore
/// file.
#[derive(Debug, Clone, Serialize)]
pub struct IgnoreWarning {
    pub agent: String,
    pub path: String,
}

/// Per-run report.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SyncOutcome {
    pub already_in_sync: bool,
    pub dry_run: bool,
    pub synced: Vec<String>,
    pub errors: Vec<SyncError>,
    pub removed: Vec<String>,
    pub orphaned: Vec<String>,
    pub skipped: Vec<SkippedTarget>,
    pub ignore_warnings: Vec<IgnoreWarning>,
}

impl SyncOutcome {
    /// True when skills were attempted and every one of them failed;
    /// the caller maps this to a non-zero exit.
    #[must_use]
    pub fn is_total_failure(&self) -> bool {
        !self.errors.is_empty() && self.synced.is_empty()
    }
}

/// Reconciliation engine, generic over the fetch contract.
pub struct SyncEngine<F> {
    fetcher: F,
}

impl<F: Fetch> SyncEngine<F> {
    pub const fn new(fetcher: F) -> Self {
        Self { fetcher }
    }

    /// Reconcile one project. Returns the run report plus the state to
    /// persist; `None` when nothing must be written (fast path or dry
    /// run).
    pub async fn sync(
        &self,
        project_root: &Path,
        resolved: &[ResolvedSkill],
        targets: &[AgentTarget],
        state: &SyncState,
        dry_run: bool,
    ) -> Result<(SyncOutcome, Option<SyncState>)> {
        let mut outcome = SyncOutcome {
            dry_run,
            ..SyncOutcome::default()
        };

        if state.is_in_sync(project_root, resolved) {
            outcome.already_in_sync = true;
            return Ok((outcome, None));
        }

        let prior = state.project(project_root).cloned().unwrap_or_default();
        let mut next_skills: BTreeMap<String, InstalledSkill> = BTreeMap::new();

        for skill in resolved {
            self.reconcile_skill(skill, targets, &prior, &mut next_skills, &mut outcome, dry_run)
                .await;
        }

        handle_orphans(
            project_root,
            resolved,
            targets,
            state,
            &prior,
            &mut next_skills,
            &mut outcome,
            dry_run,
        );

        let mut gitignore_suggested = prior.gitignore_suggested;
        if gitignore_suggested != Some(true) {
            outcome.ignore_warnings = check_ignore_coverage(project_root, targets)?;
            gitignore_suggested = Some(true);
        }

        if dry_run {
            return Ok((outcome, None));
        }

        let project = ProjectState {
            skills: next_skills,
            gitignore_suggested,
        };
        let next = state
            .with_project(project_root, project)
            .with_last_sync(Utc::now());
        Ok((outcome, Some(next)))
    }

    async fn reconcile_skill(
        &self,
        skill: &ResolvedSkill,
        targets: &[AgentTarget],
        prior: &ProjectState,
        next_skills: &mut BTreeMap<String, InstalledSkill>,
        outcome: &mut SyncOutcome,
        dry_run: bool,
    ) {
        let name = &skill.install_name;
        let fetched = match self.fetcher.fetch(&skill.skill).await {
            Ok(fetched) => fetched,
            Err(err) => {
                warn!(skill = %name, %err, "fetch failed");
                record_failure(skill, prior, next_skills, outcome, &err.to_string());
                return;
            }
        };

        let managed = prior.skills.contains_key(name);
        let mut reached: BTreeSet<String> = BTreeSet::new();
        let mut failed = false;

        for target in targets {
            let dest = target.path.join(name);
            if dest.exists() && !managed {
                warn!(
                    skill = %name,
                    path = %dest.display(),
                    "destination exists but is not managed, skipping"
                );
                outcome.skipped.push(SkippedTarget {
                    install_name: name.clone(),
                    path: dest.display().to_string(),
                });
                continue;
            }
            if !dry_run {
                if let Err(err) = install_into(skill, &fetched, &dest) {
                    warn!(skill = %name, path = %dest.display(), %err, "install failed");
                    record_failure(skill, prior, next_skills, outcome, &err.to_string());
                    failed = true;
                    break;
                }
            }
            reached.insert(target.kind.id().to_string());
        }

        if failed || reached.is_empty() {
            // All targets skipped (or a copy failed): nothing newly
            // installed, but a previously-working entry must survive.
            if let Some(prev) = prior.skills.get(name) {
                next_skills.entry(name.clone()).or_insert_with(|| prev.clone());
            }
            return;
        }

        info!(skill = %name, agents = reached.len(), "synced");
        next_skills.insert(
            name.clone(),
            InstalledSkill {
                source: skill.skill.source.clone(),
                path: skill.skill.path.clone(),
                commit_sha: fetched.commit_sha.clone(),
                synced_at: Utc::now(),
                agents: reached,
                skill_type: skill.skill_type,
            },
        );
        outcome.synced.push(name.clone());
    }
}

fn record_failure(
    skill: &ResolvedSkill,
    prior: &ProjectState,
    next_skills: &mut BTreeMap<String, InstalledSkill>,
    outcome: &mut SyncOutcome,
    reason: &str,
) {
    let name = &skill.install_name;
    outcome.errors.push(SyncError {
        install_name: name.clone(),
        message: format!("{name}: {reason}"),
    });
    if let Some(prev) = prior.skills.get(name) {
        next_skills.insert(name.clone(), prev.clone());
    }
}

#[allow(clippy::too_many_arguments)]
fn handle_orphans(
    project_root: &Path,
    resolved: &[ResolvedSkill],
    targets: &[AgentTarget],
    state: &SyncState,
    prior: &ProjectState,
    next_skills: &mut BTreeMap<String, InstalledSkill>,
    outcome: &mut SyncOutcome,
    dry_run: bool,
) {
    for name in state.orphaned_skills(project_root, resolved) {
        let Some(entry) = prior.skills.get(&name) else {
            continue;
        };
        if entry.skill_type == SkillType::Conditional {
            if !dry_run {
                for target in targets {
                    let dest = target.path.join(&name);
                    if dest.exists() {
                        if let Err(err) = std::fs::remove_dir_all(&dest) {
                            warn!(skill = %name, %err, "failed to remove orphan");
                        }
                    }
                }
            }
            info!(skill = %name, "removed orphaned conditional skill");
            outcome.removed.push(name);
        } else {
            // Global/project orphans are surfaced but never deleted.
            outcome.orphaned.push(name.clone());
            next_skills.insert(name, entry.clone());
        }
    }
}

/// Replace the destination wholesale and align the manifest name with a
/// namespaced install name.
fn install_into(skill: &ResolvedSkill, fetched: &FetchedSkill, dest: &Path) -> Result<()> {
    if dest.exists() {
        std::fs::remove_dir_all(dest)?;
    }
    copy_dir_recursive(&fetched.path, dest)?;
    if skill.is_namespaced()? {
        rewrite_manifest_name(dest, &skill.install_name)?;
    }
    Ok(())
}

/// Advisory ignore-file coverage: which agent targets are not covered
/// by the project's `.gitignore`. The ignore file is never written.
fn check_ignore_coverage(
    project_root: &Path,
    targets: &[AgentTarget],
) -> Result<Vec<IgnoreWarning>> {
    let entries: Vec<String> = read_optional(project_root.join(".gitignore"))?
        .map(|content| {
            content
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty() && !line.starts_with('#'))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    Ok(targets
        .iter()
        .filter_map(|target| {
            let rel = target
                .path
                .strip_prefix(project_root)
                .unwrap_or(&target.path)
                .to_string_lossy()
                .into_owned();
            if is_covered(&entries, &rel) {
                None
            } else {
                Some(IgnoreWarning {
                    agent: target.kind.id().to_string(),
                    path: rel,
                })
            }
        })
        .collect())
}

fn is_covered(entries: &[String], rel: &str) -> bool {
    let rel = rel.trim_end_matches('/');
    entries.iter().any(|entry| {
        let entry = entry.trim_start_matches('/').trim_end_matches('/');
        !entry.is_empty() && (entry == rel || rel.starts_with(&format!("{entry}/")))
    })
}
