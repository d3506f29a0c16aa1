//! Persisted sync state.
//!
//! One document records, per project, the set of installed skills and a
//! global last-sync timestamp. The document is owned by this module and
//! mutated only through copy-on-write constructors: every update builds
//! a fresh value, so a dry run can discard the draft and the original
//! remains untouched.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SkError};
use crate::resolver::{ResolvedSkill, SkillType};
use crate::utils::fs::write_atomic;
use crate::utils::paths;

/// Current state document version.
pub const STATE_VERSION: u32 = 1;

/// One installed skill, keyed by install name within its project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstalledSkill {
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit_sha: Option<String>,
    pub synced_at: DateTime<Utc>,
    #[serde(default)]
    pub agents: BTreeSet<String>,
    #[serde(rename = "type")]
    pub skill_type: SkillType,
}

/// Per-project installed set plus advisory flags.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectState {
    #[serde(default)]
    pub skills: BTreeMap<String, InstalledSkill>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gitignore_suggested: Option<bool>,
}

/// Root persisted document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncState {
    pub version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_sync: Option<DateTime<Utc>>,
    #[serde(default)]
    pub projects: BTreeMap<String, ProjectState>,
}

impl Default for SyncState {
    fn default() -> Self {
        Self {
            version: STATE_VERSION,
            last_sync: None,
            projects: BTreeMap::new(),
        }
    }
}

/// Canonical map key for a project root.
#[must_use]
pub fn project_key(root: &Path) -> String {
    paths::normalize(&root.to_string_lossy())
        .to_string_lossy()
        .into_owned()
}

impl SyncState {
    /// Load from `path`; a missing file is the empty v1 document.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)
            .map_err(|err| SkError::Config(format!("read state {}: {err}", path.display())))?;
        let state: Self = serde_json::from_str(&raw).map_err(|err| {
            SkError::Config(format!("parse state {}: {err}", path.display()))
        })?;
        if state.version > STATE_VERSION {
            return Err(SkError::Config(format!(
                "state version {} is newer than supported {STATE_VERSION}",
                state.version
            )));
        }
        Ok(state)
    }

    /// Persist as indented JSON via temp-file rename.
    pub fn save(&self, path: &Path) -> Result<()> {
        let payload = serde_json::to_string_pretty(self)
            .map_err(|err| SkError::Serialization(err.to_string()))?;
        write_atomic(path, format!("{payload}\n").as_bytes())
    }

    /// Installed set for a project, if any.
    #[must_use]
    pub fn project(&self, root: &Path) -> Option<&ProjectState> {
        self.projects.get(&project_key(root))
    }

    /// True iff the installed set already matches `resolved`: equal
    /// counts, and every resolved install name present with matching
    /// source and path. Commit SHA is deliberately excluded — a newer
    /// upstream commit does not by itself force a resync.
    #[must_use]
    pub fn is_in_sync(&self, root: &Path, resolved: &[ResolvedSkill]) -> bool {
        let Some(project) = self.project(root) else {
            return resolved.is_empty();
        };
        if project.skills.len() != resolved.len() {
            return false;
        }
        resolved.iter().all(|r| {
            project.skills.get(&r.install_name).is_some_and(|installed| {
                installed.source == r.skill.source && installed.path == r.skill.path
            })
        })
    }

    /// Installed names with no corresponding entry in `resolved`.
    #[must_use]
    pub fn orphaned_skills(&self, root: &Path, resolved: &[ResolvedSkill]) -> Vec<String> {
        let Some(project) = self.project(root) else {
            return Vec::new();
        };
        project
            .skills
            .keys()
            .filter(|name| !resolved.iter().any(|r| &r.install_name == *name))
            .cloned()
            .collect()
    }

    /// Derive a new state with the given project entry replaced.
    #[must_use]
    pub fn with_project(&self, root: &Path, project: ProjectState) -> Self {
        let mut projects = self.projects.clone();
        projects.insert(project_key(root), project);
        Self {
            version: self.version,
            last_sync: self.last_sync,
            projects,
        }
    }

    /// Derive a new state with the last-sync timestamp bumped.
    #[must_use]
    pub fn with_last_sync(&self, at: DateTime<Utc>) -> Self {
        Self {
            version: self.version,
            last_sync: Some(at),
            projects: self.projects.clone(),
        }
    }

    /// Commit SHAs referenced by any installed skill in any project.
    /// This is the cache reclaimer's sole reachability root.
    #[must_use]
    pub fn reachable_commits(&self) -> BTreeSet<String> {
        self.projects
            .values()
            .flat_map(|p| p.skills.values())
            .filter_map(|s| s.commit_sha.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::SkillRef;

    fn installed(source: &str, path: Option<&str>) -> InstalledSkill {
        InstalledSkill {
            source: source.to_string(),
            path: path.map(str::to_string),
            commit_sha: Some("sha111".to_string()),
            synced_at: Utc::now(),
            agents: BTreeSet::from(["claude_code".to_string()]),
            skill_type: SkillType::Global,
        }
    }

    fn resolved(source: &str, name: &str) -> ResolvedSkill {
        ResolvedSkill {
            skill: SkillRef::remote(source),
            skill_type: SkillType::Global,
            install_name: name.to_string(),
        }
    }

    fn state_with(root: &Path, skills: &[(&str, InstalledSkill)]) -> SyncState {
        let project = ProjectState {
            skills: skills
                .iter()
                .map(|(name, skill)| ((*name).to_string(), skill.clone()))
                .collect(),
            gitignore_suggested: None,
        };
        SyncState::default().with_project(root, project)
    }

    #[test]
    fn empty_state_is_in_sync_with_empty_resolution() {
        let state = SyncState::default();
        assert!(state.is_in_sync(Path::new("/p"), &[]));
        assert!(!state.is_in_sync(Path::new("/p"), &[resolved("a/x", "x")]));
    }

    #[test]
    fn in_sync_requires_matching_source_and_path() {
        let root = Path::new("/p");
        let state = state_with(root, &[("tdd", installed("obra/tdd", None))]);

        assert!(state.is_in_sync(root, &[resolved("obra/tdd", "tdd")]));
        assert!(!state.is_in_sync(root, &[resolved("acme/tdd", "tdd")]));
        assert!(!state.is_in_sync(root, &[resolved("obra/tdd", "other")]));
    }

    #[test]
    fn in_sync_ignores_commit_sha_drift() {
        let root = Path::new("/p");
        let mut entry = installed("obra/tdd", None);
        entry.commit_sha = Some("very-old".to_string());
        let state = state_with(root, &[("tdd", entry)]);

        assert!(state.is_in_sync(root, &[resolved("obra/tdd", "tdd")]));
    }

    #[test]
    fn count_mismatch_is_out_of_sync() {
        let root = Path::new("/p");
        let state = state_with(root, &[("tdd", installed("obra/tdd", None))]);
        assert!(!state.is_in_sync(root, &[]));
        assert!(!state.is_in_sync(
            root,
            &[resolved("obra/tdd", "tdd"), resolved("a/b", "b")]
        ));
    }

    #[test]
    fn orphans_are_installed_names_missing_from_resolution() {
        let root = Path::new("/p");
        let state = state_with(
            root,
            &[
                ("tdd", installed("obra/tdd", None)),
                ("review", installed("acme/review", None)),
            ],
        );

        let orphans = state.orphaned_skills(root, &[resolved("obra/tdd", "tdd")]);
        assert_eq!(orphans, vec!["review".to_string()]);
    }

    #[test]
    fn with_project_leaves_original_untouched() {
        let root = Path::new("/p");
        let original = SyncState::default();
        let derived = original.with_project(
            root,
            ProjectState {
                skills: BTreeMap::from([("tdd".to_string(), installed("obra/tdd", None))]),
                gitignore_suggested: Some(true),
            },
        );

        assert!(original.projects.is_empty());
        assert_eq!(derived.projects.len(), 1);
    }

    #[test]
    fn load_missing_file_is_empty_v1() {
        let dir = tempfile::tempdir().unwrap();
        let state = SyncState::load(&dir.path().join("state.json")).unwrap();
        assert_eq!(state.version, STATE_VERSION);
        assert!(state.projects.is_empty());
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        let root = Path::new("/p");

        let state = state_with(root, &[("tdd", installed("obra/tdd", Some("skills/tdd")))])
            .with_last_sync(Utc::now());
        state.save(&path).unwrap();

        let loaded = SyncState::load(&path).unwrap();
        assert_eq!(loaded, state);
    }

    #[test]
    fn newer_version_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, r#"{"version": 99, "projects": {}}"#).unwrap();
        assert!(SyncState::load(&path).is_err());
    }

    #[test]
    fn reachable_commits_spans_all_projects() {
        let mut a = installed("obra/tdd", None);
        a.commit_sha = Some("sha111".to_string());
        let mut b = installed("acme/review", None);
        b.commit_sha = Some("sha222".to_string());
        let mut c = installed("local", Some("/tmp/s"));
        c.commit_sha = None;

        let state = state_with(Path::new("/p1"), &[("tdd", a)])
            .with_project(
                Path::new("/p2"),
                ProjectState {
                    skills: BTreeMap::from([
                        ("review".to_string(), b),
                        ("s".to_string(), c),
                    ]),
                    gitignore_suggested: None,
                },
            );

        let reachable = state.reachable_commits();
        assert_eq!(
            reachable,
            BTreeSet::from(["sha111".to_string(), "sha222".to_string()])
        );
    }
}
