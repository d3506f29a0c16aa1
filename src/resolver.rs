//! Resolution of the desired skill set for a project.
//!
//! Collects global, project-scoped, and conditional references from the
//! configuration, deduplicates them by identity with a running-max
//! priority, and derives collision-free install names. The output is
//! deterministic for a given configuration and project root regardless
//! of the order sections are traversed in.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::path::Path;

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::config::SkillsConfig;
use crate::error::Result;
use crate::matcher::FileMatcher;
use crate::reference::SkillRef;
use crate::utils::paths;

/// How a skill entered the resolved set. Variant order is priority
/// order: project beats global beats conditional.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum SkillType {
    Conditional,
    Global,
    Project,
}

impl std::fmt::Display for SkillType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Conditional => write!(f, "conditional"),
            Self::Global => write!(f, "global"),
            Self::Project => write!(f, "project"),
        }
    }
}

/// A skill that should be active for a project, with its final on-disk
/// install name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedSkill {
    pub skill: SkillRef,
    pub skill_type: SkillType,
    pub install_name: String,
}

impl ResolvedSkill {
    /// Whether the install name was namespace-qualified during
    /// collision resolution.
    pub fn is_namespaced(&self) -> Result<bool> {
        Ok(self.install_name != self.skill.base_name()?)
    }
}

/// Compute the ordered, deduplicated, collision-free skill set for
/// `project_root`.
pub fn resolve(
    config: &SkillsConfig,
    project_root: &Path,
    matcher: &dyn FileMatcher,
) -> Result<Vec<ResolvedSkill>> {
    let mut entries: Vec<(SkillRef, SkillType)> = Vec::new();
    let mut by_identity: HashMap<String, usize> = HashMap::new();

    let mut collect = |skill: &SkillRef, skill_type: SkillType| {
        match by_identity.entry(skill.identity()) {
            Entry::Occupied(slot) => {
                // Running max keeps the result independent of the order
                // the same identity is sighted in.
                let (_, existing) = &mut entries[*slot.get()];
                if skill_type > *existing {
                    *existing = skill_type;
                }
            }
            Entry::Vacant(slot) => {
                slot.insert(entries.len());
                entries.push((skill.clone(), skill_type));
            }
        }
    };

    for skill in &config.global {
        collect(skill, SkillType::Global);
    }

    let root = paths::normalize(&project_root.to_string_lossy());
    for (key, skills) in &config.projects {
        // Keys that don't resolve on this platform simply don't match.
        if paths::normalize(key) != root {
            continue;
        }
        for skill in skills {
            collect(skill, SkillType::Project);
        }
    }

    for rule in &config.conditional {
        if !matcher.has_match(project_root, &rule.when) {
            continue;
        }
        for skill in &rule.skills {
            collect(skill, SkillType::Conditional);
        }
    }

    assign_install_names(entries)
}

/// Derive install names, qualifying every member of a base-name group of
/// two or more with its owner. Groups never interfere with each other.
fn assign_install_names(entries: Vec<(SkillRef, SkillType)>) -> Result<Vec<ResolvedSkill>> {
    let base_names: Vec<String> = entries
        .iter()
        .map(|(skill, _)| skill.base_name())
        .collect::<Result<_>>()?;

    let groups: HashMap<&String, Vec<usize>> = base_names
        .iter()
        .enumerate()
        .map(|(idx, name)| (name, idx))
        .into_group_map();

    let mut resolved: Vec<Option<ResolvedSkill>> = vec![None; entries.len()];
    for (base, indices) in groups {
        let collides = indices.len() >= 2;
        for idx in indices {
            let (skill, skill_type) = &entries[idx];
            let install_name = if collides {
                format!("{}.{base}", skill.owner()?)
            } else {
                base.clone()
            };
            resolved[idx] = Some(ResolvedSkill {
                skill: skill.clone(),
                skill_type: *skill_type,
                install_name,
            });
        }
    }

    Ok(resolved.into_iter().flatten().collect())
}
