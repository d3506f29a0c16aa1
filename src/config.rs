//! Declarative skill configuration document.
//!
//! One JSON document declares which skills apply globally, per project,
//! or conditionally on project contents. The document is machine-edited
//! by `sk add`/`sk remove`, so it is persisted as indented JSON with a
//! schema-reference field.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SkError};
use crate::reference::SkillRef;
use crate::utils::fs::write_atomic;

/// Schema reference written into newly created documents.
pub const CONFIG_SCHEMA: &str = "https://skway.dev/sk/config.schema.json";

/// A conditional activation rule: if at least one project file matches
/// `when`, the listed skills apply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionalRule {
    pub when: String,
    #[serde(default)]
    pub skills: Vec<SkillRef>,
}

/// The full configuration document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SkillsConfig {
    #[serde(
        rename = "$schema",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub schema: Option<String>,
    #[serde(default)]
    pub global: Vec<SkillRef>,
    #[serde(default)]
    pub projects: BTreeMap<String, Vec<SkillRef>>,
    #[serde(default)]
    pub conditional: Vec<ConditionalRule>,
}

impl SkillsConfig {
    /// Load the document from `path`. A missing file is an empty
    /// configuration, not an error.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)
            .map_err(|err| SkError::Config(format!("read {}: {err}", path.display())))?;
        serde_json::from_str(&raw).map_err(|err| {
            SkError::Config(format!(
                "parse {}: line {}, column {}: {err}",
                path.display(),
                err.line(),
                err.column()
            ))
        })
    }

    /// Persist as indented JSON, creating parent directories as needed.
    pub fn save(&self, path: &Path) -> Result<()> {
        let mut doc = self.clone();
        if doc.schema.is_none() {
            doc.schema = Some(CONFIG_SCHEMA.to_string());
        }
        let payload = serde_json::to_string_pretty(&doc)
            .map_err(|err| SkError::Serialization(err.to_string()))?;
        write_atomic(path, format!("{payload}\n").as_bytes())
    }

    /// Add a skill to the global section. Returns false when the same
    /// identity is already present.
    pub fn add_global(&mut self, skill: SkillRef) -> bool {
        if self.global.iter().any(|s| s.identity() == skill.identity()) {
            return false;
        }
        self.global.push(skill);
        true
    }

    /// Add a skill under a project key.
    pub fn add_project(&mut self, project: impl Into<String>, skill: SkillRef) -> bool {
        let entry = self.projects.entry(project.into()).or_default();
        if entry.iter().any(|s| s.identity() == skill.identity()) {
            return false;
        }
        entry.push(skill);
        true
    }

    /// Add a skill under a conditional rule, creating the rule if no
    /// rule with the same pattern exists.
    pub fn add_conditional(&mut self, when: impl Into<String>, skill: SkillRef) -> bool {
        let when = when.into();
        if let Some(rule) = self.conditional.iter_mut().find(|r| r.when == when) {
            if rule.skills.iter().any(|s| s.identity() == skill.identity()) {
                return false;
            }
            rule.skills.push(skill);
            return true;
        }
        self.conditional.push(ConditionalRule {
            when,
            skills: vec![skill],
        });
        true
    }

    /// Remove every reference with the given source string from all
    /// sections. Empty project entries and rules are pruned. Returns the
    /// number of references removed.
    pub fn remove_source(&mut self, source: &str) -> usize {
        let mut removed = 0;

        let before = self.global.len();
        self.global.retain(|s| s.source != source);
        removed += before - self.global.len();

        for skills in self.projects.values_mut() {
            let before = skills.len();
            skills.retain(|s| s.source != source);
            removed += before - skills.len();
        }
        self.projects.retain(|_, skills| !skills.is_empty());

        for rule in &mut self.conditional {
            let before = rule.skills.len();
            rule.skills.retain(|s| s.source != source);
            removed += before - rule.skills.len();
        }
        self.conditional.retain(|rule| !rule.skills.is_empty());

        removed
    }
}
