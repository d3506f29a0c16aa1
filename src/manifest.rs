//! SKILL.md manifest handling.
//!
//! A skill directory carries a `SKILL.md` whose YAML front matter names
//! the skill. When a collision forces a namespaced install name, the
//! manifest's name must be rewritten so the agent-visible name matches
//! the directory name. Only the first front-matter block and only its
//! name line are touched.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;

use crate::error::{Result, SkError};

/// Manifest file name inside a skill directory.
pub const MANIFEST_FILE: &str = "SKILL.md";

static NAME_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^name\s*:").expect("static pattern"));

/// Front-matter fields the router cares about.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SkillManifest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Read the front matter of a skill directory's manifest. Returns None
/// when the manifest or its front-matter block is absent.
pub fn read_manifest(skill_dir: &Path) -> Result<Option<SkillManifest>> {
    let path = skill_dir.join(MANIFEST_FILE);
    if !path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(&path)?;
    let lines: Vec<&str> = content.lines().collect();
    let Some((start, end)) = front_matter_bounds(&lines) else {
        return Ok(None);
    };
    let block = lines[start + 1..end].join("\n");
    let manifest = serde_yaml::from_str(&block).map_err(|err| {
        SkError::Serialization(format!("manifest {}: {err}", path.display()))
    })?;
    Ok(Some(manifest))
}

/// Rewrite the name line of the first front-matter block to
/// `new_name`. Returns true when a line was changed. Body content,
/// including lines that coincidentally start with `name:`, is left
/// untouched.
pub fn rewrite_manifest_name(skill_dir: &Path, new_name: &str) -> Result<bool> {
    let path = skill_dir.join(MANIFEST_FILE);
    if !path.exists() {
        return Ok(false);
    }
    let content = std::fs::read_to_string(&path)?;
    let mut lines: Vec<String> = content.lines().map(str::to_string).collect();

    let refs: Vec<&str> = lines.iter().map(String::as_str).collect();
    let Some((start, end)) = front_matter_bounds(&refs) else {
        return Ok(false);
    };

    let mut changed = false;
    for line in &mut lines[start + 1..end] {
        if NAME_LINE.is_match(line) {
            *line = format!("name: {new_name}");
            changed = true;
            break;
        }
    }
    if changed {
        let trailing = if content.ends_with('\n') { "\n" } else { "" };
        std::fs::write(&path, format!("{}{trailing}", lines.join("\n")))?;
    }
    Ok(changed)
}

/// Line indices of the opening and closing `---` of the first
/// front-matter block, if the file starts with one.
fn front_matter_bounds(lines: &[&str]) -> Option<(usize, usize)> {
    if lines.first().map(|l| l.trim_end()) != Some("---") {
        return None;
    }
    lines
        .iter()
        .enumerate()
        .skip(1)
        .find(|(_, line)| line.trim_end() == "---")
        .map(|(idx, _)| (0, idx))
}
