use std::path::PathBuf;

use clap::Args;
use colored::Colorize;

use crate::agents;
use crate::app::AppContext;
use crate::cli::output::emit_json;
use crate::error::Result;
use crate::manifest;
use crate::matcher::WalkMatcher;
use crate::resolver::{self, ResolvedSkill};
use crate::state::{ProjectState, SyncState};
use crate::utils::format::truncate_string;
use crate::utils::paths;

#[derive(Args, Debug, Default)]
pub struct ListArgs {
    /// Project root (default: current directory)
    #[arg(long, value_name = "PATH")]
    pub project: Option<PathBuf>,
}

pub fn run(ctx: &AppContext, args: &ListArgs) -> Result<()> {
    let project_root = match &args.project {
        Some(path) => paths::normalize(&path.to_string_lossy()),
        None => std::env::current_dir()?,
    };

    let resolved = resolver::resolve(&ctx.config, &project_root, &WalkMatcher)?;
    let state = SyncState::load(&ctx.state_path)?;
    let project = state.project(&project_root).cloned().unwrap_or_default();
    let orphans = state.orphaned_skills(&project_root, &resolved);

    if ctx.json {
        let entries: Vec<serde_json::Value> = resolved
            .iter()
            .map(|skill| {
                let installed = project.skills.get(&skill.install_name);
                serde_json::json!({
                    "installName": skill.install_name,
                    "type": skill.skill_type,
                    "source": skill.skill.source,
                    "path": skill.skill.path,
                    "installed": installed.is_some(),
                    "commitSha": installed.and_then(|i| i.commit_sha.clone()),
                })
            })
            .collect();
        return emit_json(&serde_json::json!({
            "project": project_root,
            "skills": entries,
            "orphaned": orphans,
        }));
    }

    if resolved.is_empty() && orphans.is_empty() {
        println!("No skills configured for {}", project_root.display());
        return Ok(());
    }

    println!("{}", format!("Skills for {}", project_root.display()).bold());
    println!();
    for skill in &resolved {
        print_skill(skill, &project, &project_root);
    }
    for name in &orphans {
        println!(
            "  {} {name} {}",
            "!".yellow(),
            "(installed but no longer configured)".dimmed()
        );
    }
    Ok(())
}

fn print_skill(skill: &ResolvedSkill, project: &ProjectState, project_root: &std::path::Path) {
    let status = if project.skills.contains_key(&skill.install_name) {
        "✓".green().bold().to_string()
    } else {
        "·".dimmed().to_string()
    };
    let description = installed_description(skill, project_root)
        .map(|d| truncate_string(&d, 60))
        .unwrap_or_default();
    println!(
        "  {status} {:24} {:12} {} {}",
        skill.install_name.bold(),
        format!("[{}]", skill.skill_type).dimmed(),
        skill.skill.source.cyan(),
        description.dimmed()
    );
}

/// Read the manifest description from the first agent target carrying
/// an installed copy.
fn installed_description(skill: &ResolvedSkill, project_root: &std::path::Path) -> Option<String> {
    agents::detect_targets(project_root, &[])
        .iter()
        .map(|target| target.path.join(&skill.install_name))
        .filter(|dest| dest.is_dir())
        .find_map(|dest| {
            manifest::read_manifest(&dest)
                .ok()
                .flatten()
                .and_then(|m| m.description)
        })
}
