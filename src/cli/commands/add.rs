use std::path::PathBuf;

use clap::Args;
use colored::Colorize;

use crate::app::AppContext;
use crate::cli::output::emit_json;
use crate::error::{Result, SkError};
use crate::reference::{self, SkillRef, SourceId};
use crate::utils::paths;

#[derive(Args, Debug)]
pub struct AddArgs {
    /// Skill source: owner/repo[@ref] or local
    pub source: String,

    /// Scope to a project (defaults to the current directory when given
    /// without a value)
    #[arg(long, value_name = "PATH", num_args = 0..=1, default_missing_value = ".")]
    pub project: Option<PathBuf>,

    /// Subdirectory within the source, or the directory of a local skill
    #[arg(long, value_name = "PATH")]
    pub skill: Option<String>,

    /// Add under a conditional rule matching this glob
    #[arg(long, value_name = "GLOB", conflicts_with = "project")]
    pub when: Option<String>,
}

pub fn run(ctx: &AppContext, args: &AddArgs) -> Result<()> {
    // Malformed references fail the whole add before any config change.
    let source_id = reference::parse_source(&args.source)?;
    if source_id == SourceId::Local && args.skill.is_none() {
        return Err(SkError::MalformedReference(
            "local sources require --skill <path>".to_string(),
        ));
    }
    let skill = SkillRef {
        source: args.source.clone(),
        path: args.skill.clone(),
    };

    let mut config = ctx.config.clone();
    let (added, scope) = if let Some(when) = &args.when {
        (
            config.add_conditional(when.clone(), skill),
            format!("conditional on {when}"),
        )
    } else if let Some(project) = &args.project {
        let key = paths::normalize(&project.to_string_lossy())
            .to_string_lossy()
            .into_owned();
        (
            config.add_project(key.clone(), skill),
            format!("project {key}"),
        )
    } else {
        (config.add_global(skill), "global".to_string())
    };

    if added {
        config.save(&ctx.config_path)?;
    }

    if ctx.json {
        return emit_json(&serde_json::json!({
            "status": "ok",
            "source": args.source,
            "scope": scope,
            "added": added,
        }));
    }
    if added {
        println!("{} Added {} ({scope})", "✓".green().bold(), args.source);
        println!("  Run {} to install it", "sk".cyan().bold());
    } else {
        println!("{} {} is already configured ({scope})", "✓".green(), args.source);
    }
    Ok(())
}
