use std::path::PathBuf;
use std::time::Duration;

use clap::Args;
use colored::Colorize;
use indicatif::ProgressBar;

use crate::agents::{self, AgentKind};
use crate::app::AppContext;
use crate::cli::output::emit_json;
use crate::error::{Result, SkError};
use crate::fetch::GitFetcher;
use crate::matcher::WalkMatcher;
use crate::resolver;
use crate::state::SyncState;
use crate::sync::{SyncEngine, SyncOutcome};
use crate::utils::paths;

#[derive(Args, Debug, Default)]
pub struct SyncArgs {
    /// Project root (default: current directory)
    #[arg(long, value_name = "PATH")]
    pub project: Option<PathBuf>,

    /// Preview operations without writing
    #[arg(long)]
    pub dry_run: bool,

    /// Sync only the given agents instead of the detected set
    #[arg(long, value_enum, value_name = "AGENT")]
    pub agent: Vec<AgentKind>,
}

pub async fn run(ctx: &AppContext, args: &SyncArgs) -> Result<()> {
    let project_root = match &args.project {
        Some(path) => paths::normalize(&path.to_string_lossy()),
        None => std::env::current_dir()?,
    };

    let resolved = resolver::resolve(&ctx.config, &project_root, &WalkMatcher)?;
    let targets = agents::detect_targets(&project_root, &args.agent);
    let state = SyncState::load(&ctx.state_path)?;
    let engine = SyncEngine::new(GitFetcher::new(ctx.cache.clone()));

    let spinner = if ctx.json {
        None
    } else {
        let bar = ProgressBar::new_spinner();
        bar.set_message("syncing skills...");
        bar.enable_steady_tick(Duration::from_millis(120));
        Some(bar)
    };

    let result = engine
        .sync(&project_root, &resolved, &targets, &state, args.dry_run)
        .await;
    if let Some(bar) = spinner {
        bar.finish_and_clear();
    }
    let (outcome, new_state) = result?;

    if let Some(new_state) = new_state {
        new_state.save(&ctx.state_path)?;
    }

    if ctx.json {
        emit_json(&serde_json::json!({
            "status": if outcome.is_total_failure() { "failed" } else { "ok" },
            "project": project_root,
            "outcome": outcome,
        }))?;
    } else {
        print_report(&outcome);
    }

    if outcome.is_total_failure() {
        return Err(SkError::SyncFailed(format!(
            "all {} skills failed to sync",
            outcome.errors.len()
        )));
    }
    Ok(())
}

fn print_report(outcome: &SyncOutcome) {
    if outcome.already_in_sync {
        println!("{} Already in sync", "✓".green().bold());
        return;
    }
    if outcome.dry_run {
        println!("{}", "Dry run - no changes written".cyan());
    }

    for name in &outcome.synced {
        println!("{} {name}", "✓".green().bold());
    }
    for name in &outcome.removed {
        println!("{} {name} {}", "-".yellow(), "(removed)".dimmed());
    }
    for name in &outcome.orphaned {
        println!(
            "{} {name} is no longer configured; remove it manually if unwanted",
            "!".yellow()
        );
    }
    for skip in &outcome.skipped {
        println!(
            "{} {} exists but is not managed by sk, skipped: {}",
            "!".yellow(),
            skip.install_name,
            skip.path.dimmed()
        );
    }
    for err in &outcome.errors {
        println!("{} {}", "✗".red().bold(), err.message);
    }
    for warning in &outcome.ignore_warnings {
        println!(
            "{} {} is not covered by .gitignore",
            "!".yellow(),
            warning.path
        );
    }

    if outcome.synced.is_empty()
        && outcome.removed.is_empty()
        && outcome.orphaned.is_empty()
        && outcome.errors.is_empty()
    {
        println!("{} Nothing to sync", "✓".green().bold());
    }
}
