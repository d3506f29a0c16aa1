use clap::{Args, Subcommand};
use colored::Colorize;

use crate::app::AppContext;
use crate::cli::output::emit_json;
use crate::error::Result;
use crate::state::SyncState;
use crate::utils::format::format_size;

#[derive(Args, Debug)]
pub struct CacheArgs {
    #[command(subcommand)]
    pub command: CacheCommands,
}

#[derive(Subcommand, Debug)]
pub enum CacheCommands {
    /// Delete cache entries unreachable from any project's state
    Clean,
}

pub fn run(ctx: &AppContext, args: &CacheArgs) -> Result<()> {
    match args.command {
        CacheCommands::Clean => clean(ctx),
    }
}

fn clean(ctx: &AppContext) -> Result<()> {
    let state = SyncState::load(&ctx.state_path)?;
    let report = ctx.cache.reclaim(&state)?;

    if ctx.json {
        return emit_json(&serde_json::json!({
            "status": "ok",
            "removed": report.removed,
            "freedBytes": report.freed_bytes,
        }));
    }
    if report.removed == 0 {
        println!("{} Cache is already clean", "✓".green().bold());
    } else {
        println!(
            "{} Removed {} cache entries, freed {}",
            "✓".green().bold(),
            report.removed,
            format_size(report.freed_bytes)
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use crate::cli::{Cli, Commands};

    #[test]
    fn parse_cache_clean() {
        let cli = Cli::parse_from(["sk", "cache", "clean"]);
        assert!(matches!(cli.command, Some(Commands::Cache(_))));
    }
}
