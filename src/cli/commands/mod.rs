//! CLI command implementations
//!
//! Each subcommand has its own module with:
//! - Args struct for command-line arguments
//! - run() function to execute the command

use clap::Subcommand;

pub mod add;
pub mod cache;
pub mod completions;
pub mod config;
pub mod list;
pub mod remove;
pub mod sync;

use crate::app::AppContext;
use crate::error::Result;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Sync skills into the current project (the default)
    Sync(sync::SyncArgs),

    /// Add a skill reference to the configuration
    Add(add::AddArgs),

    /// Remove a skill source from the configuration
    Remove(remove::RemoveArgs),

    /// List resolved skills for a project
    List(list::ListArgs),

    /// Show the effective configuration
    Config(config::ConfigArgs),

    /// Manage the content-addressed skill cache
    Cache(cache::CacheArgs),

    /// Generate shell completions
    Completions(completions::CompletionsArgs),
}

/// Dispatch a command to its handler. A bare invocation syncs.
pub async fn run(ctx: &AppContext, command: Option<&Commands>) -> Result<()> {
    match command {
        None => sync::run(ctx, &sync::SyncArgs::default()).await,
        Some(Commands::Sync(args)) => sync::run(ctx, args).await,
        Some(Commands::Add(args)) => add::run(ctx, args),
        Some(Commands::Remove(args)) => remove::run(ctx, args),
        Some(Commands::List(args)) => list::run(ctx, args),
        Some(Commands::Config(args)) => config::run(ctx, args),
        Some(Commands::Cache(args)) => cache::run(ctx, args),
        Some(Commands::Completions(args)) => completions::run(args),
    }
}
