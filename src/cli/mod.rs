//! Command-line interface.

pub mod commands;
pub mod output;

use std::path::PathBuf;

use clap::Parser;

pub use commands::Commands;

#[derive(Parser, Debug)]
#[command(
    name = "sk",
    version,
    about = "Declarative skill routing for AI coding agents",
    long_about = "Routes reusable skill bundles into per-project agent directories \
                  from a single declarative configuration. Running sk with no \
                  subcommand syncs the current project."
)]
pub struct Cli {
    /// Path to the configuration document
    #[arg(long, global = true, env = "SK_CONFIG", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Machine-readable JSON output
    #[arg(long, global = true)]
    pub json: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress log output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}
