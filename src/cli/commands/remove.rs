use clap::Args;
use colored::Colorize;

use crate::app::AppContext;
use crate::cli::output::emit_json;
use crate::error::Result;

#[derive(Args, Debug)]
pub struct RemoveArgs {
    /// Skill source to remove from every configuration section
    pub source: String,
}

pub fn run(ctx: &AppContext, args: &RemoveArgs) -> Result<()> {
    let mut config = ctx.config.clone();
    let removed = config.remove_source(&args.source);
    if removed > 0 {
        config.save(&ctx.config_path)?;
    }

    if ctx.json {
        return emit_json(&serde_json::json!({
            "status": "ok",
            "source": args.source,
            "removed": removed,
        }));
    }
    if removed > 0 {
        println!(
            "{} Removed {} reference(s) to {}",
            "✓".green().bold(),
            removed,
            args.source
        );
        println!("  Run {} to clean up installed copies", "sk".cyan().bold());
    } else {
        println!("{} is not configured", args.source);
    }
    Ok(())
}
