use clap::Args;

use crate::app::AppContext;
use crate::cli::output::{HumanLayout, emit_human, emit_json};
use crate::error::{Result, SkError};

#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Print the configuration file path instead of its contents
    #[arg(long)]
    pub path: bool,
}

pub fn run(ctx: &AppContext, args: &ConfigArgs) -> Result<()> {
    if args.path {
        if ctx.json {
            return emit_json(&serde_json::json!({
                "path": ctx.config_path,
            }));
        }
        println!("{}", ctx.config_path.display());
        return Ok(());
    }

    if ctx.json {
        return emit_json(&ctx.config);
    }

    let mut layout = HumanLayout::new();
    layout
        .title("Configuration")
        .kv("Path", &ctx.config_path.display().to_string())
        .kv("Global skills", &ctx.config.global.len().to_string())
        .kv("Project entries", &ctx.config.projects.len().to_string())
        .kv("Conditional rules", &ctx.config.conditional.len().to_string())
        .blank();
    layout.push_line(
        serde_json::to_string_pretty(&ctx.config)
            .map_err(|err| SkError::Serialization(err.to_string()))?,
    );
    emit_human(layout);
    Ok(())
}
