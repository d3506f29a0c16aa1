use std::path::PathBuf;

use crate::cache::CacheDir;
use crate::cli::Cli;
use crate::config::SkillsConfig;
use crate::error::{Result, SkError};

/// Shared context for command execution: resolved paths, the loaded
/// configuration, and output preferences.
pub struct AppContext {
    pub config_path: PathBuf,
    pub config: SkillsConfig,
    pub state_path: PathBuf,
    pub cache: CacheDir,
    pub json: bool,
    pub verbosity: u8,
}

impl AppContext {
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let config_path = match &cli.config {
            Some(path) => path.clone(),
            None => default_config_path()?,
        };
        let config = SkillsConfig::load(&config_path)?;

        let state_path = match std::env::var("SK_STATE") {
            Ok(path) => PathBuf::from(path),
            Err(_) => dirs::data_dir()
                .ok_or_else(|| SkError::Config("data directory not found".to_string()))?
                .join("sk/state.json"),
        };

        let cache_root = match std::env::var("SK_CACHE_DIR") {
            Ok(path) => PathBuf::from(path),
            Err(_) => dirs::cache_dir()
                .ok_or_else(|| SkError::Config("cache directory not found".to_string()))?
                .join("sk/cache"),
        };

        Ok(Self {
            config_path,
            config,
            state_path,
            cache: CacheDir::new(cache_root),
            json: cli.json,
            verbosity: cli.verbose,
        })
    }
}

fn default_config_path() -> Result<PathBuf> {
    Ok(dirs::config_dir()
        .ok_or_else(|| SkError::Config("config directory not found".to_string()))?
        .join("sk/config.json"))
}
