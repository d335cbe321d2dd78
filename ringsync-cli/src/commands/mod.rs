pub mod config;
pub mod reconcile;
pub mod run;
pub mod status;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use ringsync_core::{config::load_resolved_at, ResolvedConfig, DEFAULT_CONFIG_PATH};

/// `--config` shared by every subcommand.
#[derive(Args, Debug)]
pub struct ConfigPath {
    /// Path to the daemon configuration file.
    #[arg(long, short = 'c', default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,
}

impl ConfigPath {
    pub fn load(&self) -> Result<ResolvedConfig> {
        load_resolved_at(&self.config)
            .with_context(|| format!("failed to load configuration from {}", self.config.display()))
    }
}
