//! `ringsync run`: the daemon, in the foreground.

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};

use ringsync_daemon::{start_blocking, LogFormat};

use super::ConfigPath;

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum LogFormatArg {
    #[default]
    Text,
    Json,
}

impl From<LogFormatArg> for LogFormat {
    fn from(arg: LogFormatArg) -> Self {
        match arg {
            LogFormatArg::Text => LogFormat::Text,
            LogFormatArg::Json => LogFormat::Json,
        }
    }
}

/// Arguments for `ringsync run`.
#[derive(Args, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub config: ConfigPath,

    /// Log line format on stderr.
    #[arg(long, value_enum, default_value_t = LogFormatArg::Text)]
    pub log_format: LogFormatArg,
}

impl RunArgs {
    pub fn run(self) -> Result<()> {
        start_blocking(&self.config.config, self.log_format.into())
            .context("daemon exited with error")
    }
}
