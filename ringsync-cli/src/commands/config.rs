//! `ringsync config`: validate and show the resolved configuration.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use ringsync_core::{ClientTable, ReplicatorKind, ResolvedConfig, WatchList};

use super::ConfigPath;

/// Arguments for `ringsync config`.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(flatten)]
    pub config: ConfigPath,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

impl ConfigArgs {
    pub fn run(self) -> Result<()> {
        let config = self.config.load()?;
        if self.json {
            let payload = ConfigJson::from(&config);
            println!(
                "{}",
                serde_json::to_string_pretty(&payload)
                    .context("failed to serialize configuration JSON")?
            );
        } else {
            print_text(&self.config.config.display().to_string(), &config);
        }
        Ok(())
    }
}

#[derive(Serialize)]
struct ConfigJson<'a> {
    clients: &'a ClientTable,
    tracked: &'a WatchList,
    replicator: &'a ReplicatorKind,
    follow_writes: bool,
}

impl<'a> From<&'a ResolvedConfig> for ConfigJson<'a> {
    fn from(config: &'a ResolvedConfig) -> Self {
        Self {
            clients: &config.clients,
            tracked: &config.tracked,
            replicator: &config.replicator,
            follow_writes: config.follow_writes,
        }
    }
}

#[derive(Tabled)]
struct ClientRow {
    #[tabled(rename = "client")]
    name: String,
    #[tabled(rename = "root")]
    root: String,
}

fn print_text(source: &str, config: &ResolvedConfig) {
    println!("{} {source}", "✓ configuration valid:".green());

    let rows: Vec<ClientRow> = config
        .clients
        .iter()
        .map(|client| ClientRow {
            name: client.name.to_string(),
            root: client.root.clone(),
        })
        .collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");

    println!("{}", "tracked paths".bold());
    for path in &config.tracked {
        println!("  {path}");
    }

    let replicator = match &config.replicator {
        ReplicatorKind::Copy => "in-process copy".to_string(),
        ReplicatorKind::Command { program, args } => {
            format!("{} {}", program.display(), args.join(" "))
                .trim_end()
                .to_string()
        }
    };
    println!("replicator: {replicator}");
    println!("follow writes: {}", config.follow_writes);
}
