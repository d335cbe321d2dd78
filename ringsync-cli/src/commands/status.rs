//! `ringsync status`: drift between client copies, read-only.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use ringsync_core::ClientName;
use ringsync_sync::{
    consistency::{check, format_datetime_age},
    ConsistencySignal, CopyState, PathConsistency,
};

use super::ConfigPath;

/// Arguments for `ringsync status`.
#[derive(Args, Debug)]
pub struct StatusArgs {
    #[command(flatten)]
    pub config: ConfigPath,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

impl StatusArgs {
    pub fn run(self) -> Result<()> {
        let config = self.config.load()?;
        let report = check(&config.clients, &config.tracked).context("status check failed")?;

        if self.json {
            print_json(config.clients.len(), &report)?;
        } else {
            print_table(config.clients.len(), &report);
        }
        Ok(())
    }
}

#[derive(Serialize)]
struct StatusReportJson<'a> {
    summary: StatusSummaryJson,
    paths: &'a [PathConsistency],
}

#[derive(Serialize)]
struct StatusSummaryJson {
    clients: usize,
    tracked: usize,
    drifted: usize,
}

#[derive(Tabled)]
struct CopyRow {
    #[tabled(rename = "client")]
    client: String,
    #[tabled(rename = "state")]
    state: String,
    #[tabled(rename = "size")]
    size: String,
    #[tabled(rename = "modified")]
    modified: String,
    #[tabled(rename = "sha256")]
    digest: String,
}

fn drifted(report: &[PathConsistency]) -> usize {
    report
        .iter()
        .filter(|path| !matches!(path.signal, ConsistencySignal::Consistent))
        .count()
}

fn print_json(clients: usize, report: &[PathConsistency]) -> Result<()> {
    let payload = StatusReportJson {
        summary: StatusSummaryJson {
            clients,
            tracked: report.len(),
            drifted: drifted(report),
        },
        paths: report,
    };
    println!(
        "{}",
        serde_json::to_string_pretty(&payload).context("failed to serialize status JSON")?
    );
    Ok(())
}

fn print_table(clients: usize, report: &[PathConsistency]) {
    let drifted = drifted(report);
    println!(
        "ringsync v{} | {} clients | {} tracked paths | {} drifted",
        env!("CARGO_PKG_VERSION"),
        clients,
        report.len(),
        drifted,
    );

    let separator = "■".repeat(67).bright_black().to_string();
    println!("{separator}");
    for path in report {
        println!(
            "{} {} {}",
            signal_indicator(&path.signal),
            path.tracked.to_string().bold(),
            signal_label(&path.signal)
        );
        let rows: Vec<CopyRow> = path
            .copies
            .iter()
            .map(|copy| copy_row(copy, &path.signal))
            .collect();
        let mut table = Table::new(rows);
        table.with(Style::rounded());
        println!("{table}");
        println!("{separator}");
    }

    if drifted > 0 {
        println!("Run 'ringsync reconcile' to converge drifted paths.");
    }
}

fn copy_row(copy: &CopyState, signal: &ConsistencySignal) -> CopyRow {
    let Some(digest) = copy.digest.as_deref() else {
        return CopyRow {
            client: copy.client.to_string(),
            state: "missing".red().to_string(),
            size: "-".to_string(),
            modified: "-".to_string(),
            digest: "-".to_string(),
        };
    };

    let state = if listed(signal, &copy.client) {
        "diverged".yellow().to_string()
    } else {
        "ok".green().to_string()
    };
    CopyRow {
        client: copy.client.to_string(),
        state,
        size: copy.size.map_or_else(|| "-".to_string(), |size| size.to_string()),
        modified: copy
            .modified
            .map_or_else(|| "-".to_string(), |at| format!("{} ago", format_datetime_age(at))),
        digest: digest.chars().take(12).collect(),
    }
}

fn listed(signal: &ConsistencySignal, client: &ClientName) -> bool {
    match signal {
        ConsistencySignal::Diverged { clients } | ConsistencySignal::Missing { clients } => {
            clients.contains(client)
        }
        ConsistencySignal::Consistent | ConsistencySignal::Absent => false,
    }
}

fn signal_label(signal: &ConsistencySignal) -> &'static str {
    match signal {
        ConsistencySignal::Consistent => "CONSISTENT",
        ConsistencySignal::Diverged { .. } => "DIVERGED",
        ConsistencySignal::Missing { .. } => "MISSING",
        ConsistencySignal::Absent => "ABSENT",
    }
}

fn signal_indicator(signal: &ConsistencySignal) -> String {
    match signal {
        ConsistencySignal::Consistent => "■".green().bold().to_string(),
        ConsistencySignal::Diverged { .. } => "■".yellow().bold().to_string(),
        ConsistencySignal::Missing { .. } => "■".red().bold().to_string(),
        ConsistencySignal::Absent => "■".magenta().bold().to_string(),
    }
}
