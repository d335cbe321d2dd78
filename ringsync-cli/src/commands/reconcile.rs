//! `ringsync reconcile`: one reconciliation pass without watching.

use anyhow::{Context, Result};
use clap::Args;

use ringsync_sync::{
    from_kind,
    pipeline::{self, ReconcileScope},
    PathReconciliation, ReplicaResult,
};

use super::ConfigPath;

/// Arguments for `ringsync reconcile`.
#[derive(Args, Debug)]
pub struct ReconcileArgs {
    #[command(flatten)]
    pub config: ConfigPath,

    /// Reconcile only this tracked path.
    #[arg(long)]
    pub path: Option<String>,

    /// Show what would be replicated without writing anything.
    #[arg(long)]
    pub dry_run: bool,
}

impl ReconcileArgs {
    pub fn run(self) -> Result<()> {
        let config = self.config.load()?;
        let replicator = from_kind(&config.replicator);
        let scope = match self.path.clone() {
            Some(path) => ReconcileScope::Path(path),
            None => ReconcileScope::All,
        };

        let results = pipeline::run(&config, &replicator, scope, self.dry_run)
            .context("reconciliation failed")?;
        for result in &results {
            print_result(result, self.dry_run);
        }
        Ok(())
    }
}

fn print_result(result: &PathReconciliation, dry_run: bool) {
    let prefix = if dry_run { "[dry-run] " } else { "" };
    let writes = result.writes();
    if writes == 0 {
        println!(
            "{prefix}✓ '{}' consistent (canonical: {})",
            result.tracked, result.canonical
        );
    } else {
        println!(
            "{prefix}✓ '{}' reconciled from {} ({} replicated, {} unchanged)",
            result.tracked,
            result.canonical,
            writes,
            result.replicas.len() - writes - 1
        );
    }

    for replica in &result.replicas {
        match replica {
            ReplicaResult::Canonical { path, .. } => println!("  ★  {}", path.display()),
            ReplicaResult::Replicated { path, .. } => println!("  ✎  {}", path.display()),
            ReplicaResult::WouldReplicate { path, .. } => println!("  ~  {}", path.display()),
            ReplicaResult::Unchanged { path, .. } => println!("  ·  {}", path.display()),
        }
    }
}
