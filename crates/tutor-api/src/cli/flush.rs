//! Offline archival of a leftover checkpoint.

use anyhow::Result;
use console::style;
use serde::Serialize;

use tutor_core::service::archivist::{FlushReport, LoadReport};
use tutor_core::service::checkpoint::RecoveryReport;

use crate::state::Storage;

#[derive(Debug, Serialize)]
pub struct OfflineFlush {
    pub loaded: LoadReport,
    pub recovered: RecoveryReport,
    /// `None` when the checkpoint held nothing the snapshots lacked.
    pub flush: Option<FlushReport>,
    pub checkpoint_removed: bool,
}

/// Merge the checkpoint over the latest snapshots and archive the result.
///
/// Nothing is written when the checkpoint adds no entries, so running this
/// twice does not duplicate snapshots.
pub async fn flush_offline(storage: &Storage) -> Result<OfflineFlush> {
    let (loaded, recovered) = storage.restore().await?;

    let flush = if recovered.recovered > 0 {
        Some(storage.archivist.flush_now().await?)
    } else {
        None
    };
    let checkpoint_removed = storage.checkpoints.discard().await?;

    Ok(OfflineFlush {
        loaded,
        recovered,
        flush,
        checkpoint_removed,
    })
}

pub async fn flush(storage: &Storage, json: bool) -> Result<()> {
    let outcome = flush_offline(storage).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return Ok(());
    }

    println!();
    match &outcome.flush {
        Some(report) => println!(
            "  {} Archived {} recovered entries ({} student(s)) as {}",
            style("✓").green(),
            outcome.recovered.recovered,
            report.students,
            style(report.stamp.as_deref().unwrap_or("-")).cyan()
        ),
        None if outcome.recovered.found => println!(
            "  {} Checkpoint held nothing new ({} entries already archived)",
            style("✓").green(),
            outcome.recovered.dropped
        ),
        None => println!("  {} No checkpoint to archive", style("✓").green()),
    }
    if outcome.checkpoint_removed {
        println!("  {} Checkpoint removed", style("✓").green());
    }
    println!();
    Ok(())
}
