//! Archive status command.

use anyhow::Result;
use console::style;

use crate::state::Storage;

/// Show snapshot, checkpoint and summary counts for the data directory.
pub async fn status(storage: &Storage, json: bool) -> Result<()> {
    let status = storage.archive.status().await?;

    if json {
        let value = serde_json::json!({
            "version": env!("CARGO_PKG_VERSION"),
            "data_dir": storage.data_dir.display().to_string(),
            "archive": status,
            "schedule": {
                "checkpoint_interval_secs": storage.config.schedule.checkpoint_interval_secs,
                "archive_interval_secs": storage.config.schedule.archive_interval_secs,
            },
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!();
    println!(
        "  {} tutor v{}",
        style("⚡").bold(),
        env!("CARGO_PKG_VERSION")
    );
    println!("  {}", style(storage.data_dir.display()).dim());
    println!();

    println!("  {}", style("── Archive ──").dim());
    println!("  Snapshots:         {}", style(status.snapshots).bold());
    println!("  Students archived: {}", style(status.students_archived).bold());
    println!("  Summaries:         {}", style(status.summaries).bold());
    println!();

    println!("  {}", style("── Checkpoint ──").dim());
    match status.pending_checkpoint_entries {
        Some(entries) => {
            println!(
                "  {} {} unarchived entries from an unclean exit",
                style("!").yellow(),
                style(entries).yellow()
            );
            println!(
                "  Run {} to archive them",
                style("tutor flush").cyan()
            );
        }
        None => println!("  {} none", style("✓").green()),
    }
    println!();
    Ok(())
}
