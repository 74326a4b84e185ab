//! Temp checkpoint writer.
//!
//! Copies the whole log table to one well-known file so an unclean exit
//! loses at most one checkpoint interval of turns. Never clears memory.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Mutex;

use tutor_types::error::ArchiveError;

use crate::chat::log_store::LogStore;
use crate::storage::archive_store::CheckpointStore;

/// What `recover` merged back from a leftover checkpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RecoveryReport {
    pub found: bool,
    pub students: usize,
    pub recovered: usize,
    /// Entries already held from the loaded snapshots.
    pub dropped: usize,
}

pub struct CheckpointWriter<S: CheckpointStore> {
    store: Arc<S>,
    log: Arc<LogStore>,
    write_gate: Mutex<()>,
}

impl<S: CheckpointStore> CheckpointWriter<S> {
    pub fn new(store: Arc<S>, log: Arc<LogStore>) -> Self {
        Self {
            store,
            log,
            write_gate: Mutex::new(()),
        }
    }

    /// Overwrite the checkpoint with the current table. Returns the number of
    /// entries written.
    pub async fn write_now(&self) -> Result<usize, ArchiveError> {
        let _gate = self.write_gate.lock().await;
        let table = self.log.snapshot_all();
        let entries: usize = table.values().map(Vec::len).sum();
        self.store.write_checkpoint(&table).await?;
        tracing::debug!(students = table.len(), entries, "checkpoint written");
        Ok(entries)
    }

    /// Merge a leftover checkpoint back into the log store.
    ///
    /// Run after `Archivist::load_latest`, so entries covered by a student's
    /// loaded snapshot are recognised by timestamp and dropped.
    #[tracing::instrument(skip(self))]
    pub async fn recover(&self) -> Result<RecoveryReport, ArchiveError> {
        let Some(table) = self.store.read_checkpoint().await? else {
            return Ok(RecoveryReport::default());
        };

        let mut report = RecoveryReport {
            found: true,
            ..RecoveryReport::default()
        };
        for (student_id, entries) in table {
            let total = entries.len();
            let added = self.log.merge_recovered(&student_id, entries);
            if added > 0 {
                report.students += 1;
            }
            report.recovered += added;
            report.dropped += total - added;
        }

        if report.recovered > 0 {
            tracing::warn!(
                students = report.students,
                recovered = report.recovered,
                "recovered unarchived turns from checkpoint"
            );
        } else {
            tracing::info!(dropped = report.dropped, "checkpoint held nothing new");
        }
        Ok(report)
    }

    /// Delete the checkpoint. A missing file is not an error.
    pub async fn discard(&self) -> Result<bool, ArchiveError> {
        let _gate = self.write_gate.lock().await;
        let removed = self.store.remove_checkpoint().await?;
        if removed {
            tracing::info!("checkpoint removed");
        }
        Ok(removed)
    }
}
