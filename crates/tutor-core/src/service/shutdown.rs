//! Graceful shutdown sequence.
//!
//! flush -> summarize every live session -> remove the checkpoint. The
//! signal path and the console loop both call [`shutdown`] after stopping
//! the maintenance tasks.

use serde::Serialize;

use crate::chat::manager::{SessionManager, SummaryOutcome};
use crate::service::archivist::{Archivist, FlushReport};
use crate::service::checkpoint::CheckpointWriter;
use crate::storage::archive_store::{CheckpointStore, SnapshotStore, SummaryStore};

/// What happened to the crash checkpoint at shutdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckpointDisposition {
    /// Flush succeeded, checkpoint deleted (or there was none).
    Removed,
    /// Flush failed, checkpoint rewritten so the unarchived turns survive.
    Kept,
    /// The checkpoint could not be removed or rewritten.
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShutdownReport {
    pub flush: Option<FlushReport>,
    pub flush_error: Option<String>,
    pub summaries_written: usize,
    pub summary_failures: usize,
    pub checkpoint: CheckpointDisposition,
}

impl ShutdownReport {
    /// Whether every in-memory turn reached an archive snapshot.
    pub fn is_clean(&self) -> bool {
        self.flush_error.is_none() && self.checkpoint == CheckpointDisposition::Removed
    }
}

/// Run the shutdown sequence against the given components.
#[tracing::instrument(skip_all)]
pub async fn shutdown<A, C, S>(
    archivist: &Archivist<A>,
    checkpoints: &CheckpointWriter<C>,
    sessions: &SessionManager<S>,
) -> ShutdownReport
where
    A: SnapshotStore,
    C: CheckpointStore,
    S: SummaryStore,
{
    tracing::info!("shutting down, archiving logs");

    let (flush, flush_error) = match archivist.flush_now().await {
        Ok(report) => (Some(report), None),
        Err(e) => {
            tracing::error!(error = %e, "final archival flush failed");
            (None, Some(e.to_string()))
        }
    };

    let mut summaries_written = 0;
    let mut summary_failures = 0;
    for student_id in sessions.active_sessions() {
        match sessions.maybe_summarize(&student_id).await {
            Ok(SummaryOutcome::Written { .. }) => summaries_written += 1,
            Ok(_) => {}
            Err(e) => {
                summary_failures += 1;
                tracing::warn!(%student_id, error = %e, "summary at shutdown failed");
            }
        }
    }

    let checkpoint = if flush_error.is_none() {
        match checkpoints.discard().await {
            Ok(_) => CheckpointDisposition::Removed,
            Err(e) => {
                tracing::warn!(error = %e, "failed to remove checkpoint");
                CheckpointDisposition::Failed
            }
        }
    } else {
        match checkpoints.write_now().await {
            Ok(entries) => {
                tracing::warn!(entries, "kept checkpoint with unarchived turns");
                CheckpointDisposition::Kept
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to rewrite checkpoint");
                CheckpointDisposition::Failed
            }
        }
    };

    let report = ShutdownReport {
        flush,
        flush_error,
        summaries_written,
        summary_failures,
        checkpoint,
    };
    tracing::info!(clean = report.is_clean(), "shutdown complete");
    report
}
