//! Store traits for the durable side of the log lifecycle.
//!
//! Uses RPITIT (native async fn in traits, Rust 2024 edition). One adapter
//! usually implements all three, but the components that use them only ask
//! for the one they need.

use tutor_types::chat::{LogEntry, LogTable};
use tutor_types::error::{ArchiveError, SummaryError};

use super::snapshot::SnapshotRef;

/// Per-student archive snapshots written by the archival flush.
pub trait SnapshotStore: Send + Sync {
    /// Write one student's full log under the given snapshot name.
    fn write_snapshot(
        &self,
        snapshot: &SnapshotRef,
        entries: &[LogEntry],
    ) -> impl std::future::Future<Output = Result<(), ArchiveError>> + Send;

    /// List every snapshot currently on disk, in no particular order.
    ///
    /// A missing snapshot directory is an empty list, not an error.
    fn list_snapshots(
        &self,
    ) -> impl std::future::Future<Output = Result<Vec<SnapshotRef>, ArchiveError>> + Send;

    /// Read back one snapshot's entries.
    fn read_snapshot(
        &self,
        snapshot: &SnapshotRef,
    ) -> impl std::future::Future<Output = Result<Vec<LogEntry>, ArchiveError>> + Send;
}

/// The single well-known crash-recovery checkpoint.
pub trait CheckpointStore: Send + Sync {
    /// Overwrite the checkpoint with the full table.
    fn write_checkpoint(
        &self,
        table: &LogTable,
    ) -> impl std::future::Future<Output = Result<(), ArchiveError>> + Send;

    /// Read the checkpoint, `None` if there is none.
    fn read_checkpoint(
        &self,
    ) -> impl std::future::Future<Output = Result<Option<LogTable>, ArchiveError>> + Send;

    /// Delete the checkpoint. Returns whether a file was removed.
    fn remove_checkpoint(
        &self,
    ) -> impl std::future::Future<Output = Result<bool, ArchiveError>> + Send;
}

/// One rolling summary per student, overwritten on regeneration.
pub trait SummaryStore: Send + Sync {
    fn load_summary(
        &self,
        student_id: &str,
    ) -> impl std::future::Future<Output = Result<Option<String>, SummaryError>> + Send;

    /// Replace the student's summary. Must never leave a half-written file.
    fn save_summary(
        &self,
        student_id: &str,
        text: &str,
    ) -> impl std::future::Future<Output = Result<(), SummaryError>> + Send;
}
