//! JSON-file implementation of the snapshot, checkpoint and summary stores.
//!
//! Snapshots are pretty-printed JSON arrays of log entries, one file per
//! student per flush. The checkpoint is a single JSON object keyed by
//! student id. Summaries are plain UTF-8 text. Every write goes through
//! [`write_atomic`], so readers only ever see a complete file.

use std::collections::BTreeSet;
use std::path::Path;

use serde::Serialize;
use tutor_core::storage::archive_store::{CheckpointStore, SnapshotStore, SummaryStore};
use tutor_core::storage::snapshot::SnapshotRef;
use tutor_types::chat::{LogEntry, LogTable};
use tutor_types::error::{ArchiveError, SummaryError};

use crate::filesystem::{read_optional, write_atomic, DataLayout, CHECKPOINT_FILE};

/// Archive rooted at a data directory.
#[derive(Debug, Clone)]
pub struct JsonFileArchive {
    layout: DataLayout,
}

/// Point-in-time view of what is on disk, for `tutor status`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ArchiveStatus {
    pub snapshots: usize,
    pub students_archived: usize,
    /// Entries in a leftover checkpoint, `None` when there is no checkpoint.
    pub pending_checkpoint_entries: Option<usize>,
    pub summaries: usize,
}

impl JsonFileArchive {
    pub fn new(layout: DataLayout) -> Self {
        Self { layout }
    }

    pub fn layout(&self) -> &DataLayout {
        &self.layout
    }

    /// Count snapshots, archived students, checkpoint entries and summaries.
    pub async fn status(&self) -> Result<ArchiveStatus, ArchiveError> {
        let snapshots = self.list_snapshots().await?;
        let students: BTreeSet<&str> = snapshots.iter().map(|s| s.student_id.as_str()).collect();
        let pending = self
            .read_checkpoint()
            .await?
            .map(|table| table.values().map(Vec::len).sum());

        let summaries = list_file_names(&self.layout.summaries_dir())
            .await?
            .iter()
            .filter(|name| name.starts_with("student-") && name.ends_with(".txt"))
            .count();

        Ok(ArchiveStatus {
            snapshots: snapshots.len(),
            students_archived: students.len(),
            pending_checkpoint_entries: pending,
            summaries,
        })
    }
}

/// File names directly inside `dir`; a missing directory is empty.
async fn list_file_names(dir: &Path) -> Result<Vec<String>, ArchiveError> {
    let mut read_dir = match tokio::fs::read_dir(dir).await {
        Ok(read_dir) => read_dir,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => return Err(err.into()),
    };

    let mut names = Vec::new();
    while let Some(entry) = read_dir.next_entry().await? {
        if !entry.file_type().await?.is_file() {
            continue;
        }
        if let Some(name) = entry.file_name().to_str() {
            names.push(name.to_string());
        }
    }
    Ok(names)
}

impl SnapshotStore for JsonFileArchive {
    async fn write_snapshot(
        &self,
        snapshot: &SnapshotRef,
        entries: &[LogEntry],
    ) -> Result<(), ArchiveError> {
        let json = serde_json::to_vec_pretty(entries)?;
        let path = self.layout.logs_dir().join(snapshot.file_name());
        write_atomic(&path, &json).await?;
        Ok(())
    }

    async fn list_snapshots(&self) -> Result<Vec<SnapshotRef>, ArchiveError> {
        let names = list_file_names(&self.layout.logs_dir()).await?;
        Ok(names
            .iter()
            .filter(|name| name.as_str() != CHECKPOINT_FILE)
            .filter_map(|name| SnapshotRef::parse(name))
            .collect())
    }

    async fn read_snapshot(&self, snapshot: &SnapshotRef) -> Result<Vec<LogEntry>, ArchiveError> {
        let file = snapshot.file_name();
        let content = tokio::fs::read_to_string(self.layout.logs_dir().join(&file)).await?;
        serde_json::from_str(&content).map_err(|err| ArchiveError::CorruptSnapshot {
            file,
            reason: err.to_string(),
        })
    }
}

impl CheckpointStore for JsonFileArchive {
    async fn write_checkpoint(&self, table: &LogTable) -> Result<(), ArchiveError> {
        let json = serde_json::to_vec_pretty(table)?;
        write_atomic(&self.layout.checkpoint_path(), &json).await?;
        Ok(())
    }

    async fn read_checkpoint(&self) -> Result<Option<LogTable>, ArchiveError> {
        let Some(content) = read_optional(&self.layout.checkpoint_path()).await? else {
            return Ok(None);
        };
        serde_json::from_str(&content)
            .map(Some)
            .map_err(|err| ArchiveError::CorruptSnapshot {
                file: CHECKPOINT_FILE.to_string(),
                reason: err.to_string(),
            })
    }

    async fn remove_checkpoint(&self) -> Result<bool, ArchiveError> {
        match tokio::fs::remove_file(self.layout.checkpoint_path()).await {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(err.into()),
        }
    }
}

impl SummaryStore for JsonFileArchive {
    async fn load_summary(&self, student_id: &str) -> Result<Option<String>, SummaryError> {
        read_optional(&self.layout.summary_path(student_id))
            .await
            .map_err(|err| SummaryError::Store(err.to_string()))
    }

    async fn save_summary(&self, student_id: &str, text: &str) -> Result<(), SummaryError> {
        write_atomic(&self.layout.summary_path(student_id), text.as_bytes())
            .await
            .map_err(|err| SummaryError::Store(err.to_string()))
    }
}
