//! Archivist: moves logs from memory into per-student snapshot files.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::{DateTime, Duration, DurationRound, Utc};
use serde::Serialize;
use tokio::sync::Mutex;

use tutor_types::error::ArchiveError;

use crate::chat::log_store::LogStore;
use crate::storage::archive_store::SnapshotStore;
use crate::storage::snapshot::{SnapshotRef, format_stamp};

/// What a successful flush wrote.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FlushReport {
    /// Stamp shared by every file of this flush; `None` when there was
    /// nothing to write.
    pub stamp: Option<String>,
    pub students: usize,
    pub entries: usize,
}

/// What `load_latest` installed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    pub students: usize,
    pub entries: usize,
    /// Snapshot files that could not be read and were passed over.
    pub skipped: Vec<String>,
}

pub struct Archivist<S: SnapshotStore> {
    store: Arc<S>,
    log: Arc<LogStore>,
    /// Serialises flushes; holds the time of the last stamp issued.
    flush_gate: Mutex<Option<DateTime<Utc>>>,
}

impl<S: SnapshotStore> Archivist<S> {
    pub fn new(store: Arc<S>, log: Arc<LogStore>) -> Self {
        Self {
            store,
            log,
            flush_gate: Mutex::new(None),
        }
    }

    pub fn log_store(&self) -> &Arc<LogStore> {
        &self.log
    }

    /// Install each student's most recent snapshot into the log store.
    ///
    /// A snapshot that fails to read is logged and the next older one for
    /// the same student is tried.
    #[tracing::instrument(skip(self))]
    pub async fn load_latest(&self) -> Result<LoadReport, ArchiveError> {
        let mut by_student: BTreeMap<String, Vec<SnapshotRef>> = BTreeMap::new();
        for snapshot in self.store.list_snapshots().await? {
            by_student
                .entry(snapshot.student_id.clone())
                .or_default()
                .push(snapshot);
        }

        let mut report = LoadReport::default();
        for (student_id, mut snapshots) in by_student {
            snapshots.sort_by(|a, b| b.stamp.cmp(&a.stamp));
            for snapshot in snapshots {
                match self.store.read_snapshot(&snapshot).await {
                    Ok(entries) => {
                        report.students += 1;
                        report.entries += entries.len();
                        self.log.install(&student_id, entries);
                        break;
                    }
                    Err(e) => {
                        tracing::warn!(
                            file = %snapshot.file_name(),
                            error = %e,
                            "skipping unreadable snapshot"
                        );
                        report.skipped.push(snapshot.file_name());
                    }
                }
            }
        }

        tracing::info!(
            students = report.students,
            entries = report.entries,
            skipped = report.skipped.len(),
            "loaded latest snapshots"
        );
        Ok(report)
    }

    /// Write every non-empty log to a snapshot, then release what was written.
    ///
    /// If any write fails nothing is released and the whole table stays in
    /// memory for the next attempt.
    #[tracing::instrument(skip(self))]
    pub async fn flush_now(&self) -> Result<FlushReport, ArchiveError> {
        let mut last_stamp = self.flush_gate.lock().await;

        let table = self.log.snapshot_all();
        if table.is_empty() {
            tracing::debug!("nothing to archive");
            return Ok(FlushReport::default());
        }

        let taken_at = next_stamp_time(*last_stamp, Utc::now());
        *last_stamp = Some(taken_at);
        let stamp = format_stamp(taken_at);

        let mut written: HashMap<String, usize> = HashMap::new();
        let mut failed = Vec::new();
        for (student_id, entries) in &table {
            let snapshot = SnapshotRef {
                stamp: stamp.clone(),
                student_id: student_id.clone(),
            };
            match self.store.write_snapshot(&snapshot, entries).await {
                Ok(()) => {
                    written.insert(student_id.clone(), entries.len());
                }
                Err(e) => {
                    tracing::warn!(student_id, error = %e, "snapshot write failed");
                    failed.push(student_id.clone());
                }
            }
        }

        if !failed.is_empty() {
            tracing::error!(
                failed = failed.len(),
                written = written.len(),
                "archival flush incomplete, keeping all logs in memory"
            );
            return Err(ArchiveError::PartialFlush { failed });
        }

        let entries: usize = written.values().sum();
        self.log.release_archived(&written);

        tracing::info!(%stamp, students = written.len(), entries, "archived logs");
        Ok(FlushReport {
            stamp: Some(stamp),
            students: written.len(),
            entries,
        })
    }
}

/// Millisecond-precision time strictly after the previous stamp.
fn next_stamp_time(previous: Option<DateTime<Utc>>, now: DateTime<Utc>) -> DateTime<Utc> {
    let now = now
        .duration_trunc(Duration::milliseconds(1))
        .unwrap_or(now);
    match previous {
        Some(prev) if prev >= now => prev + Duration::milliseconds(1),
        _ => now,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MemoryArchive;
    use chrono::TimeZone;
    use tutor_types::chat::{LogEntry, LogRole};

    fn archivist() -> (Archivist<MemoryArchive>, Arc<MemoryArchive>) {
        let archive = Arc::new(MemoryArchive::default());
        let archivist = Archivist::new(Arc::clone(&archive), Arc::new(LogStore::new()));
        (archivist, archive)
    }

    #[test]
    fn test_next_stamp_is_strictly_increasing() {
        let t = Utc.with_ymd_and_hms(2025, 3, 1, 8, 0, 0).unwrap();
        let first = next_stamp_time(None, t);
        let second = next_stamp_time(Some(first), t);
        let third = next_stamp_time(Some(second), t - Duration::seconds(10));
        assert!(first < second && second < third);
        assert_eq!(format_stamp(second), "2025-03-01_08-00-00-001");
    }

    #[tokio::test]
    async fn test_flush_then_load_roundtrip() {
        let (archivist, archive) = archivist();
        let log = Arc::clone(archivist.log_store());
        for i in 0..5 {
            log.append("1001", LogRole::Student, format!("q{i}"));
            log.append("1001", LogRole::Assistant, format!("a{i}"));
        }
        log.append("1002", LogRole::Student, "hello");
        let before = log.snapshot_all();

        let report = archivist.flush_now().await.unwrap();
        assert_eq!(report.students, 2);
        assert_eq!(report.entries, 11);
        assert!(log.is_empty());
        assert_eq!(archive.snapshots().len(), 2);

        // Simulated restart on the same archive.
        let restarted = Archivist::new(Arc::clone(&archive), Arc::new(LogStore::new()));
        let loaded = restarted.load_latest().await.unwrap();
        assert_eq!(loaded.students, 2);
        assert_eq!(restarted.log_store().snapshot_all(), before);
    }

    #[tokio::test]
    async fn test_flush_empty_table_writes_nothing() {
        let (archivist, archive) = archivist();
        let report = archivist.flush_now().await.unwrap();
        assert_eq!(report, FlushReport::default());
        assert!(archive.snapshots().is_empty());
    }

    #[tokio::test]
    async fn test_consecutive_flushes_never_share_a_stamp() {
        let (archivist, archive) = archivist();
        let log = Arc::clone(archivist.log_store());

        log.append("1001", LogRole::Student, "first");
        let a = archivist.flush_now().await.unwrap();
        log.append("1001", LogRole::Student, "second");
        let b = archivist.flush_now().await.unwrap();

        assert!(a.stamp < b.stamp);
        assert_eq!(archive.snapshots().len(), 2);
    }

    #[tokio::test]
    async fn test_partial_flush_releases_nothing() {
        let (archivist, archive) = archivist();
        let log = Arc::clone(archivist.log_store());
        log.append("1001", LogRole::Student, "a");
        log.append("1002", LogRole::Student, "b");
        archive.fail_snapshots_for("1002");

        let err = archivist.flush_now().await.unwrap_err();
        match err {
            ArchiveError::PartialFlush { failed } => assert_eq!(failed, vec!["1002".to_string()]),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(log.total_entries(), 2);

        archive.heal_snapshots();
        let report = archivist.flush_now().await.unwrap();
        assert_eq!(report.students, 2);
        assert!(log.is_empty());
    }

    #[tokio::test]
    async fn test_load_latest_picks_greatest_stamp() {
        let (archivist, archive) = archivist();
        let entry = |content: &str| LogEntry {
            timestamp: Utc::now(),
            role: LogRole::Student,
            content: content.to_string(),
        };
        let older = SnapshotRef {
            stamp: "2025-02-01_08-00-00-000".to_string(),
            student_id: "1001".to_string(),
        };
        let legacy = SnapshotRef {
            stamp: "2025-01-01_08-00".to_string(),
            student_id: "1001".to_string(),
        };
        let newer = SnapshotRef {
            stamp: "2025-03-01_08-00-00-000".to_string(),
            student_id: "1001".to_string(),
        };
        archive.put_snapshot(older, vec![entry("older")]);
        archive.put_snapshot(legacy, vec![entry("legacy")]);
        archive.put_snapshot(newer, vec![entry("newer")]);

        archivist.load_latest().await.unwrap();
        let log = archivist.log_store().entries("1001");
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].content, "newer");
    }

    #[tokio::test]
    async fn test_load_latest_falls_back_past_corrupt_snapshot() {
        let (archivist, archive) = archivist();
        let good = SnapshotRef {
            stamp: "2025-02-01_08-00-00-000".to_string(),
            student_id: "1001".to_string(),
        };
        let corrupt = SnapshotRef {
            stamp: "2025-03-01_08-00-00-000".to_string(),
            student_id: "1001".to_string(),
        };
        archive.put_snapshot(
            good,
            vec![LogEntry {
                timestamp: Utc::now(),
                role: LogRole::Assistant,
                content: "kept".to_string(),
            }],
        );
        archive.put_corrupt_snapshot(corrupt.clone());

        let report = archivist.load_latest().await.unwrap();
        assert_eq!(report.students, 1);
        assert_eq!(report.skipped, vec![corrupt.file_name()]);
        assert_eq!(archivist.log_store().entries("1001")[0].content, "kept");
    }

    #[tokio::test]
    async fn test_load_latest_with_no_snapshots() {
        let (archivist, _) = archivist();
        let report = archivist.load_latest().await.unwrap();
        assert_eq!(report, LoadReport::default());
        assert!(archivist.log_store().is_empty());
    }

    #[tokio::test]
    async fn test_appends_during_flush_survive() {
        let (archivist, _) = archivist();
        let archivist = Arc::new(archivist);
        let log = Arc::clone(archivist.log_store());
        for i in 0..100 {
            log.append("1001", LogRole::Student, format!("before {i}"));
        }

        let writer = {
            let log = Arc::clone(&log);
            tokio::spawn(async move {
                for i in 0..100 {
                    log.append("1001", LogRole::Assistant, format!("during {i}"));
                    tokio::task::yield_now().await;
                }
            })
        };
        let report = archivist.flush_now().await.unwrap();
        writer.await.unwrap();

        // Whatever was not in the flushed snapshot is still in memory.
        assert_eq!(report.entries + log.total_entries(), 200);
    }
}
