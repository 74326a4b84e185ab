//! Durable log store.
//!
//! `LogStore` is the in-memory table of every student's log since the last
//! archival flush. It is backed by `DashMap`: each operation locks one
//! student's shard briefly and never across an `.await`. Reads clone, so no
//! guard escapes this module.

use std::collections::HashMap;

use chrono::Utc;
use dashmap::DashMap;

use tutor_types::chat::{LogEntry, LogRole, LogTable};

/// In-memory table of per-student logs.
#[derive(Debug, Default)]
pub struct LogStore {
    logs: DashMap<String, Vec<LogEntry>>,
}

impl LogStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one entry to a student's log, stamped with the current time.
    ///
    /// Timestamps never go backwards within a student's log: if the wall
    /// clock steps back, the entry reuses the previous entry's timestamp.
    pub fn append(&self, student_id: &str, role: LogRole, content: impl Into<String>) -> LogEntry {
        let mut log = self.logs.entry(student_id.to_string()).or_default();
        let now = Utc::now();
        let timestamp = match log.last() {
            Some(last) if last.timestamp > now => last.timestamp,
            _ => now,
        };
        let entry = LogEntry {
            timestamp,
            role,
            content: content.into(),
        };
        log.push(entry.clone());
        entry
    }

    /// Consistent copy of every non-empty log.
    pub fn snapshot_all(&self) -> LogTable {
        self.logs
            .iter()
            .filter(|r| !r.value().is_empty())
            .map(|r| (r.key().clone(), r.value().clone()))
            .collect()
    }

    /// Empty every student's log.
    pub fn clear_all(&self) {
        self.logs.clear();
    }

    /// Copy of one student's log, oldest first.
    pub fn entries(&self, student_id: &str) -> Vec<LogEntry> {
        self.logs
            .get(student_id)
            .map(|r| r.value().clone())
            .unwrap_or_default()
    }

    /// Replace a student's log wholesale.
    pub fn install(&self, student_id: &str, entries: Vec<LogEntry>) {
        if entries.is_empty() {
            self.logs.remove(student_id);
        } else {
            self.logs.insert(student_id.to_string(), entries);
        }
    }

    /// Append entries recovered from a crash checkpoint.
    ///
    /// Entries not newer than the student's current last entry are already
    /// held (or archived) and are dropped. Returns how many were added.
    pub fn merge_recovered(&self, student_id: &str, recovered: Vec<LogEntry>) -> usize {
        let mut log = self.logs.entry(student_id.to_string()).or_default();
        let cutoff = log.last().map(|e| e.timestamp);
        let before = log.len();
        log.extend(
            recovered
                .into_iter()
                .filter(|e| cutoff.is_none_or(|c| e.timestamp > c)),
        );
        let added = log.len() - before;
        let now_empty = log.is_empty();
        drop(log);
        if now_empty {
            self.logs.remove_if(student_id, |_, v| v.is_empty());
        }
        added
    }

    /// Remove the first `n` entries of each listed student's log.
    ///
    /// `counts` is what an archival flush wrote. Entries appended while the
    /// flush was writing sit after those `n` and stay in place.
    pub fn release_archived(&self, counts: &HashMap<String, usize>) {
        for (student_id, &n) in counts {
            let emptied = match self.logs.get_mut(student_id) {
                Some(mut log) => {
                    let n = n.min(log.len());
                    log.drain(..n);
                    log.is_empty()
                }
                None => false,
            };
            if emptied {
                self.logs.remove_if(student_id, |_, v| v.is_empty());
            }
        }
    }

    /// Ids of every student with a non-empty log.
    pub fn student_ids(&self) -> Vec<String> {
        self.logs
            .iter()
            .filter(|r| !r.value().is_empty())
            .map(|r| r.key().clone())
            .collect()
    }

    /// Number of students with a non-empty log.
    pub fn len(&self) -> usize {
        self.logs.iter().filter(|r| !r.value().is_empty()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Entries held across all students.
    pub fn total_entries(&self) -> usize {
        self.logs.iter().map(|r| r.value().len()).sum()
    }
}
