//! Snapshot naming.
//!
//! Snapshot files are named `{stamp}_student-{id}.json`. The stamp is
//! `YYYY-MM-DD_HH-MM-SS-mmm` in UTC, fixed width, so comparing stamps as
//! strings orders them chronologically. Minute-resolution stamps
//! (`YYYY-MM-DD_HH-MM`) from older archives are still recognised and sort
//! before any finer stamp of the same minute.

use chrono::{DateTime, Utc};

const SEPARATOR: &str = "_student-";
const EXTENSION: &str = ".json";
const STAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S-%3f";
const LEGACY_STAMP_LEN: usize = 16;
const STAMP_LEN: usize = 23;

/// Identifies one archive snapshot: when it was taken and whose log it holds.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SnapshotRef {
    pub stamp: String,
    pub student_id: String,
}

impl SnapshotRef {
    pub fn new(taken_at: DateTime<Utc>, student_id: impl Into<String>) -> Self {
        Self {
            stamp: format_stamp(taken_at),
            student_id: student_id.into(),
        }
    }

    /// File name on disk.
    pub fn file_name(&self) -> String {
        format!("{}{SEPARATOR}{}{EXTENSION}", self.stamp, self.student_id)
    }

    /// Parse a file name; anything that is not a snapshot yields `None`.
    pub fn parse(file_name: &str) -> Option<Self> {
        let stem = file_name.strip_suffix(EXTENSION)?;
        let (stamp, student_id) = stem.split_once(SEPARATOR)?;
        if student_id.is_empty() || !is_stamp(stamp) {
            return None;
        }
        Some(Self {
            stamp: stamp.to_string(),
            student_id: student_id.to_string(),
        })
    }
}

/// Render a snapshot stamp.
pub fn format_stamp(at: DateTime<Utc>) -> String {
    at.format(STAMP_FORMAT).to_string()
}

fn is_stamp(s: &str) -> bool {
    (s.len() == STAMP_LEN || s.len() == LEGACY_STAMP_LEN)
        && s.starts_with(|c: char| c.is_ascii_digit())
        && s.bytes()
            .all(|b| b.is_ascii_digit() || b == b'-' || b == b'_')
}
