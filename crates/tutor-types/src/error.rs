use thiserror::Error;

/// Errors from archival flushes, snapshot loading and checkpoint files.
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// At least one per-student snapshot failed to write. Nothing was
    /// released from memory.
    #[error("archival flush failed for {} student(s): {}", failed.len(), failed.join(", "))]
    PartialFlush { failed: Vec<String> },

    #[error("archive io error: {0}")]
    Io(String),

    #[error("archive serialization error: {0}")]
    Serialization(String),

    #[error("corrupt snapshot '{file}': {reason}")]
    CorruptSnapshot { file: String, reason: String },
}

impl From<std::io::Error> for ArchiveError {
    fn from(err: std::io::Error) -> Self {
        ArchiveError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for ArchiveError {
    fn from(err: serde_json::Error) -> Self {
        ArchiveError::Serialization(err.to_string())
    }
}

/// Errors from building or persisting a rolling summary.
#[derive(Debug, Error)]
pub enum SummaryError {
    /// The window to compress rendered to nothing.
    #[error("nothing to summarize")]
    EmptyWindow,

    #[error("no session for student '{0}'")]
    NoSession(String),

    #[error("summary store error: {0}")]
    Store(String),
}

/// Errors resolving a student identity from a channel label.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum IdentityError {
    #[error(
        "channel name '{label}' is not in the expected format; rename it to \
         <student id>-<level>, for example 10531-01"
    )]
    MalformedLabel { label: String },
}
