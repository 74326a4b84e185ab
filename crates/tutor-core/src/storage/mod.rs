//! Storage ports for archived logs, crash checkpoints and summaries.
//!
//! Implementations live in tutor-infra.

pub mod archive_store;
pub mod snapshot;
