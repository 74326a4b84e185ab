//! JSON-file archive adapter.

pub mod json_store;

pub use json_store::{ArchiveStatus, JsonFileArchive};
