//! Per-student logs and conversation sessions.
//!
//! - `LogStore`: the durable log table, one append-only log per student
//! - `Session`: one student's live conversation history
//! - `SessionManager`: lazy session creation, turn recording and summaries

pub mod log_store;
pub mod manager;
pub mod session;
