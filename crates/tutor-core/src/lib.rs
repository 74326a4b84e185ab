//! Business logic and port traits for the classroom tutor bot.
//!
//! This crate defines the "ports" (store and provider traits) that the
//! infrastructure layer implements, and the components built on them: the
//! durable log store, sessions, summaries, archival and the message
//! orchestrator. It depends only on `tutor-types` -- never on `tutor-infra`
//! or any filesystem/HTTP crate.

pub mod agent;
pub mod chat;
pub mod llm;
pub mod service;
pub mod storage;

#[cfg(test)]
pub(crate) mod test_support;
