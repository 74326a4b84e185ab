//! Infrastructure layer for the tutor bot.
//!
//! Contains implementations of the store traits defined in `tutor-core`:
//! the JSON-file archive (snapshots, crash checkpoint, rolling summaries),
//! the config loader, data-directory layout and the OpenAI-compatible LLM
//! provider.

pub mod archive;
pub mod config;
pub mod filesystem;
pub mod llm;
