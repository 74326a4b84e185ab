//! Shared domain types for the classroom tutor bot.
//!
//! Log entries, student identity, conversation messages, configuration and
//! the error enums shared by every layer.
//!
//! Zero infrastructure dependencies -- only serde, serde_json, chrono, thiserror.

pub mod chat;
pub mod config;
pub mod error;
pub mod identity;
pub mod llm;
