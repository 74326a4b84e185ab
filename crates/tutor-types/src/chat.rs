//! Log entry and conversation types for the tutor bot.
//!
//! A `LogEntry` is one durable record of a student or assistant turn. The
//! same turns, re-tagged with LLM roles, make up a student's live
//! conversation history.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// Re-export the LLM message types (history messages are LLM messages).
pub use crate::llm::{Message, MessageRole};

/// A message in a student's live conversation history.
pub type HistoryMessage = Message;

/// Role of a history message.
pub type HistoryRole = MessageRole;

/// Who produced a logged turn.
///
/// Serialized lowercase. Older snapshot files tag model turns as `"ai"`,
/// which is accepted on read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogRole {
    Student,
    #[serde(alias = "ai")]
    Assistant,
}

impl LogRole {
    /// The LLM role this turn takes when replayed into a conversation.
    pub fn message_role(self) -> MessageRole {
        match self {
            LogRole::Student => MessageRole::User,
            LogRole::Assistant => MessageRole::Assistant,
        }
    }

    /// Label used when rendering a turn into a summary line.
    pub fn label(self) -> &'static str {
        match self {
            LogRole::Student => "student",
            LogRole::Assistant => "assistant",
        }
    }
}

impl fmt::Display for LogRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for LogRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "student" => Ok(LogRole::Student),
            "assistant" | "ai" => Ok(LogRole::Assistant),
            other => Err(format!("invalid log role: '{other}'")),
        }
    }
}

/// One immutable record in a student's log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub timestamp: DateTime<Utc>,
    pub role: LogRole,
    pub content: String,
}

impl LogEntry {
    /// Convert into the message replayed into a conversation history.
    pub fn to_message(&self) -> Message {
        Message {
            role: self.role.message_role(),
            content: self.content.clone(),
        }
    }
}

/// Timestamps are written as RFC 3339. Older archives carry naive
/// `YYYY-MM-DD HH:MM:SS` stamps, which are read as UTC.
mod timestamp {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer, de::Error};

    const LEGACY_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f"];

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        if let Ok(parsed) = DateTime::parse_from_rfc3339(&raw) {
            return Ok(parsed.with_timezone(&Utc));
        }
        LEGACY_FORMATS
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(&raw, fmt).ok())
            .map(|naive| naive.and_utc())
            .ok_or_else(|| D::Error::custom(format!("invalid timestamp: '{raw}'")))
    }
}

/// Ordered log of one student, oldest first.
pub type StudentLog = Vec<LogEntry>;

/// Full log table keyed by student id.
///
/// A `BTreeMap` keeps checkpoint files stable between writes.
pub type LogTable = BTreeMap<String, StudentLog>;
