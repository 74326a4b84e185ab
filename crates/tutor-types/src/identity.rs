//! Student identity resolved from a chat channel label.
//!
//! Each student talks to the bot in a dedicated channel named
//! `<student id>-<level>`, e.g. `10531-01`. Both parts are ASCII digits.

use serde::{Deserialize, Serialize};

use crate::error::IdentityError;

/// Level code that selects the guided persona for students who need more
/// support.
pub const GUIDED_LEVEL: &str = "02";

/// Who a message is from, as encoded in the channel label.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StudentIdentity {
    pub student_id: String,
    pub level: String,
}

impl StudentIdentity {
    /// Parse a channel label of the form `<digits>-<digits>`.
    pub fn from_channel_label(label: &str) -> Result<Self, IdentityError> {
        let malformed = || IdentityError::MalformedLabel {
            label: label.to_string(),
        };

        let mut parts = label.split('-');
        let (Some(student_id), Some(level), None) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(malformed());
        };

        if !is_digits(student_id) || !is_digits(level) {
            return Err(malformed());
        }

        Ok(Self {
            student_id: student_id.to_string(),
            level: level.to_string(),
        })
    }

    /// Whether this student gets the guided persona.
    pub fn is_guided(&self) -> bool {
        self.level == GUIDED_LEVEL
    }
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// A resolved inbound message: who sent it and what they wrote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundMessage {
    pub student_id: String,
    pub level: String,
    pub raw_content: String,
}

impl InboundMessage {
    pub fn new(identity: StudentIdentity, raw_content: impl Into<String>) -> Self {
        Self {
            student_id: identity.student_id,
            level: identity.level,
            raw_content: raw_content.into(),
        }
    }
}
