//! Rolling conversation summaries.
//!
//! `ContextSummarizer` condenses the older part of a conversation into one
//! plain-text digest: each message becomes a `student: ...` or
//! `assistant: ...` line, and the joined text is capped at a fixed length.
//! It is deterministic and makes no model calls.

use tutor_types::chat::{HistoryMessage, HistoryRole};
use tutor_types::error::SummaryError;

/// Appended to a summary that was cut at the length cap.
pub const ELLIPSIS: &str = "...";

/// Stateless utility for building summaries.
pub struct ContextSummarizer;

impl ContextSummarizer {
    /// Split messages into `(to_compress, to_keep)`.
    ///
    /// `to_keep` holds the most recent `keep_recent` messages; everything
    /// before them is `to_compress`, which is empty when there are no more
    /// than `keep_recent` messages.
    pub fn select_window(
        messages: &[HistoryMessage],
        keep_recent: usize,
    ) -> (&[HistoryMessage], &[HistoryMessage]) {
        if messages.len() <= keep_recent {
            (&[], messages)
        } else {
            messages.split_at(messages.len() - keep_recent)
        }
    }

    /// Render a window into summary text of at most `max_chars` characters
    /// plus the ellipsis marker.
    ///
    /// System messages (e.g. an earlier summary) are not re-rendered.
    pub fn summarize(window: &[HistoryMessage], max_chars: usize) -> Result<String, SummaryError> {
        let lines: Vec<String> = window
            .iter()
            .filter_map(|m| {
                let label = match m.role {
                    HistoryRole::User => "student",
                    HistoryRole::Assistant => "assistant",
                    HistoryRole::System => return None,
                };
                Some(format!("{label}: {}", m.content))
            })
            .collect();

        if lines.is_empty() {
            return Err(SummaryError::EmptyWindow);
        }

        let combined = lines.join("\n");
        Ok(truncate_chars(&combined, max_chars))
    }
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}{ELLIPSIS}", &text[..cut]),
        None => text.to_string(),
    }
}
