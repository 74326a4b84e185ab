//! A student's live conversation session.
//!
//! `Session` owns the `ConversationHistory` used as LLM context for one
//! student. The history sits behind an async mutex that is only held for
//! short reads and appends; whole exchanges are serialised separately by the
//! turn gate so two messages from the same student never interleave.

use tokio::sync::{Mutex, MutexGuard};

use tutor_types::chat::{HistoryMessage, LogEntry};

/// Ordered LLM context for one student.
///
/// `summary` is rendered as a leading synthetic system message and does not
/// count toward the summarization threshold.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversationHistory {
    pub summary: Option<String>,
    pub messages: Vec<HistoryMessage>,
}

impl ConversationHistory {
    /// Replay logged turns in order.
    ///
    /// A stored summary stands in for everything but the last `keep_recent`
    /// entries, so only those are replayed behind it.
    pub fn rehydrate(entries: &[LogEntry], summary: Option<String>, keep_recent: usize) -> Self {
        let replay = match summary {
            Some(_) => &entries[entries.len().saturating_sub(keep_recent)..],
            None => entries,
        };
        Self {
            summary,
            messages: replay.iter().map(LogEntry::to_message).collect(),
        }
    }

    /// Summary (if any) followed by the messages, oldest first.
    pub fn context(&self) -> Vec<HistoryMessage> {
        let mut context = Vec::with_capacity(self.messages.len() + 1);
        if let Some(summary) = &self.summary {
            context.push(HistoryMessage::system(summary.clone()));
        }
        context.extend(self.messages.iter().cloned());
        context
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

/// Runtime binding of one student id to its conversation history.
#[derive(Debug)]
pub struct Session {
    student_id: String,
    system_prompt: String,
    history: Mutex<ConversationHistory>,
    turn_gate: Mutex<()>,
    /// Length of the window covered by the last written summary.
    summarized_window: Mutex<Option<usize>>,
}

impl Session {
    pub fn new(
        student_id: impl Into<String>,
        system_prompt: impl Into<String>,
        history: ConversationHistory,
    ) -> Self {
        Self {
            student_id: student_id.into(),
            system_prompt: system_prompt.into(),
            history: Mutex::new(history),
            turn_gate: Mutex::new(()),
            summarized_window: Mutex::new(None),
        }
    }

    pub fn student_id(&self) -> &str {
        &self.student_id
    }

    /// The persona prompt chosen when the session was created.
    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    /// Wait for exclusive use of this session for one exchange.
    pub async fn begin_turn(&self) -> MutexGuard<'_, ()> {
        self.turn_gate.lock().await
    }

    pub(crate) async fn push(&self, message: HistoryMessage) {
        self.history.lock().await.messages.push(message);
    }

    /// Rendered LLM context (summary first, then messages).
    pub async fn context(&self) -> Vec<HistoryMessage> {
        self.history.lock().await.context()
    }

    /// Copy of the messages, without the summary.
    pub async fn messages(&self) -> Vec<HistoryMessage> {
        self.history.lock().await.messages.clone()
    }

    pub async fn history(&self) -> ConversationHistory {
        self.history.lock().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.history.lock().await.len()
    }

    pub(crate) async fn summary_gate(&self) -> MutexGuard<'_, Option<usize>> {
        self.summarized_window.lock().await
    }
}
