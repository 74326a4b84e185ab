//! Session manager: one live session per student.
//!
//! Sessions are created lazily, rehydrated from the log store and the
//! summary store, and cached in a `DashMap` keyed by student id. Every turn
//! is written to the log store before it reaches the cached history, so the
//! in-memory view is never ahead of the durable one.

use std::sync::Arc;

use dashmap::DashMap;

use tutor_types::chat::{HistoryMessage, LogEntry, LogRole};
use tutor_types::config::SummaryConfig;
use tutor_types::error::SummaryError;

use crate::agent::summarizer::ContextSummarizer;
use crate::chat::log_store::LogStore;
use crate::chat::session::{ConversationHistory, Session};
use crate::storage::archive_store::SummaryStore;

/// Result of a summarization attempt that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SummaryOutcome {
    /// The student has no live session.
    NoSession,
    /// History is not longer than the threshold.
    BelowThreshold { len: usize },
    /// Nothing older than the recent messages to compress.
    EmptyWindow,
    /// The window is the one already summarized.
    Unchanged,
    /// A new summary replaced the stored one.
    Written { covered: usize, chars: usize },
}

/// Owns the session map and the summary policy.
pub struct SessionManager<S: SummaryStore> {
    sessions: DashMap<String, Arc<Session>>,
    log: Arc<LogStore>,
    summaries: Arc<S>,
    policy: SummaryConfig,
}

impl<S: SummaryStore> SessionManager<S> {
    pub fn new(log: Arc<LogStore>, summaries: Arc<S>, policy: SummaryConfig) -> Self {
        Self {
            sessions: DashMap::new(),
            log,
            summaries,
            policy,
        }
    }

    pub fn log_store(&self) -> &Arc<LogStore> {
        &self.log
    }

    pub fn policy(&self) -> SummaryConfig {
        self.policy
    }

    /// Return the student's session, creating it on first use.
    ///
    /// A new session replays every entry the log store holds for the student.
    /// When a summary is stored it leads the history and only the most recent
    /// `keep_recent` entries are replayed after it. Concurrent callers for the
    /// same id always get the same `Arc`.
    pub async fn get_or_create_session(&self, student_id: &str, system_prompt: &str) -> Arc<Session> {
        if let Some(existing) = self.session(student_id) {
            return existing;
        }

        let summary = match self.summaries.load_summary(student_id).await {
            Ok(summary) => summary,
            Err(e) => {
                tracing::warn!(student_id, error = %e, "failed to load summary, starting without one");
                None
            }
        };

        // Rehydrate under the map entry lock so a concurrent record_turn either
        // sees the new session or lands in the log before the replay.
        let entry = self.sessions.entry(student_id.to_string()).or_insert_with(|| {
            let entries = self.log.entries(student_id);
            tracing::debug!(
                student_id,
                replayed = entries.len(),
                has_summary = summary.is_some(),
                "created session"
            );
            let history = ConversationHistory::rehydrate(&entries, summary, self.policy.keep_recent);
            Arc::new(Session::new(student_id, system_prompt, history))
        });
        Arc::clone(entry.value())
    }

    /// The student's live session, if one exists.
    pub fn session(&self, student_id: &str) -> Option<Arc<Session>> {
        self.sessions.get(student_id).map(|r| Arc::clone(r.value()))
    }

    /// Ids of every live session.
    pub fn active_sessions(&self) -> Vec<String> {
        self.sessions.iter().map(|r| r.key().clone()).collect()
    }

    /// Log a turn, then mirror it into the live history if there is one.
    pub async fn record_turn(&self, student_id: &str, role: LogRole, content: &str) -> LogEntry {
        self.record_turn_as(student_id, role, content, content).await
    }

    /// Log `content` but mirror `sent` into the live history.
    ///
    /// Used when the model was given a rewritten form of the student's text:
    /// later turns must see what the model actually answered.
    pub async fn record_turn_as(
        &self,
        student_id: &str,
        role: LogRole,
        content: &str,
        sent: &str,
    ) -> LogEntry {
        let (entry, session) = {
            let session = self.sessions.get(student_id);
            let entry = self.log.append(student_id, role, content);
            (entry, session.map(|r| Arc::clone(r.value())))
        };

        if let Some(session) = session {
            session
                .push(HistoryMessage {
                    role: role.message_role(),
                    content: sent.to_string(),
                })
                .await;
        }
        entry
    }

    /// Summarize the older part of the history once it passes the threshold.
    #[tracing::instrument(skip(self), fields(threshold = self.policy.threshold))]
    pub async fn maybe_summarize(&self, student_id: &str) -> Result<SummaryOutcome, SummaryError> {
        self.summarize_inner(student_id, false).await
    }

    /// Summarize regardless of the threshold.
    #[tracing::instrument(skip(self))]
    pub async fn force_summarize(&self, student_id: &str) -> Result<SummaryOutcome, SummaryError> {
        self.summarize_inner(student_id, true).await
    }

    async fn summarize_inner(&self, student_id: &str, force: bool) -> Result<SummaryOutcome, SummaryError> {
        let Some(session) = self.session(student_id) else {
            tracing::debug!(student_id, "no session to summarize");
            return Ok(SummaryOutcome::NoSession);
        };

        let mut last_window = session.summary_gate().await;
        let messages: Vec<HistoryMessage> = session.messages().await;

        if !force && messages.len() <= self.policy.threshold {
            tracing::debug!(student_id, len = messages.len(), "below summary threshold");
            return Ok(SummaryOutcome::BelowThreshold {
                len: messages.len(),
            });
        }

        let (window, _) = ContextSummarizer::select_window(&messages, self.policy.keep_recent);
        if window.is_empty() {
            return Ok(SummaryOutcome::EmptyWindow);
        }
        if *last_window == Some(window.len()) {
            tracing::debug!(student_id, covered = window.len(), "summary already current");
            return Ok(SummaryOutcome::Unchanged);
        }

        let text = match ContextSummarizer::summarize(window, self.policy.max_chars) {
            Ok(text) => text,
            Err(SummaryError::EmptyWindow) => return Ok(SummaryOutcome::EmptyWindow),
            Err(e) => return Err(e),
        };

        self.summaries.save_summary(student_id, &text).await?;
        *last_window = Some(window.len());

        let chars = text.chars().count();
        tracing::info!(student_id, covered = window.len(), chars, "summary updated");
        Ok(SummaryOutcome::Written {
            covered: window.len(),
            chars,
        })
    }
}
