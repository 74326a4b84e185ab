//! Message orchestrator: one inbound message in, one reply out.
//!
//! `Tutor::handle` resolves the student from the channel label, records the
//! turn, asks the model, records the answer and keeps the rolling summary
//! current. Only the student's own turn gate is held across the model call;
//! the shared log table is never locked across an `.await`.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{Instrument, info_span};

use tutor_types::chat::{HistoryMessage, LogRole};
use tutor_types::config::LlmConfig;
use tutor_types::identity::{InboundMessage, StudentIdentity};
use tutor_types::llm::{CompletionRequest, LlmError};

use crate::agent::prompt::{SUMMARIZE_COMMAND, preprocess, system_prompt_for};
use crate::agent::reply::split_reply;
use crate::chat::manager::{SessionManager, SummaryOutcome};
use crate::llm::box_provider::BoxLlmProvider;
use crate::storage::archive_store::SummaryStore;

/// What the transport should send back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Reply {
    /// The channel label is not `<student id>-<level>`; nothing was logged.
    FormatHint { message: String },
    /// Acknowledges the summarize command.
    SummaryAck { message: String },
    /// The model's answer, split for the transport.
    Answer { chunks: Vec<String> },
    /// The model call failed; the student's turn stays logged.
    Failed { message: String },
}

impl Reply {
    /// Messages to send, in order.
    pub fn chunks(&self) -> Vec<String> {
        match self {
            Reply::FormatHint { message }
            | Reply::SummaryAck { message }
            | Reply::Failed { message } => vec![message.clone()],
            Reply::Answer { chunks } => chunks.clone(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Reply::FormatHint { .. } => "format_hint",
            Reply::SummaryAck { .. } => "summary_ack",
            Reply::Answer { .. } => "answer",
            Reply::Failed { .. } => "failed",
        }
    }
}

/// Handles inbound messages for every student.
pub struct Tutor<S: SummaryStore> {
    sessions: Arc<SessionManager<S>>,
    provider: Arc<BoxLlmProvider>,
    llm: LlmConfig,
    chunk_limit: usize,
}

impl<S: SummaryStore> Tutor<S> {
    pub fn new(
        sessions: Arc<SessionManager<S>>,
        provider: Arc<BoxLlmProvider>,
        llm: LlmConfig,
        chunk_limit: usize,
    ) -> Self {
        Self {
            sessions,
            provider,
            llm,
            chunk_limit,
        }
    }

    pub fn sessions(&self) -> &Arc<SessionManager<S>> {
        &self.sessions
    }

    /// Handle one message posted in the channel named `channel_label`.
    #[tracing::instrument(skip(self, content))]
    pub async fn handle(&self, channel_label: &str, content: &str) -> Reply {
        let identity = match StudentIdentity::from_channel_label(channel_label) {
            Ok(identity) => identity,
            Err(e) => {
                tracing::debug!(error = %e, "rejected channel label");
                return Reply::FormatHint {
                    message: e.to_string(),
                };
            }
        };

        let content = content.trim();
        if content == SUMMARIZE_COMMAND {
            return self.summarize_on_request(&identity).await;
        }

        self.exchange(InboundMessage::new(identity, content)).await
    }

    async fn summarize_on_request(&self, identity: &StudentIdentity) -> Reply {
        let session = self
            .sessions
            .get_or_create_session(&identity.student_id, system_prompt_for(&identity.level))
            .await;
        let _turn = session.begin_turn().await;

        let message = match self.sessions.force_summarize(&identity.student_id).await {
            Ok(SummaryOutcome::Written { covered, .. }) => {
                format!("Summary updated ({covered} earlier messages).")
            }
            Ok(SummaryOutcome::Unchanged) => "Summary is already up to date.".to_string(),
            Ok(_) => "Not enough conversation to summarize yet.".to_string(),
            Err(e) => {
                tracing::warn!(student_id = %identity.student_id, error = %e, "summary on request failed");
                "Could not update the summary, please try again later.".to_string()
            }
        };
        Reply::SummaryAck { message }
    }

    async fn exchange(&self, inbound: InboundMessage) -> Reply {
        let student_id = inbound.student_id.as_str();
        let session = self
            .sessions
            .get_or_create_session(student_id, system_prompt_for(&inbound.level))
            .await;
        let _turn = session.begin_turn().await;

        // The log keeps the raw text; history and the request carry the
        // preprocessed input.
        let input = preprocess(&inbound.raw_content);
        let mut messages = session.context().await;
        self.sessions
            .record_turn_as(student_id, LogRole::Student, &inbound.raw_content, &input)
            .await;
        messages.push(HistoryMessage::user(input));

        let request = CompletionRequest {
            model: self.llm.model.clone(),
            messages,
            system: Some(session.system_prompt().to_string()),
            max_tokens: self.llm.max_output_tokens,
            temperature: Some(self.llm.temperature),
        };

        let text = match self.generate(&request).await {
            Ok(text) => text,
            Err(e) => {
                tracing::error!(student_id, error = %e, "model call failed");
                return Reply::Failed {
                    message: format!("Sorry, something went wrong while answering: {e}"),
                };
            }
        };

        self.sessions
            .record_turn(student_id, LogRole::Assistant, &text)
            .await;

        if let Err(e) = self.sessions.maybe_summarize(student_id).await {
            tracing::warn!(student_id, error = %e, "summary update failed, keeping previous summary");
        }

        Reply::Answer {
            chunks: split_reply(&text, self.chunk_limit),
        }
    }

    async fn generate(&self, request: &CompletionRequest) -> Result<String, LlmError> {
        let span = info_span!(
            "gen_ai.complete",
            gen_ai.system = self.provider.name(),
            gen_ai.request.model = %request.model,
            gen_ai.request.max_tokens = request.max_tokens,
            gen_ai.request.temperature = ?request.temperature,
            message_count = request.messages.len(),
        );

        let call = self.provider.complete(request).instrument(span);
        let response = tokio::time::timeout(Duration::from_secs(self.llm.timeout_secs), call)
            .await
            .map_err(|_| LlmError::Timeout(self.llm.timeout_secs))??;

        if response.content.trim().is_empty() {
            return Err(LlmError::EmptyResponse);
        }
        Ok(response.content)
    }
}
