//! Test wiring: a real JSON archive in a temp dir and an echoing model.

use std::path::Path;
use std::sync::Arc;

use tutor_core::llm::box_provider::BoxLlmProvider;
use tutor_core::llm::provider::LlmProvider;
use tutor_types::config::TutorConfig;
use tutor_types::llm::{CompletionRequest, CompletionResponse, LlmError, MessageRole, Usage};

use crate::state::{AppState, Storage};

/// Replies with `echo: <last user message>`.
pub struct EchoProvider;

impl LlmProvider for EchoProvider {
    fn name(&self) -> &str {
        "echo"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let last = request
            .messages
            .iter()
            .rev()
            .find(|m| m.role == MessageRole::User)
            .map(|m| m.content.clone())
            .unwrap_or_default();
        Ok(CompletionResponse {
            id: "echo-1".to_string(),
            content: format!("echo: {last}"),
            model: request.model.clone(),
            usage: Usage::default(),
        })
    }
}

pub fn test_state(data_dir: &Path) -> AppState {
    let storage = Arc::new(Storage::at(data_dir.to_path_buf(), TutorConfig::default()));
    AppState::with_provider(storage, BoxLlmProvider::new(EchoProvider))
}
