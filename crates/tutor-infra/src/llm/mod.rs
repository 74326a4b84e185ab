//! LLM provider construction.
//!
//! Builds the concrete [`LlmProvider`](tutor_core::llm::provider::LlmProvider)
//! named by [`LlmConfig`] and wraps it in a [`BoxLlmProvider`].

pub mod openai_compat;

use secrecy::{ExposeSecret, SecretString};

use tutor_core::llm::box_provider::BoxLlmProvider;
use tutor_types::config::LlmConfig;
use tutor_types::llm::LlmError;

use self::openai_compat::config::{self as oai_config, OpenAiCompatConfig};
use self::openai_compat::OpenAiCompatibleProvider;

/// Create a [`BoxLlmProvider`] from the `[llm]` config section.
///
/// `gemini` and `openai` use their public endpoints unless `base_url`
/// overrides them. Any other provider name requires `base_url`.
///
/// # Errors
///
/// [`LlmError::AuthenticationFailed`] when no API key is available, and
/// [`LlmError::InvalidRequest`] for an unknown provider without a base URL.
pub fn create_provider(
    config: &LlmConfig,
    api_key: Option<&SecretString>,
) -> Result<BoxLlmProvider, LlmError> {
    let key = api_key.ok_or(LlmError::AuthenticationFailed)?;
    let oai = provider_config(config, SecretString::from(key.expose_secret().to_string()))?;
    tracing::debug!(
        provider = %oai.provider_name,
        model = %oai.model,
        base_url = %oai.base_url,
        "creating LLM provider"
    );
    Ok(BoxLlmProvider::new(OpenAiCompatibleProvider::new(oai)))
}

fn provider_config(config: &LlmConfig, key: SecretString) -> Result<OpenAiCompatConfig, LlmError> {
    if let Some(base_url) = config.base_url.as_deref() {
        return Ok(oai_config::custom(&config.provider, base_url, key, &config.model));
    }

    match config.provider.as_str() {
        "gemini" => Ok(oai_config::gemini_defaults(key, &config.model)),
        "openai" => Ok(oai_config::openai_defaults(key, &config.model)),
        other => Err(LlmError::InvalidRequest(format!(
            "unknown LLM provider '{other}'; set llm.base_url for a custom endpoint"
        ))),
    }
}
