//! Configuration types for the tutor bot.
//!
//! `TutorConfig` represents the `config.toml` in the data directory. Every
//! section and field has a default, so an empty or partial file is valid.

use serde::{Deserialize, Serialize};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TutorConfig {
    #[serde(default)]
    pub summary: SummaryConfig,
    #[serde(default)]
    pub schedule: ScheduleConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub reply: ReplyConfig,
}

/// Rolling-summary policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryConfig {
    /// Summarize once a history holds more than this many messages.
    #[serde(default = "default_threshold")]
    pub threshold: usize,
    /// Most recent messages left out of the summarized window.
    #[serde(default = "default_keep_recent")]
    pub keep_recent: usize,
    /// Summary text is cut to this many characters before the ellipsis.
    #[serde(default = "default_max_chars")]
    pub max_chars: usize,
}

fn default_threshold() -> usize {
    12
}

fn default_keep_recent() -> usize {
    10
}

fn default_max_chars() -> usize {
    2000
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            keep_recent: default_keep_recent(),
            max_chars: default_max_chars(),
        }
    }
}

/// Intervals for the background checkpoint and archival tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleConfig {
    #[serde(default = "default_checkpoint_interval_secs")]
    pub checkpoint_interval_secs: u64,
    #[serde(default = "default_archive_interval_secs")]
    pub archive_interval_secs: u64,
}

fn default_checkpoint_interval_secs() -> u64 {
    30
}

fn default_archive_interval_secs() -> u64 {
    7 * 24 * 60 * 60
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            checkpoint_interval_secs: default_checkpoint_interval_secs(),
            archive_interval_secs: default_archive_interval_secs(),
        }
    }
}

/// Language model settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// Overrides the provider's default endpoint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_provider() -> String {
    "gemini".to_string()
}

fn default_model() -> String {
    "gemini-2.0-flash".to_string()
}

fn default_temperature() -> f64 {
    0.7
}

fn default_max_output_tokens() -> u32 {
    450
}

fn default_timeout_secs() -> u64 {
    60
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            base_url: None,
            temperature: default_temperature(),
            max_output_tokens: default_max_output_tokens(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Outbound reply settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyConfig {
    /// Maximum characters per outbound chunk.
    #[serde(default = "default_chunk_limit")]
    pub chunk_limit: usize,
}

fn default_chunk_limit() -> usize {
    1800
}

impl Default for ReplyConfig {
    fn default() -> Self {
        Self {
            chunk_limit: default_chunk_limit(),
        }
    }
}
