//! Configuration loader for the tutor bot.
//!
//! Reads `config.toml` from the data directory (`~/.tutor/` in production)
//! and deserializes it into [`TutorConfig`]. Falls back to defaults when the
//! file is missing or malformed.

use std::path::Path;

use secrecy::SecretString;
use tutor_types::config::TutorConfig;

/// Primary API key variable.
pub const API_KEY_ENV: &str = "TUTOR_LLM_API_KEY";

/// Fallback API key variable, the one Google's own tooling reads.
pub const FALLBACK_API_KEY_ENV: &str = "GOOGLE_API_KEY";

/// Load configuration from `{data_dir}/config.toml`.
///
/// - If the file does not exist, returns [`TutorConfig::default()`].
/// - If the file exists but cannot be read or parsed, logs a warning and
///   returns the default.
pub async fn load_tutor_config(data_dir: &Path) -> TutorConfig {
    let config_path = data_dir.join("config.toml");

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config.toml found at {}, using defaults", config_path.display());
            return TutorConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", config_path.display());
            return TutorConfig::default();
        }
    };

    match toml::from_str::<TutorConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(
                "Failed to parse {}: {err}, using defaults",
                config_path.display()
            );
            TutorConfig::default()
        }
    }
}

/// Resolve the LLM API key from the environment.
///
/// `TUTOR_LLM_API_KEY` wins over `GOOGLE_API_KEY`. Empty values are ignored.
pub fn resolve_api_key() -> Option<SecretString> {
    resolve_api_key_with(|name| std::env::var(name).ok())
}

fn resolve_api_key_with(lookup: impl Fn(&str) -> Option<String>) -> Option<SecretString> {
    [API_KEY_ENV, FALLBACK_API_KEY_ENV]
        .into_iter()
        .filter_map(|name| lookup(name))
        .map(|value| value.trim().to_string())
        .find(|value| !value.is_empty())
        .map(SecretString::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use tempfile::TempDir;

    #[tokio::test]
    async fn load_tutor_config_missing_file_returns_default() {
        let tmp = TempDir::new().unwrap();
        let config = load_tutor_config(tmp.path()).await;
        assert_eq!(config.summary.threshold, 12);
        assert_eq!(config.reply.chunk_limit, 1800);
    }

    #[tokio::test]
    async fn load_tutor_config_valid_toml_returns_parsed() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(
            tmp.path().join("config.toml"),
            r#"
[summary]
threshold = 16
keep_recent = 8

[llm]
provider = "openai"
model = "gpt-4o-mini"
timeout_secs = 20
"#,
        )
        .await
        .unwrap();

        let config = load_tutor_config(tmp.path()).await;
        assert_eq!(config.summary.threshold, 16);
        assert_eq!(config.summary.keep_recent, 8);
        assert_eq!(config.summary.max_chars, 2000);
        assert_eq!(config.llm.provider, "openai");
        assert_eq!(config.llm.timeout_secs, 20);
    }

    #[tokio::test]
    async fn load_tutor_config_invalid_toml_returns_default() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(tmp.path().join("config.toml"), "this is not { valid toml !!!")
            .await
            .unwrap();

        let config = load_tutor_config(tmp.path()).await;
        assert_eq!(config.summary.threshold, 12);
        assert_eq!(config.llm.model, "gemini-2.0-flash");
    }

    #[test]
    fn api_key_prefers_tutor_variable() {
        let key = resolve_api_key_with(|name| match name {
            API_KEY_ENV => Some("tutor-key".to_string()),
            FALLBACK_API_KEY_ENV => Some("google-key".to_string()),
            _ => None,
        })
        .unwrap();
        assert_eq!(key.expose_secret(), "tutor-key");
    }

    #[test]
    fn api_key_falls_back_and_skips_blank() {
        let key = resolve_api_key_with(|name| match name {
            API_KEY_ENV => Some("   ".to_string()),
            FALLBACK_API_KEY_ENV => Some("google-key".to_string()),
            _ => None,
        })
        .unwrap();
        assert_eq!(key.expose_secret(), "google-key");

        assert!(resolve_api_key_with(|_| None).is_none());
    }
}
