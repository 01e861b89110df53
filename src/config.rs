use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub document: DocumentConfig,
    #[serde(default)]
    pub ai_model: AiModelConfig,
    #[serde(default)]
    pub email: EmailConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DocumentConfig {
    pub path: String,
    /// Characters of the CV echoed back by the fallback answer.
    pub preview_chars: usize,
    /// Characters of the CV sent to the model as context.
    pub prompt_chars: usize,
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            path: "./cv.pdf".to_string(),
            preview_chars: 100,
            prompt_chars: 3000,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AiModelConfig {
    pub model: String,
    pub endpoint: String,
    pub max_tokens: u32,
    /// When absent the server answers in fallback mode.
    pub api_key: Option<String>,
}

impl Default for AiModelConfig {
    fn default() -> Self {
        Self {
            model: "gpt-3.5-turbo".to_string(),
            endpoint: "https://api.openai.com/v1".to_string(),
            max_tokens: 500,
            api_key: None,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct EmailConfig {
    pub endpoint: String,
    pub api_key: String,
    pub from: String,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.resend.com".to_string(),
            api_key: String::new(),
            from: String::new(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Startup misconfiguration: {0}")]
    StartupMisconfiguration(String),
}

impl Config {
    /// Load configuration from a TOML file, falling back to defaults when the
    /// file does not exist, then apply environment overrides.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            Self::from_file(path)?
        } else {
            Config::default()
        };

        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Load configuration from TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path).context("Failed to read config file")?;

        let config: Config = toml::from_str(&content).context("Failed to parse config file")?;

        Ok(config)
    }

    /// Override file values with credentials and paths from the environment.
    fn apply_env<F>(&mut self, var: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = var("CV_PATH") {
            self.document.path = path;
        }
        if let Some(key) = var("OPENAI_API_KEY").filter(|k| !k.trim().is_empty()) {
            self.ai_model.api_key = Some(key);
        }
        if let Some(key) = var("EMAIL_API_KEY") {
            self.email.api_key = key;
        }
        if let Some(from) = var("EMAIL_FROM") {
            self.email.from = from;
        }
    }

    /// Sender credentials are required before any request is served.
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.email.api_key.trim().is_empty() {
            return Err(ConfigError::StartupMisconfiguration(
                "EMAIL_API_KEY is not set".to_string(),
            ));
        }
        if !self.email.from.contains('@') {
            return Err(ConfigError::StartupMisconfiguration(
                "EMAIL_FROM must be a sender address".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_config_parsing() {
        let toml_str = r#"
            [document]
            path = "/data/cv.pdf"
            preview_chars = 50

            [ai_model]
            model = "gpt-4o-mini"
            max_tokens = 300

            [email]
            api_key = "re_test"
            from = "me@example.com"

            [logging]
            level = "debug"
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.document.path, "/data/cv.pdf");
        assert_eq!(config.document.preview_chars, 50);
        assert_eq!(config.document.prompt_chars, 3000);
        assert_eq!(config.ai_model.model, "gpt-4o-mini");
        assert_eq!(config.ai_model.endpoint, "https://api.openai.com/v1");
        assert!(config.ai_model.api_key.is_none());
        assert_eq!(config.logging.level, "debug");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.document.path, "./cv.pdf");
        assert_eq!(config.document.preview_chars, 100);
        assert_eq!(config.ai_model.max_tokens, 500);
        assert_eq!(config.email.endpoint, "https://api.resend.com");
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("CV_PATH", "/mnt/cv.pdf"),
            ("OPENAI_API_KEY", "sk-test"),
            ("EMAIL_API_KEY", "re_env"),
            ("EMAIL_FROM", "bot@example.com"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_env(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.document.path, "/mnt/cv.pdf");
        assert_eq!(config.ai_model.api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.email.api_key, "re_env");
        assert_eq!(config.email.from, "bot@example.com");
    }

    #[test]
    fn test_blank_inference_key_is_ignored() {
        let mut config = Config::default();
        config.apply_env(|key| (key == "OPENAI_API_KEY").then(|| "  ".to_string()));
        assert!(config.ai_model.api_key.is_none());
    }

    #[test]
    fn test_missing_sender_credentials_is_fatal() {
        let config = Config::default();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("EMAIL_API_KEY"));

        let mut config = Config::default();
        config.email.api_key = "re_x".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::StartupMisconfiguration(_))
        ));
    }
}
