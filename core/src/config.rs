use crate::errors::{GenerationError, GenerationResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_API_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_CHAT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_VISION_MODEL: &str = "gemini-3-pro-preview";
pub const DEFAULT_VIDEO_MODEL: &str = "veo-3.1-fast-generate-preview";

/// Configuration for the assistant core
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct AssistantConfig {
    pub api_key: Option<String>,
    pub api_base_url: Option<String>,
    pub chat_model: Option<String>,
    pub vision_model: Option<String>,
    pub video_model: Option<String>,
    pub chat_temperature: Option<f32>,
    pub description_temperature: Option<f32>,
    pub poll_interval_secs: Option<u64>,
    pub max_poll_attempts: Option<u32>,
    /// Number of prior turns forwarded with each message
    pub history_limit: Option<usize>,
    /// Number of most recent listings serialized into the context block
    pub max_context_listings: Option<usize>,
    pub excerpt_chars: Option<usize>,
    pub log_level: Option<String>,
    /// Operator persona text; the built-in ColaboraBot persona when unset
    pub assistant_instruction: Option<String>,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base_url: Some(DEFAULT_API_BASE_URL.to_string()),
            chat_model: Some(DEFAULT_CHAT_MODEL.to_string()),
            vision_model: Some(DEFAULT_VISION_MODEL.to_string()),
            video_model: Some(DEFAULT_VIDEO_MODEL.to_string()),
            chat_temperature: Some(0.7),
            description_temperature: Some(0.8),
            poll_interval_secs: Some(5),
            max_poll_attempts: Some(120),
            history_limit: Some(20),
            max_context_listings: Some(50),
            excerpt_chars: Some(240),
            log_level: Some("info".to_string()),
            assistant_instruction: None,
        }
    }
}

impl AssistantConfig {
    /// Loads configuration from a file if it exists, otherwise returns the default config
    pub fn load_from_file(path: &Path) -> GenerationResult<Self> {
        if path.exists() {
            let content = fs::read_to_string(path).map_err(|e| {
                GenerationError::Config(format!("Failed to read config file: {}", e))
            })?;

            let config: Self = toml::from_str(&content).map_err(|e| {
                GenerationError::Config(format!("Failed to parse config file: {}", e))
            })?;

            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Saves configuration to a file
    pub fn save_to_file(&self, path: &Path) -> GenerationResult<()> {
        let content = toml::to_string(self).map_err(|e| {
            GenerationError::Config(format!("Failed to serialize config: {}", e))
        })?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                GenerationError::Config(format!("Failed to create config directory: {}", e))
            })?;
        }

        fs::write(path, content).map_err(|e| {
            GenerationError::Config(format!("Failed to write config file: {}", e))
        })?;

        Ok(())
    }

    /// Merges this config with another config, preferring values from the other config if present
    pub fn merge(&self, other: &Self) -> Self {
        Self {
            api_key: other.api_key.clone().or_else(|| self.api_key.clone()),
            api_base_url: other
                .api_base_url
                .clone()
                .or_else(|| self.api_base_url.clone()),
            chat_model: other.chat_model.clone().or_else(|| self.chat_model.clone()),
            vision_model: other
                .vision_model
                .clone()
                .or_else(|| self.vision_model.clone()),
            video_model: other.video_model.clone().or_else(|| self.video_model.clone()),
            chat_temperature: other.chat_temperature.or(self.chat_temperature),
            description_temperature: other
                .description_temperature
                .or(self.description_temperature),
            poll_interval_secs: other.poll_interval_secs.or(self.poll_interval_secs),
            max_poll_attempts: other.max_poll_attempts.or(self.max_poll_attempts),
            history_limit: other.history_limit.or(self.history_limit),
            max_context_listings: other.max_context_listings.or(self.max_context_listings),
            excerpt_chars: other.excerpt_chars.or(self.excerpt_chars),
            log_level: other.log_level.clone().or_else(|| self.log_level.clone()),
            assistant_instruction: other
                .assistant_instruction
                .clone()
                .or_else(|| self.assistant_instruction.clone()),
        }
    }

    /// Fills `api_key` from `GEMINI_API_KEY` or `API_KEY` when the file did not set one
    pub fn with_env_overrides(mut self) -> Self {
        if self.api_key.is_none() {
            self.api_key = std::env::var("GEMINI_API_KEY")
                .or_else(|_| std::env::var("API_KEY"))
                .ok()
                .filter(|key| !key.trim().is_empty());
        }
        self
    }

    pub fn base_url(&self) -> &str {
        self.api_base_url.as_deref().unwrap_or(DEFAULT_API_BASE_URL)
    }

    pub fn chat_model(&self) -> &str {
        self.chat_model.as_deref().unwrap_or(DEFAULT_CHAT_MODEL)
    }

    pub fn vision_model(&self) -> &str {
        self.vision_model.as_deref().unwrap_or(DEFAULT_VISION_MODEL)
    }

    pub fn video_model(&self) -> &str {
        self.video_model.as_deref().unwrap_or(DEFAULT_VIDEO_MODEL)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.unwrap_or(5))
    }

    pub fn max_poll_attempts(&self) -> u32 {
        self.max_poll_attempts.unwrap_or(120)
    }
}

/// Helper function to get default config directory
pub fn get_default_config_dir(app_name: &str) -> GenerationResult<PathBuf> {
    let home_dir = dirs::home_dir().ok_or_else(|| {
        GenerationError::Config("Could not determine home directory".to_string())
    })?;

    Ok(home_dir.join(".config").join(app_name))
}

/// Helper function to get default config file path
pub fn get_default_config_file(app_name: &str) -> GenerationResult<PathBuf> {
    let config_dir = get_default_config_dir(app_name)?;
    Ok(config_dir.join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_yields_default() {
        let dir = tempdir().unwrap();
        let config = AssistantConfig::load_from_file(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, AssistantConfig::default());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = AssistantConfig::default();
        config.api_key = Some("secret".to_string());
        config.history_limit = Some(4);
        config.save_to_file(&path).unwrap();

        let loaded = AssistantConfig::load_from_file(&path).unwrap();
        assert_eq!(loaded.api_key.as_deref(), Some("secret"));
        assert_eq!(loaded.history_limit, Some(4));
    }

    #[test]
    fn test_invalid_file_is_config_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "history_limit = \"lots\"").unwrap();

        let err = AssistantConfig::load_from_file(&path).unwrap_err();
        assert!(matches!(err, GenerationError::Config(_)));
    }

    #[test]
    fn test_merge_prefers_other() {
        let base = AssistantConfig::default();
        let other = AssistantConfig {
            api_key: Some("override".to_string()),
            api_base_url: None,
            chat_model: Some("gemini-custom".to_string()),
            vision_model: None,
            video_model: None,
            chat_temperature: None,
            description_temperature: None,
            poll_interval_secs: Some(1),
            max_poll_attempts: None,
            history_limit: None,
            max_context_listings: None,
            excerpt_chars: None,
            log_level: None,
            assistant_instruction: Some("Persona".to_string()),
        };

        let merged = base.merge(&other);
        assert_eq!(merged.api_key.as_deref(), Some("override"));
        assert_eq!(merged.chat_model(), "gemini-custom");
        assert_eq!(merged.vision_model(), DEFAULT_VISION_MODEL);
        assert_eq!(merged.poll_interval(), Duration::from_secs(1));
        assert_eq!(merged.max_poll_attempts(), 120);
        assert_eq!(merged.assistant_instruction.as_deref(), Some("Persona"));
    }
}
