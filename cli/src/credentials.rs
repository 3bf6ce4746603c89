use async_trait::async_trait;
use dialoguer::{Password, theme::ColorfulTheme};
use inmo_core::{CredentialStore, GenerationError, GenerationResult, StaticCredentials};
use tracing::info;

/// Credential store that asks for a key on the terminal when none is active.
/// Input is hidden while typing.
#[derive(Debug)]
pub struct PromptCredentials {
    inner: StaticCredentials,
}

impl PromptCredentials {
    pub fn new(key: Option<String>) -> Self {
        Self {
            inner: StaticCredentials::new(key),
        }
    }
}

#[async_trait]
impl CredentialStore for PromptCredentials {
    fn active(&self) -> Option<String> {
        self.inner.active()
    }

    async fn select(&self) -> GenerationResult<String> {
        if let Some(key) = self.inner.active() {
            return Ok(key);
        }

        let key = tokio::task::spawn_blocking(|| {
            Password::with_theme(&ColorfulTheme::default())
                .with_prompt("Introduce tu API Key de Gemini")
                .allow_empty_password(true)
                .interact()
        })
        .await
        .map_err(|e| GenerationError::Config(format!("Credential prompt failed: {}", e)))?
        .map_err(|e| GenerationError::Config(format!("Credential prompt failed: {}", e)))?;
        let key = key.trim().to_string();

        if key.is_empty() {
            return Err(GenerationError::MissingCredential);
        }

        self.inner.set(key.clone());
        info!("API credential selected");
        Ok(key)
    }
}
