use async_trait::async_trait;
use std::fmt::Debug;
use std::sync::{Arc, RwLock};
use tracing::debug;

use crate::errors::{GenerationError, GenerationResult};

/// Process-wide source of the API credential.
///
/// Every generation call reads `active`; only `select` may change it.
#[async_trait]
pub trait CredentialStore: Send + Sync + Debug {
    /// Currently selected credential, if any
    fn active(&self) -> Option<String>;

    /// Makes a credential active, interactively if the implementation can.
    /// Returns the active credential unchanged when one is already selected.
    async fn select(&self) -> GenerationResult<String>;
}

/// Type alias for Arc-wrapped CredentialStore trait objects
pub type CredentialStoreRef = Arc<dyn CredentialStore>;

/// Credential fixed at startup (config file or environment)
#[derive(Debug, Default)]
pub struct StaticCredentials {
    key: RwLock<Option<String>>,
}

impl StaticCredentials {
    pub fn new(key: Option<String>) -> Self {
        Self {
            key: RwLock::new(key.filter(|k| !k.trim().is_empty())),
        }
    }

    /// Replaces the active credential
    pub fn set(&self, key: String) {
        if let Ok(mut guard) = self.key.write() {
            *guard = Some(key);
        }
    }
}

#[async_trait]
impl CredentialStore for StaticCredentials {
    fn active(&self) -> Option<String> {
        self.key.read().ok().and_then(|guard| guard.clone())
    }

    async fn select(&self) -> GenerationResult<String> {
        match self.active() {
            Some(key) => {
                debug!("Credential already selected");
                Ok(key)
            }
            None => Err(GenerationError::MissingCredential),
        }
    }
}
