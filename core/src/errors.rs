use thiserror::Error;

/// Errors raised while talking to the generation capability
#[derive(Error, Debug)]
pub enum GenerationError {
    /// No credential is active. Callers resolve it through
    /// `CredentialStore::select` and retry.
    #[error("No active API credential")]
    MissingCredential,

    #[error("Transport failure: {0}")]
    Transport(String),

    #[error("Request rejected: {status} - {message}")]
    CapabilityRejected { status: u16, message: String },

    #[error("Validation failed before request: {0}")]
    ValidationShortCircuit(String),

    #[error("Generation job failed: {0}")]
    JobFailed(String),

    #[error("Generation job did not settle after {attempts} polls")]
    Timeout { attempts: u32 },

    #[error("Generation job polling was cancelled")]
    Cancelled,

    #[error("Configuration Error: {0}")]
    Config(String),

    #[error("Parsing Error: {0}")]
    Parsing(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl GenerationError {
    /// True when the failure is resolved by selecting a credential
    pub fn needs_credential(&self) -> bool {
        matches!(self, GenerationError::MissingCredential)
    }
}

impl From<reqwest::Error> for GenerationError {
    fn from(err: reqwest::Error) -> Self {
        GenerationError::Transport(err.without_url().to_string())
    }
}

impl From<serde_json::Error> for GenerationError {
    fn from(err: serde_json::Error) -> Self {
        GenerationError::Parsing(err.to_string())
    }
}

/// Result type for generation operations
pub type GenerationResult<T> = Result<T, GenerationError>;
