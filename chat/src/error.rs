use thiserror::Error;

/// Errors from the chat session
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ChatError {
    #[error("attachment is empty")]
    EmptyAttachment,

    #[error("unsupported attachment type: {0}")]
    UnsupportedAttachment(String),
}
