//! Chat session for the marketplace assistant widget
//!
//! A `ConversationSession` owns the turn history of one widget instance,
//! at most one pending photo, and the guard that keeps sends single-flight.

pub mod error;
pub mod session;

#[cfg(test)]
pub(crate) mod test_support;

pub use error::ChatError;
pub use session::{
    ChatTurn, ConversationSession, IgnoreReason, PendingAttachment, Role, SendOutcome, GREETING,
};
