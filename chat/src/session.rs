use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use inmo_core::{
    messages, AssistantConfig, AssistantReply, Citation, GenerationClient, InlineImage,
    InstructionStoreRef,
};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::ChatError;

pub const GREETING: &str =
    "¡Hola! Soy ColaboraBot. Puedo analizar fotos de propiedades o buscar ubicaciones en el mapa.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    /// Prefix used when the turn is replayed as history
    pub fn prefix(&self) -> &'static str {
        match self {
            Role::User => "Usuario",
            Role::Assistant => "Modelo",
        }
    }
}

/// One entry of the conversation. Never mutated after it is appended.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatTurn {
    role: Role,
    text: String,
    attached_image: Option<InlineImage>,
    citations: Vec<Citation>,
    media_uri: Option<String>,
    created_at: DateTime<Utc>,
}

impl ChatTurn {
    fn user(text: String, attached_image: Option<InlineImage>) -> Self {
        Self {
            role: Role::User,
            text,
            attached_image,
            citations: Vec::new(),
            media_uri: None,
            created_at: Utc::now(),
        }
    }

    fn assistant(reply: AssistantReply) -> Self {
        let (text, citations, media_uri) = reply.into_parts();
        Self {
            role: Role::Assistant,
            text,
            attached_image: None,
            citations,
            media_uri,
            created_at: Utc::now(),
        }
    }

    fn greeting(text: &str) -> Self {
        Self {
            role: Role::Assistant,
            text: text.to_string(),
            attached_image: None,
            citations: Vec::new(),
            media_uri: None,
            created_at: Utc::now(),
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn attached_image(&self) -> Option<&InlineImage> {
        self.attached_image.as_ref()
    }

    pub fn citations(&self) -> &[Citation] {
        &self.citations
    }

    pub fn media_uri(&self) -> Option<&str> {
        self.media_uri.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn history_line(&self) -> String {
        format!("{}: {}", self.role.prefix(), self.text)
    }
}

/// Photo waiting to go out with the next send
pub type PendingAttachment = InlineImage;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// No text and no pending attachment
    EmptyInput,
    /// A reply for an earlier send is still outstanding
    AwaitingReply,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SendOutcome {
    Replied(AssistantReply),
    Ignored(IgnoreReason),
}

#[derive(Debug, Default)]
struct SessionState {
    turns: Vec<ChatTurn>,
    pending: Option<PendingAttachment>,
    awaiting_reply: bool,
}

/// Clears the awaiting flag even if the send future is dropped mid-flight
struct AwaitingGuard<'a> {
    state: &'a Mutex<SessionState>,
}

impl Drop for AwaitingGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.awaiting_reply = false;
    }
}

/// Conversation state for one chat widget instance
pub struct ConversationSession {
    id: Uuid,
    created_at: DateTime<Utc>,
    client: Arc<GenerationClient>,
    instructions: InstructionStoreRef,
    history_limit: Option<usize>,
    greeting: Option<String>,
    state: Mutex<SessionState>,
}

impl ConversationSession {
    pub fn new(
        client: Arc<GenerationClient>,
        instructions: InstructionStoreRef,
        history_limit: Option<usize>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            client,
            instructions,
            history_limit,
            greeting: None,
            state: Mutex::new(SessionState::default()),
        }
    }

    pub fn from_config(
        client: Arc<GenerationClient>,
        instructions: InstructionStoreRef,
        config: &AssistantConfig,
    ) -> Self {
        Self::new(client, instructions, config.history_limit).with_greeting(GREETING)
    }

    /// Opens the conversation with an assistant turn, re-seeded on reset
    pub fn with_greeting(mut self, greeting: &str) -> Self {
        let state = self.state.get_mut().unwrap_or_else(|e| e.into_inner());
        state.turns.clear();
        state.turns.push(ChatTurn::greeting(greeting));
        self.greeting = Some(greeting.to_string());
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Snapshot of the turn history
    pub fn turns(&self) -> Vec<ChatTurn> {
        self.state().turns.clone()
    }

    pub fn turn_count(&self) -> usize {
        self.state().turns.len()
    }

    pub fn is_awaiting_reply(&self) -> bool {
        self.state().awaiting_reply
    }

    pub fn pending_attachment(&self) -> Option<PendingAttachment> {
        self.state().pending.clone()
    }

    /// Sets the photo for the next send, replacing any previous one
    pub fn attach_image(&self, data: Vec<u8>, media_type: &str) -> Result<(), ChatError> {
        if data.is_empty() {
            return Err(ChatError::EmptyAttachment);
        }
        if !media_type.starts_with("image/") {
            return Err(ChatError::UnsupportedAttachment(media_type.to_string()));
        }

        let mut state = self.state();
        if state.pending.is_some() {
            debug!(session = %self.id, "Replacing pending attachment");
        }
        state.pending = Some(InlineImage::new(data, media_type));
        Ok(())
    }

    pub fn clear_attachment(&self) {
        self.state().pending = None;
    }

    /// Sends a message. Dropped (not queued) while a reply is outstanding or
    /// when there is neither text nor a pending attachment.
    pub async fn send(&self, text: &str) -> SendOutcome {
        let (prompt, history, image) = {
            let mut state = self.state();
            if state.awaiting_reply {
                debug!(session = %self.id, "Send ignored while awaiting reply");
                return SendOutcome::Ignored(IgnoreReason::AwaitingReply);
            }
            if text.trim().is_empty() && state.pending.is_none() {
                return SendOutcome::Ignored(IgnoreReason::EmptyInput);
            }

            let history = self.render_history(&state.turns);
            let image = state.pending.take();
            state.turns.push(ChatTurn::user(text.to_string(), image.clone()));
            state.awaiting_reply = true;

            let prompt = if text.trim().is_empty() {
                messages::IMAGE_DEFAULT_PROMPT.to_string()
            } else {
                text.to_string()
            };
            (prompt, history, image)
        };
        let _guard = AwaitingGuard { state: &self.state };

        info!(
            session = %self.id,
            with_image = image.is_some(),
            history_lines = history.len(),
            "Sending chat message"
        );
        let instruction = self.instructions.current();
        let reply = self
            .client
            .converse(&prompt, &history, image, Some(&instruction))
            .await;

        self.state().turns.push(ChatTurn::assistant(reply.clone()));
        SendOutcome::Replied(reply)
    }

    /// Prior turns as role-prefixed lines, limited to the most recent ones
    fn render_history(&self, turns: &[ChatTurn]) -> Vec<String> {
        let start = match self.history_limit {
            Some(limit) => turns.len().saturating_sub(limit),
            None => 0,
        };
        turns[start..].iter().map(ChatTurn::history_line).collect()
    }

    /// Drops all turns and the pending attachment. Refused while awaiting a reply.
    pub fn reset(&self) -> bool {
        let mut state = self.state();
        if state.awaiting_reply {
            return false;
        }
        state.turns.clear();
        state.pending = None;
        if let Some(greeting) = &self.greeting {
            state.turns.push(ChatTurn::greeting(greeting));
        }
        info!(session = %self.id, "Session reset");
        true
    }
}
