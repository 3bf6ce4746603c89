use async_trait::async_trait;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use inmo_core::types::{
    Candidate, CandidateContent, GenerateContentRequest, GenerateContentResponse, Operation,
    PartResponse, VideoRequest,
};
use inmo_core::{
    AssistantConfig, GenerationBackend, GenerationClient, GenerationError, GenerationResult,
    StaticCatalog, StaticCredentials,
};

/// Backend double counting generateContent calls
pub(crate) struct CountingBackend {
    reply: String,
    fail: bool,
    delay: Option<Duration>,
    calls: AtomicU32,
    requests: Mutex<Vec<GenerateContentRequest>>,
}

impl CountingBackend {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            fail: false,
            delay: None,
            calls: AtomicU32::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::replying("")
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    fn last_request(&self) -> GenerateContentRequest {
        self.requests
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("no request recorded")
    }

    pub fn last_prompt_text(&self) -> String {
        self.last_request().contents[0].joined_text()
    }

    pub fn last_system_text(&self) -> String {
        self.last_request().system_text()
    }

    pub fn last_request_had_image(&self) -> bool {
        self.last_request().has_inline_data()
    }
}

#[async_trait]
impl GenerationBackend for CountingBackend {
    async fn generate_content(
        &self,
        _credential: &str,
        _model: &str,
        request: &GenerateContentRequest,
    ) -> GenerationResult<GenerateContentResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail {
            return Err(GenerationError::Transport("connection reset".to_string()));
        }
        Ok(GenerateContentResponse {
            candidates: vec![Candidate {
                content: Some(CandidateContent {
                    parts: vec![PartResponse {
                        text: Some(self.reply.clone()),
                    }],
                    role: Some("model".to_string()),
                }),
                grounding_metadata: None,
                finish_reason: None,
            }],
        })
    }

    async fn submit_video(
        &self,
        _credential: &str,
        _model: &str,
        _request: &VideoRequest,
    ) -> GenerationResult<Operation> {
        Err(GenerationError::Transport("not used in chat tests".to_string()))
    }

    async fn poll_operation(&self, _credential: &str, _name: &str) -> GenerationResult<Operation> {
        Err(GenerationError::Transport("not used in chat tests".to_string()))
    }
}

pub(crate) fn client_with(backend: &Arc<CountingBackend>) -> Arc<GenerationClient> {
    let backend: Arc<dyn GenerationBackend> = backend.clone();
    Arc::new(GenerationClient::new(
        backend,
        Arc::new(StaticCredentials::new(Some("test-key".to_string()))),
        Arc::new(StaticCatalog::sample()),
        &AssistantConfig::default(),
    ))
}
