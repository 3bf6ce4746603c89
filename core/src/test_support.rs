use async_trait::async_trait;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use crate::client::GenerationBackend;
use crate::errors::{GenerationError, GenerationResult};
use crate::types::*;

/// Backend double that records calls instead of touching the network
pub(crate) struct StubBackend {
    response: GenerateContentResponse,
    done_after: u32,
    fail: bool,
    poll_delay: Option<Duration>,
    generate_calls: AtomicU32,
    submit_calls: AtomicU32,
    poll_calls: AtomicU32,
    requests: Mutex<Vec<(String, GenerateContentRequest)>>,
}

impl StubBackend {
    fn build(response: GenerateContentResponse, done_after: u32, fail: bool) -> Self {
        Self {
            response,
            done_after,
            fail,
            poll_delay: None,
            generate_calls: AtomicU32::new(0),
            submit_calls: AtomicU32::new(0),
            poll_calls: AtomicU32::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with_response(response: GenerateContentResponse) -> Self {
        Self::build(response, 1, false)
    }

    pub fn replying(text: &str) -> Self {
        Self::with_response(GenerateContentResponse {
            candidates: vec![Candidate {
                content: Some(CandidateContent {
                    parts: vec![PartResponse {
                        text: Some(text.to_string()),
                    }],
                    role: Some("model".to_string()),
                }),
                grounding_metadata: None,
                finish_reason: Some("STOP".to_string()),
            }],
        })
    }

    /// Every call fails at the transport layer
    pub fn failing() -> Self {
        Self::build(GenerateContentResponse::default(), 1, true)
    }

    /// Video job reports done on the `polls`-th status check
    pub fn video_done_after(polls: u32) -> Self {
        Self::build(GenerateContentResponse::default(), polls, false)
    }

    /// Each status check takes `delay` before answering
    pub fn with_poll_delay(mut self, delay: Duration) -> Self {
        self.poll_delay = Some(delay);
        self
    }

    pub fn video_response() -> Option<OperationResponse> {
        Some(OperationResponse {
            generate_video_response: Some(GenerateVideoResponse {
                generated_samples: vec![GeneratedSample {
                    video: Some(VideoRef {
                        uri: Some(
                            "https://generativelanguage.googleapis.com/v1beta/files/vid-1:download?alt=media"
                                .to_string(),
                        ),
                    }),
                }],
            }),
        })
    }

    pub fn generate_calls(&self) -> u32 {
        self.generate_calls.load(Ordering::SeqCst)
    }

    pub fn submit_calls(&self) -> u32 {
        self.submit_calls.load(Ordering::SeqCst)
    }

    pub fn poll_calls(&self) -> u32 {
        self.poll_calls.load(Ordering::SeqCst)
    }

    /// Model and request of every generateContent call so far
    pub fn requests(&self) -> Vec<(String, GenerateContentRequest)> {
        self.requests.lock().unwrap().clone()
    }

    fn transport_error() -> GenerationError {
        GenerationError::Transport("connection refused".to_string())
    }
}

#[async_trait]
impl GenerationBackend for StubBackend {
    async fn generate_content(
        &self,
        _credential: &str,
        model: &str,
        request: &GenerateContentRequest,
    ) -> GenerationResult<GenerateContentResponse> {
        self.generate_calls.fetch_add(1, Ordering::SeqCst);
        self.requests
            .lock()
            .unwrap()
            .push((model.to_string(), request.clone()));
        if self.fail {
            return Err(Self::transport_error());
        }
        Ok(self.response.clone())
    }

    async fn submit_video(
        &self,
        _credential: &str,
        _model: &str,
        _request: &VideoRequest,
    ) -> GenerationResult<Operation> {
        self.submit_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(Self::transport_error());
        }
        Ok(Operation {
            name: "models/veo/operations/op-1".to_string(),
            ..Default::default()
        })
    }

    async fn poll_operation(&self, _credential: &str, name: &str) -> GenerationResult<Operation> {
        let calls = self.poll_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(delay) = self.poll_delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail {
            return Err(Self::transport_error());
        }
        let done = calls >= self.done_after;
        Ok(Operation {
            name: name.to_string(),
            done,
            response: if done { Self::video_response() } else { None },
            error: None,
        })
    }
}
