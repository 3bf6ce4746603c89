//! Drives a long-running video job to a terminal state.

use reqwest::Url;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::client::GenerationBackend;
use crate::config::AssistantConfig;
use crate::errors::{GenerationError, GenerationResult};
use crate::types::Operation;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Running,
    Done,
    Failed,
}

/// A video job as tracked by the poller. Terminal once `Done` or `Failed`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationJob {
    id: String,
    status: JobStatus,
    result_uri: Option<String>,
}

impl GenerationJob {
    fn submitted(id: String) -> Self {
        Self {
            id,
            status: JobStatus::Running,
            result_uri: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn status(&self) -> JobStatus {
        self.status
    }

    /// Fetchable URI with the credential attached, set once `Done`
    pub fn result_uri(&self) -> Option<&str> {
        self.result_uri.as_deref()
    }

    pub fn is_terminal(&self) -> bool {
        self.status != JobStatus::Running
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    Submitted,
    Polling { attempt: u32 },
    Settled(JobStatus),
}

/// Sending half of a poll cancellation signal
#[derive(Debug, Clone)]
pub struct CancelHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        let _ = self.tx.send(true);
    }
}

/// Receiving half, checked on every poll tick
#[derive(Debug, Clone)]
pub struct CancelSignal {
    rx: watch::Receiver<bool>,
}

impl CancelSignal {
    /// Signal that never fires
    pub fn never() -> Self {
        let (_tx, rx) = watch::channel(false);
        Self { rx }
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once cancellation is requested
    async fn cancelled(&mut self) {
        loop {
            if *self.rx.borrow_and_update() {
                return;
            }
            if self.rx.changed().await.is_err() {
                // sender gone without cancelling
                std::future::pending::<()>().await;
            }
        }
    }
}

pub fn cancel_pair() -> (CancelHandle, CancelSignal) {
    let (tx, rx) = watch::channel(false);
    (CancelHandle { tx: Arc::new(tx) }, CancelSignal { rx })
}

pub struct JobPoller<B: GenerationBackend + ?Sized> {
    backend: Arc<B>,
    interval: Duration,
    max_attempts: u32,
}

impl<B: GenerationBackend + ?Sized> JobPoller<B> {
    pub fn new(backend: Arc<B>, interval: Duration, max_attempts: u32) -> Self {
        Self {
            backend,
            interval,
            max_attempts,
        }
    }

    pub fn from_config(backend: Arc<B>, config: &AssistantConfig) -> Self {
        Self::new(backend, config.poll_interval(), config.max_poll_attempts())
    }

    /// Polls `submitted` until it settles, the attempt budget runs out, or
    /// `cancel` fires. Cancellation also interrupts an in-flight status call.
    pub async fn run(
        &self,
        submitted: Operation,
        credential: &str,
        cancel: &mut CancelSignal,
    ) -> GenerationResult<GenerationJob> {
        let mut job = GenerationJob::submitted(submitted.name.clone());
        let mut state = PollState::Submitted;
        let mut current = submitted;
        let mut attempts = 0u32;

        info!(operation = %job.id, "Video job submitted");

        loop {
            if current.done {
                let result = settle(&mut job, &current, credential);
                state = PollState::Settled(job.status);
                debug!(operation = %job.id, state = ?state, attempts, "Video job settled");
                return result.map(|_| job);
            }

            if attempts >= self.max_attempts {
                warn!(operation = %job.id, attempts, "Video job did not settle in time");
                return Err(GenerationError::Timeout { attempts });
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    warn!(operation = %job.id, state = ?state, "Video job polling cancelled");
                    return Err(GenerationError::Cancelled);
                }
                _ = tokio::time::sleep(self.interval) => {}
            }

            attempts += 1;
            state = PollState::Polling { attempt: attempts };
            debug!(operation = %job.id, state = ?state, "Checking video job status");
            current = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    warn!(operation = %job.id, state = ?state, "Video job polling cancelled");
                    return Err(GenerationError::Cancelled);
                }
                polled = self.backend.poll_operation(credential, &job.id) => polled?,
            };
        }
    }
}

fn settle(job: &mut GenerationJob, operation: &Operation, credential: &str) -> GenerationResult<()> {
    if let Some(error) = &operation.error {
        job.status = JobStatus::Failed;
        return Err(GenerationError::JobFailed(format!(
            "{} (code: {})",
            error.message, error.code
        )));
    }

    match operation.video_uri() {
        Some(uri) => {
            job.result_uri = Some(sign_uri(uri, credential)?);
            job.status = JobStatus::Done;
            Ok(())
        }
        None => {
            job.status = JobStatus::Failed;
            Err(GenerationError::JobFailed(
                "job completed without a video".to_string(),
            ))
        }
    }
}

/// Appends the credential as the `key` query parameter required for download
pub fn sign_uri(uri: &str, credential: &str) -> GenerationResult<String> {
    let mut url = Url::parse(uri)
        .map_err(|e| GenerationError::Parsing(format!("Invalid result URI {}: {}", uri, e)))?;
    url.query_pairs_mut().append_pair("key", credential);
    Ok(url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::StubBackend;
    use crate::types::OperationError;

    fn poller(stub: &Arc<StubBackend>, max_attempts: u32) -> JobPoller<StubBackend> {
        JobPoller::new(stub.clone(), Duration::from_millis(1), max_attempts)
    }

    fn pending() -> Operation {
        Operation {
            name: "models/veo/operations/op-1".to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_done_after_two_polls() {
        let stub = Arc::new(StubBackend::video_done_after(2));
        let job = poller(&stub, 10)
            .run(pending(), "secret-key", &mut CancelSignal::never())
            .await
            .unwrap();

        assert_eq!(job.status(), JobStatus::Done);
        assert!(job.is_terminal());
        assert_eq!(stub.poll_calls(), 2);
        let uri = job.result_uri().unwrap();
        assert!(uri.starts_with("https://generativelanguage.googleapis.com/v1beta/files/"));
        assert!(uri.contains("alt=media"));
        assert!(uri.contains("key=secret-key"));
    }

    #[tokio::test]
    async fn test_already_done_needs_no_poll() {
        let stub = Arc::new(StubBackend::video_done_after(0));
        let mut done = pending();
        done.done = true;
        done.response = StubBackend::video_response();

        let job = poller(&stub, 10)
            .run(done, "k", &mut CancelSignal::never())
            .await
            .unwrap();
        assert_eq!(job.status(), JobStatus::Done);
        assert_eq!(stub.poll_calls(), 0);
    }

    #[tokio::test]
    async fn test_timeout_after_max_attempts() {
        let stub = Arc::new(StubBackend::video_done_after(u32::MAX));
        let err = poller(&stub, 3)
            .run(pending(), "k", &mut CancelSignal::never())
            .await
            .unwrap_err();

        assert!(matches!(err, GenerationError::Timeout { attempts: 3 }));
        assert_eq!(stub.poll_calls(), 3);
    }

    #[tokio::test]
    async fn test_cancelled_before_first_poll() {
        let stub = Arc::new(StubBackend::video_done_after(5));
        let (handle, mut signal) = cancel_pair();
        handle.cancel();
        assert!(signal.is_cancelled());

        let err = poller(&stub, 10)
            .run(pending(), "k", &mut signal)
            .await
            .unwrap_err();
        assert!(matches!(err, GenerationError::Cancelled));
        assert_eq!(stub.poll_calls(), 0);
    }

    #[tokio::test]
    async fn test_cancel_interrupts_in_flight_poll() {
        let stub = Arc::new(StubBackend::video_done_after(1).with_poll_delay(Duration::from_secs(30)));
        let (handle, mut signal) = cancel_pair();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            handle.cancel();
        });

        let result = tokio::time::timeout(
            Duration::from_secs(5),
            poller(&stub, 10).run(pending(), "k", &mut signal),
        )
        .await
        .expect("cancellation did not interrupt the status call");

        assert!(matches!(result, Err(GenerationError::Cancelled)));
        assert_eq!(stub.poll_calls(), 1);
    }

    #[tokio::test]
    async fn test_operation_error_is_job_failed() {
        let stub = Arc::new(StubBackend::video_done_after(0));
        let failed = Operation {
            name: "models/veo/operations/op-1".to_string(),
            done: true,
            response: None,
            error: Some(OperationError {
                code: 3,
                message: "unsafe prompt".to_string(),
            }),
        };

        let err = poller(&stub, 10)
            .run(failed, "k", &mut CancelSignal::never())
            .await
            .unwrap_err();
        match err {
            GenerationError::JobFailed(message) => assert!(message.contains("unsafe prompt")),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_sign_uri_without_query() {
        assert_eq!(
            sign_uri("https://files.test/v.mp4", "abc").unwrap(),
            "https://files.test/v.mp4?key=abc"
        );
        assert!(matches!(
            sign_uri("not a uri", "abc"),
            Err(GenerationError::Parsing(_))
        ));
    }
}
