//! Scripted in-memory gateway for tests.
//!
//! Stands in for the hosted service so the registry, coordinator, and HTTP
//! handlers can be exercised without a network. Poll results are consumed
//! from a script queue; an exhausted script keeps reporting
//! [`RunPollStatus::InProgress`].

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::{AssistantGateway, GatewayError, RunPollStatus};

/// Scripted [`AssistantGateway`] double.
#[derive(Debug, Default)]
pub struct MockGateway {
    thread_counter: AtomicUsize,
    run_counter: AtomicUsize,
    poll_script: Mutex<VecDeque<Result<RunPollStatus, GatewayError>>>,
    reply: Mutex<String>,
    fail_start_run: Mutex<Option<GatewayError>>,
    posted_messages: Mutex<Vec<(String, String)>>,
    cancel_calls: Mutex<Vec<String>>,
}

impl MockGateway {
    /// Create a mock whose runs never finish until scripted otherwise.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the result of the next unscripted poll.
    pub fn push_poll(&self, result: Result<RunPollStatus, GatewayError>) {
        self.poll_script.lock().unwrap().push_back(result);
    }

    /// Set the text returned by `latest_message`.
    pub fn set_reply(&self, text: impl Into<String>) {
        *self.reply.lock().unwrap() = text.into();
    }

    /// Make the next `start_run` call fail with the given error.
    pub fn fail_next_start_run(&self, err: GatewayError) {
        *self.fail_start_run.lock().unwrap() = Some(err);
    }

    /// Messages posted so far, as `(thread_id, text)` pairs.
    #[must_use]
    pub fn posted_messages(&self) -> Vec<(String, String)> {
        self.posted_messages.lock().unwrap().clone()
    }

    /// Run ids whose remote cancel was requested.
    #[must_use]
    pub fn cancel_calls(&self) -> Vec<String> {
        self.cancel_calls.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl AssistantGateway for MockGateway {
    async fn create_thread(&self, _api_key: &str) -> Result<String, GatewayError> {
        let n = self.thread_counter.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(format!("thread_mock_{n}"))
    }

    async fn post_message(
        &self,
        _api_key: &str,
        thread_id: &str,
        text: &str,
    ) -> Result<(), GatewayError> {
        self.posted_messages
            .lock()
            .unwrap()
            .push((thread_id.to_string(), text.to_string()));
        Ok(())
    }

    async fn start_run(
        &self,
        _api_key: &str,
        _thread_id: &str,
        _assistant_id: &str,
    ) -> Result<String, GatewayError> {
        if let Some(err) = self.fail_start_run.lock().unwrap().take() {
            return Err(err);
        }
        let n = self.run_counter.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(format!("run_mock_{n}"))
    }

    async fn poll_run(
        &self,
        _api_key: &str,
        _thread_id: &str,
        _run_id: &str,
    ) -> Result<RunPollStatus, GatewayError> {
        self.poll_script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(RunPollStatus::InProgress))
    }

    async fn cancel_run(
        &self,
        _api_key: &str,
        _thread_id: &str,
        run_id: &str,
    ) -> Result<(), GatewayError> {
        self.cancel_calls.lock().unwrap().push(run_id.to_string());
        Ok(())
    }

    async fn latest_message(
        &self,
        _api_key: &str,
        _thread_id: &str,
    ) -> Result<String, GatewayError> {
        Ok(self.reply.lock().unwrap().clone())
    }
}
