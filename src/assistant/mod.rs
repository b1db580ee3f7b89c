//! Remote assistant gateway.
//!
//! This module provides the capability-set abstraction over the hosted
//! assistants API: thread creation, message posting, run start/poll/cancel,
//! and message retrieval.
//!
//! # Overview
//!
//! The [`AssistantGateway`] trait is the seam between the relay and the
//! remote service. Handlers and the run coordinator only ever see the trait,
//! so tests can substitute a scripted fake. [`HostedAssistantGateway`] is
//! the production implementation speaking the assistants REST protocol.
//!
//! Credentials are scoped to each call rather than to the gateway instance:
//! every client brings its own API key, and a run is owned by the
//! credentials that started it.

pub mod hosted;
pub mod mock;

pub use hosted::HostedAssistantGateway;
pub use mock::MockGateway;

/// Outcome of a single run poll, as reported by the remote service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunPollStatus {
    /// The run finished and its reply is ready to fetch.
    Completed,
    /// The run reached a terminal state other than success
    /// (`failed`, `cancelled`, `expired`, `incomplete`).
    Failed {
        /// Remote failure description.
        reason: String,
    },
    /// The run is still executing; poll again after the fixed interval.
    InProgress,
}

/// Transport or protocol error talking to the remote service.
///
/// Every variant is fatal to the run being driven; no call is retried at
/// any layer. Re-submission is left to the end user.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Network-level failure (connect, TLS, timeout, body read).
    #[error("gateway transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The remote service answered with a non-success status.
    #[error("gateway returned {status}: {body}")]
    RemoteStatus {
        /// HTTP status code.
        status: u16,
        /// Response body, as received.
        body: String,
    },

    /// The response decoded but did not carry the expected fields.
    #[error("malformed gateway response: {0}")]
    MalformedResponse(String),
}

/// Capability set exposed by the hosted assistants API.
///
/// All methods take the per-client API key; the gateway itself is stateless
/// apart from its connection pool.
#[async_trait::async_trait]
pub trait AssistantGateway: Send + Sync {
    /// Create a new conversation thread and return its identifier.
    async fn create_thread(&self, api_key: &str) -> Result<String, GatewayError>;

    /// Append a user message to a thread.
    async fn post_message(
        &self,
        api_key: &str,
        thread_id: &str,
        text: &str,
    ) -> Result<(), GatewayError>;

    /// Start an assistant run on a thread and return the run identifier.
    async fn start_run(
        &self,
        api_key: &str,
        thread_id: &str,
        assistant_id: &str,
    ) -> Result<String, GatewayError>;

    /// Fetch the current status of a run.
    async fn poll_run(
        &self,
        api_key: &str,
        thread_id: &str,
        run_id: &str,
    ) -> Result<RunPollStatus, GatewayError>;

    /// Ask the remote service to cancel a run.
    async fn cancel_run(
        &self,
        api_key: &str,
        thread_id: &str,
        run_id: &str,
    ) -> Result<(), GatewayError>;

    /// Fetch the latest message text on a thread.
    async fn latest_message(&self, api_key: &str, thread_id: &str)
    -> Result<String, GatewayError>;
}
