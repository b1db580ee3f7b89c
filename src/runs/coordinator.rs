//! The run poll loop.

use std::sync::Arc;
use std::time::Duration;

use crate::assistant::{AssistantGateway, GatewayError, RunPollStatus};

use super::RunRegistry;

/// Terminal outcome of driving one run to completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// The run finished; the assistant's reply text is attached.
    Completed(String),
    /// A cancel request was observed and honored.
    Cancelled,
    /// The remote run itself failed.
    Failed(String),
}

/// Drives registered runs to a terminal outcome.
///
/// The coordinator owns the registry and the poll loop. Cancellation is
/// cooperative: [`RunRegistry::request_cancel`] flips a flag that the loop
/// observes at most once per tick, between gateway calls. There is no
/// guarantee the flag is seen immediately — only eventually, bounded by the
/// poll interval.
#[derive(Clone)]
pub struct RunCoordinator {
    gateway: Arc<dyn AssistantGateway>,
    registry: RunRegistry,
    poll_interval: Duration,
}

impl std::fmt::Debug for RunCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunCoordinator")
            .field("registry", &self.registry)
            .field("poll_interval", &self.poll_interval)
            .finish()
    }
}

impl RunCoordinator {
    /// Create a coordinator with the given gateway and fixed poll interval.
    #[must_use]
    pub fn new(gateway: Arc<dyn AssistantGateway>, poll_interval: Duration) -> Self {
        Self {
            gateway,
            registry: RunRegistry::new(),
            poll_interval,
        }
    }

    /// The shared run registry.
    #[must_use]
    pub fn registry(&self) -> &RunRegistry {
        &self.registry
    }

    /// Track a freshly started run and make it cancellable.
    pub fn register(&self, run_id: &str, thread_id: &str) {
        self.registry.register(run_id, thread_id);
        tracing::debug!(run_id = %run_id, thread_id = %thread_id, "Run registered");
    }

    /// Poll a registered run until it reaches a terminal outcome.
    ///
    /// Each tick polls the remote run, then re-reads the registry entry
    /// before interpreting the status: a cancel flag set by a concurrent
    /// caller wins over whatever the poll returned. Every exit path —
    /// completion, failure, cancellation, or a gateway error — removes the
    /// registry entry exactly once before returning.
    ///
    /// # Errors
    ///
    /// Returns the first [`GatewayError`] raised by any remote call inside
    /// the loop. No call is retried.
    pub async fn drive(
        &self,
        api_key: &str,
        run_id: &str,
        thread_id: &str,
    ) -> Result<RunOutcome, GatewayError> {
        loop {
            let status = match self.gateway.poll_run(api_key, thread_id, run_id).await {
                Ok(status) => status,
                Err(e) => {
                    self.registry.remove(run_id);
                    tracing::error!(run_id = %run_id, error = %e, "Run poll failed");
                    return Err(e);
                }
            };

            // The cancel flag wins over the polled status.
            if self.registry.cancel_requested(run_id) {
                let cancelled = self.gateway.cancel_run(api_key, thread_id, run_id).await;
                self.registry.remove(run_id);
                cancelled?;
                tracing::info!(run_id = %run_id, "Run cancelled");
                return Ok(RunOutcome::Cancelled);
            }

            match status {
                RunPollStatus::Completed => {
                    self.registry.remove(run_id);
                    let text = self.gateway.latest_message(api_key, thread_id).await?;
                    tracing::info!(
                        run_id = %run_id,
                        reply_length = text.len(),
                        "Run completed"
                    );
                    return Ok(RunOutcome::Completed(text));
                }
                RunPollStatus::Failed { reason } => {
                    self.registry.remove(run_id);
                    tracing::warn!(run_id = %run_id, reason = %reason, "Run failed remotely");
                    return Ok(RunOutcome::Failed(reason));
                }
                RunPollStatus::InProgress => {
                    tracing::trace!(run_id = %run_id, "Run still in progress");
                    tokio::time::sleep(self.poll_interval).await;
                }
            }
        }
    }
}
