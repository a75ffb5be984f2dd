//! Retry loop around a single-shot executor.

use log::{debug, warn};
use tokio_util::sync::CancellationToken;

use super::client::Execute;
use super::error::TransportError;
use super::request::Request;
use super::response::Response;
use super::retry::RetryPolicy;

/// Sends requests through `E`, retrying retryable responses per a [`RetryPolicy`].
///
/// Attempts for one call run strictly one after another. The transport keeps no
/// per-call state, so one instance can serve concurrent calls through `&self`.
pub struct RetryingTransport<E> {
    executor: E,
    policy: RetryPolicy,
}

impl<E: Execute> RetryingTransport<E> {
    /// Creates a transport sending through `executor` under `policy`.
    pub fn new(executor: E, policy: RetryPolicy) -> Self {
        Self { executor, policy }
    }

    /// Returns the policy fixed at construction.
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Returns a reference to the underlying executor.
    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// Sends `request` until a response is not retryable or the retry budget runs out.
    pub async fn send(&self, request: &Request) -> Result<Response, TransportError> {
        self.send_with_cancellation(request, &CancellationToken::new())
            .await
    }

    /// Like [`send`](Self::send), but gives up with [`TransportError::Aborted`] as soon
    /// as `cancel` fires, whether an attempt is in flight or a retry is pending.
    ///
    /// Executor errors are returned as-is on the attempt that produced them.
    #[tracing::instrument(skip(self, request, cancel), fields(method = %request.method, url = %request.url))]
    pub async fn send_with_cancellation(
        &self,
        request: &Request,
        cancel: &CancellationToken,
    ) -> Result<Response, TransportError> {
        let mut retries: u32 = 0;

        loop {
            // Connection failures propagate here and are not retried.
            let response = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!("Cancelled during attempt {}", retries + 1);
                    return Err(TransportError::Aborted);
                }
                result = self.executor.execute(request) => result?,
            };

            if !self.policy.should_retry(retries, &response) {
                debug!(
                    "HTTP {} after {} retr{}, not retrying",
                    response.status(),
                    retries,
                    if retries == 1 { "y" } else { "ies" }
                );
                return Ok(response);
            }

            retries += 1;
            let delay = self.policy.sleep_time(retries);

            warn!(
                "HTTP {} (request id {}), retry {}/{} in {}ms...",
                response.status(),
                response.request_id().unwrap_or("-"),
                retries,
                self.policy.max_retries(),
                delay.as_millis()
            );

            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!("Cancelled before retry {}", retries);
                    return Err(TransportError::Aborted);
                }
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }
}
