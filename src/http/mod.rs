//! HTTP transport with server-aware retry and exponential backoff.

mod client;
mod error;
mod request;
mod response;
mod retry;
mod transport;

pub use client::{Execute, ReqwestExecutor};
pub use error::{PolicyError, TransportError};
pub use request::Request;
pub use response::Response;
pub use retry::{
    DEFAULT_MAX_DELAY_MS, DEFAULT_MAX_RETRIES, DEFAULT_MIN_DELAY_MS, IDEMPOTENCY_KEY_HEADER,
    REQUEST_ID_HEADER, RetryPolicy, SHOULD_RETRY_HEADER,
};
pub use transport::RetryingTransport;
