//! Single-shot request execution.

use async_trait::async_trait;
use log::debug;
use reqwest::Client;

use super::error::TransportError;
use super::request::Request;
use super::response::Response;

/// Sends one request and returns whatever came back, without retrying.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Execute: Send + Sync {
    async fn execute(&self, request: &Request) -> Result<Response, TransportError>;
}

/// [`Execute`] backed by a reqwest [`Client`].
///
/// Every HTTP status becomes a [`Response`]; only failures to obtain one are errors.
#[derive(Clone, Default)]
pub struct ReqwestExecutor {
    client: Client,
}

impl ReqwestExecutor {
    /// Creates a new executor wrapping the given reqwest Client.
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Returns a reference to the underlying reqwest Client.
    pub fn inner(&self) -> &Client {
        &self.client
    }
}

#[async_trait]
impl Execute for ReqwestExecutor {
    #[tracing::instrument(skip(self, request), fields(method = %request.method, url = %request.url))]
    async fn execute(&self, request: &Request) -> Result<Response, TransportError> {
        debug!("{} {}...", request.method, request.url);

        let mut builder = self.client.request(request.method.clone(), &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder
            .send()
            .await
            .map_err(|e| TransportError::from_reqwest(&e))?;

        let status = response.status().as_u16();
        let mut headers: Vec<(String, Vec<String>)> = Vec::new();
        for name in response.headers().keys() {
            let values = response
                .headers()
                .get_all(name)
                .iter()
                .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
                .collect();
            headers.push((name.as_str().to_string(), values));
        }

        let body = response
            .text()
            .await
            .map_err(|e| TransportError::Api(format!("Failed to read response body: {}", e)))?;

        debug!("Received HTTP {} ({} bytes)", status, body.len());

        Ok(Response::with_headers(status, body, headers))
    }
}
