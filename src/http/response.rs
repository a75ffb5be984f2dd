//! One completed HTTP exchange.

use std::collections::BTreeMap;

use super::retry::{IDEMPOTENCY_KEY_HEADER, REQUEST_ID_HEADER};

/// Header names are stored lowercased so lookups ignore the caller's casing.
type HeaderMap = BTreeMap<String, Vec<String>>;

/// Status, body and headers of a finished request.
///
/// Immutable after construction. `headers` is `None` when the executor did not
/// capture any; every lookup tolerates that.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    status: u16,
    body: String,
    headers: Option<HeaderMap>,
}

impl Response {
    /// Creates a response without headers.
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
            headers: None,
        }
    }

    /// Creates a response, copying `headers` into a case-insensitive map.
    ///
    /// Values supplied for the same name under different casings are merged in
    /// iteration order.
    pub fn with_headers<I, K, V>(status: u16, body: impl Into<String>, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: IntoIterator,
        V::Item: Into<String>,
    {
        let mut map = HeaderMap::new();
        for (name, values) in headers {
            map.entry(name.as_ref().to_ascii_lowercase())
                .or_default()
                .extend(values.into_iter().map(Into::into));
        }

        Self {
            status,
            body: body.into(),
            headers: Some(map),
        }
    }

    /// HTTP status code.
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Response body as received.
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Returns `true` for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// All captured headers keyed by lowercased name, or `None` if none were captured.
    pub fn headers(&self) -> Option<&BTreeMap<String, Vec<String>>> {
        self.headers.as_ref()
    }

    /// Every value recorded for `name`, in the order received.
    pub fn header_values(&self, name: &str) -> &[String] {
        self.headers
            .as_ref()
            .and_then(|h| h.get(&name.to_ascii_lowercase()))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// The first value recorded for `name`.
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.header_values(name).first().map(String::as_str)
    }

    /// First `Idempotency-Key` value, if any.
    pub fn idempotency_key(&self) -> Option<&str> {
        self.header_value(IDEMPOTENCY_KEY_HEADER)
    }

    /// First `Request-Id` value, if any.
    pub fn request_id(&self) -> Option<&str> {
        self.header_value(REQUEST_ID_HEADER)
    }
}
