use crate::fetch::client::HttpClient;
use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, HeaderName, HeaderValue};
use tracing::warn;

/// An [`HttpClient`] wrapper that injects a service key as request headers.
///
/// PostgREST gateways want the key twice: once under a provider-specific header
/// (`apikey`) and once as `Authorization: Bearer <key>`.
pub struct ApiKey<C> {
    pub inner: C,
    headers: Vec<(HeaderName, HeaderValue)>,
}

impl<C> ApiKey<C> {
    pub fn new(inner: C) -> Self {
        Self {
            inner,
            headers: Vec::new(),
        }
    }

    /// Add `header_name: key`. Names or values that are not valid header text are skipped.
    pub fn header(mut self, header_name: &str, key: &str) -> Self {
        match (
            HeaderName::from_bytes(header_name.as_bytes()),
            HeaderValue::from_str(key),
        ) {
            (Ok(name), Ok(mut value)) => {
                value.set_sensitive(true);
                self.headers.push((name, value));
            }
            _ => warn!(header = header_name, "Skipping invalid credential header"),
        }
        self
    }

    pub fn bearer(self, key: &str) -> Self {
        self.header(AUTHORIZATION.as_str(), &format!("Bearer {key}"))
    }
}

#[async_trait]
impl<C: HttpClient> HttpClient for ApiKey<C> {
    async fn execute(&self, mut req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
        for (name, value) in &self.headers {
            req.headers_mut().insert(name.clone(), value.clone());
        }
        self.inner.execute(req).await
    }
}
