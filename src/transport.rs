// HTTP transport for the tracking client
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

use crate::error::TrackingError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasicAuth {
    pub user: String,
    pub password: String,
}

// One GET against the tracking endpoint, fully described
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub url: String,
    pub basic_auth: BasicAuth,
    // Applied to both connect and total request time; `None` means unbounded
    pub timeout: Option<Duration>,
}

#[async_trait]
pub trait Transport: Send + Sync + 'static {
    // Perform the request and return the response body
    async fn get(&self, request: &HttpRequest) -> Result<String, TrackingError>;
}

// reqwest-backed transport. A fresh client is built for every call so each
// request gets exactly the timeouts it was configured with.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport;

impl ReqwestTransport {
    pub fn new() -> Self {
        Self
    }

    fn client_for(request: &HttpRequest) -> Result<reqwest::Client, TrackingError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = request.timeout {
            builder = builder.connect_timeout(timeout).timeout(timeout);
        }
        Ok(builder.build()?)
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn get(&self, request: &HttpRequest) -> Result<String, TrackingError> {
        let client = Self::client_for(request)?;

        let response = client
            .get(&request.url)
            .basic_auth(&request.basic_auth.user, Some(&request.basic_auth.password))
            .send()
            .await?;

        debug!(status = %response.status(), "tracking endpoint responded");

        let body = response.error_for_status()?.text().await?;
        Ok(body)
    }
}
