//! HTTP client configuration.

use reqwest::header::HeaderMap;
use reqwest::{Client, ClientBuilder};
use std::time::Duration;

use crate::request::RequestBuilder;

/// HTTP client configuration.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Connection timeout.
    pub connect_timeout: Duration,
    /// Whole-request timeout.
    pub request_timeout: Duration,
    /// User agent string.
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self::batch_delivery()
    }
}

impl HttpConfig {
    /// Timeouts for batch delivery to the ingestion endpoint.
    pub fn batch_delivery() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            user_agent: format!("hookscope/{}", env!("CARGO_PKG_VERSION")),
        }
    }

    /// Short timeouts for the best-effort webhook.
    pub fn webhook() -> Self {
        Self {
            connect_timeout: Duration::from_secs(2),
            request_timeout: Duration::from_secs(5),
            ..Self::batch_delivery()
        }
    }
}

/// Build a configured HTTP client.
pub fn build_client(config: HttpConfig) -> Result<Client, HttpError> {
    ClientBuilder::new()
        .connect_timeout(config.connect_timeout)
        .timeout(config.request_timeout)
        .user_agent(&config.user_agent)
        .build()
        .map_err(HttpError::ClientBuild)
}

/// HTTP errors.
#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),

    #[error("request failed: {0}")]
    Request(#[source] reqwest::Error),

    #[error("request timed out")]
    Timeout,

    #[error("rate limited (retry after {retry_after:?})")]
    RateLimited { retry_after: Option<Duration> },

    #[error("server error: {status}")]
    ServerError { status: u16, body: String },

    #[error("client error: {status}")]
    ClientError { status: u16, body: String },
}

impl HttpError {
    /// HTTP status carried by the error, if the server answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            HttpError::ServerError { status, .. } | HttpError::ClientError { status, .. } => {
                Some(*status)
            }
            HttpError::RateLimited { .. } => Some(429),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for HttpError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            HttpError::Timeout
        } else {
            HttpError::Request(e)
        }
    }
}

/// Thin wrapper over a configured reqwest client.
#[derive(Debug, Clone)]
pub struct HttpClient {
    inner: Client,
}

impl HttpClient {
    /// Create a client for batch delivery.
    pub fn new() -> Result<Self, HttpError> {
        Self::with_config(HttpConfig::default())
    }

    /// Create a client with custom config.
    pub fn with_config(config: HttpConfig) -> Result<Self, HttpError> {
        let inner = build_client(config)?;
        Ok(Self { inner })
    }

    /// Get the inner reqwest client.
    pub fn inner(&self) -> &Client {
        &self.inner
    }

    /// POST a JSON body. Non-2xx responses are returned as errors.
    pub async fn post_json<T: serde::Serialize + ?Sized>(
        &self,
        url: &str,
        body: &T,
    ) -> Result<reqwest::Response, HttpError> {
        self.post_json_with(url, &HeaderMap::new(), body).await
    }

    /// POST a JSON body with the headers assembled by a [`RequestBuilder`].
    pub async fn post_json_request<T: serde::Serialize + ?Sized>(
        &self,
        request: &RequestBuilder,
        path: &str,
        body: &T,
    ) -> Result<reqwest::Response, HttpError> {
        self.post_json_with(&request.url(path), request.headers(), body)
            .await
    }

    async fn post_json_with<T: serde::Serialize + ?Sized>(
        &self,
        url: &str,
        headers: &HeaderMap,
        body: &T,
    ) -> Result<reqwest::Response, HttpError> {
        tracing::debug!(%url, "POST");
        let response = self
            .inner
            .post(url)
            .headers(headers.clone())
            .json(body)
            .send()
            .await
            .map_err(HttpError::from)?;
        tracing::debug!(status = %response.status(), %url, "POST response");
        Self::check_response(response).await
    }

    /// Check response status and convert errors.
    pub async fn check_response(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, HttpError> {
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        if status.as_u16() == 429 {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .map(Duration::from_secs);

            return Err(HttpError::RateLimited { retry_after });
        }

        let body = response.text().await.unwrap_or_default();

        if status.is_server_error() {
            Err(HttpError::ServerError {
                status: status.as_u16(),
                body,
            })
        } else {
            Err(HttpError::ClientError {
                status: status.as_u16(),
                body,
            })
        }
    }
}
