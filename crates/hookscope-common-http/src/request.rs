//! Request header assembly.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};

/// Common HTTP headers.
pub mod headers {
    pub const CONTENT_TYPE_JSON: &str = "application/json";
    pub const X_API_KEY: &str = "x-api-key";
}

/// Base URL plus the headers shared by every request to one endpoint.
#[derive(Debug, Clone, Default)]
pub struct RequestBuilder {
    headers: HeaderMap,
    base_url: Option<String>,
}

impl RequestBuilder {
    /// Create a new request builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the base URL.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Add a header. Names or values that are not valid HTTP are skipped.
    pub fn header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        if let (Ok(name), Ok(value)) = (
            HeaderName::try_from(name.as_ref()),
            HeaderValue::try_from(value.as_ref()),
        ) {
            self.headers.insert(name, value);
        }
        self
    }

    /// Add the `X-API-Key` header.
    pub fn api_key(self, key: impl AsRef<str>) -> Self {
        self.header(headers::X_API_KEY, key)
    }

    /// Set content type to JSON.
    pub fn json_content(mut self) -> Self {
        self.headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static(headers::CONTENT_TYPE_JSON),
        );
        self
    }

    /// Get the built headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Join `path` onto the base URL.
    pub fn url(&self, path: &str) -> String {
        match &self.base_url {
            Some(base) => format!("{}{}", base.trim_end_matches('/'), path),
            None => path.to_string(),
        }
    }
}
