//! HTTP client utilities for hookscope.
//!
//! Both outbound paths (batch delivery and the legacy webhook) go through
//! [`HttpClient`] so every request carries a bounded timeout.

pub mod client;
pub mod request;

pub use client::{build_client, HttpClient, HttpConfig, HttpError};
pub use request::{headers, RequestBuilder};
