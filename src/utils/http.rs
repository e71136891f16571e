// src/utils/http.rs
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{Client, Response};
use tracing::debug;

/// HTTP client for making requests
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    /// Create a new HTTP client
    pub fn new(user_agent: Option<String>, timeout_secs: Option<u64>) -> Result<Self> {
        let user_agent =
            user_agent.unwrap_or_else(|| format!("netrecon/{}", env!("CARGO_PKG_VERSION")));
        let timeout = Duration::from_secs(timeout_secs.unwrap_or(30));

        let client = Client::builder()
            .timeout(timeout)
            .user_agent(&user_agent)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client })
    }

    /// Make a GET request bounded by a call-site timeout, returning the raw
    /// reqwest error so callers can tell timeouts from connection failures.
    pub async fn get_with_timeout(
        &self,
        url: &str,
        timeout: Duration,
    ) -> std::result::Result<Response, reqwest::Error> {
        debug!("GET {} (timeout {:?})", url, timeout);

        self.client.get(url).timeout(timeout).send().await
    }
}
