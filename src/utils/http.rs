//! HTTP transport for mint requests
//!
//! Provides a blocking JSON client with:
//! - Connection pooling per mint
//! - Per-request timeouts chosen by the calling operation
//! - Translation of `{detail, code}` error bodies into mint errors
//!
//! Requests are never retried; backoff is the caller's business.

use reqwest::blocking::{Client, RequestBuilder};
use serde_json::Value;
use std::time::Duration;

use super::config::normalize_mint_url;
use crate::error::{CashuError, CashuResult, ErrorCode};
use crate::mint::transport::{mint_error_from_body, MintTransport};

/// Blocking `reqwest` client rooted at one mint URL
#[derive(Debug, Clone)]
pub struct HttpTransport {
    base_url: String,
    client: Client,
}

impl HttpTransport {
    pub fn new(mint_url: &str, user_agent: &str) -> CashuResult<Self> {
        let base_url = normalize_mint_url(mint_url)?;

        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(5)
            .tcp_keepalive(Duration::from_secs(60))
            .tcp_nodelay(true)
            .user_agent(user_agent)
            .build()
            .map_err(|e| CashuError::network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { base_url, client })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn send(&self, request: RequestBuilder, path: &str) -> CashuResult<Value> {
        let response = request.send()?;
        let status = response.status();
        let text = response.text()?;

        if status.is_success() {
            return serde_json::from_str(&text).map_err(|e| {
                CashuError::new(ErrorCode::JsonError, format!("Invalid JSON from {}", path)).with_details(e.to_string())
            });
        }

        // Mints report protocol failures as 400 with a JSON body
        if let Ok(body) = serde_json::from_str::<Value>(&text) {
            if let Some(err) = mint_error_from_body(&body) {
                return Err(err);
            }
        }

        Err(CashuError::network(format!("{} returned HTTP {}", path, status.as_u16()))
            .with_details(text.chars().take(200).collect::<String>()))
    }
}

impl MintTransport for HttpTransport {
    fn get(&self, path: &str, timeout: Duration) -> CashuResult<Value> {
        crate::log_debug!("http", "GET", path = path);
        let request = self.client.get(self.url(path)).timeout(timeout);
        self.send(request, path)
    }

    fn post(&self, path: &str, body: &Value, timeout: Duration) -> CashuResult<Value> {
        crate::log_debug!("http", "POST", path = path);
        let request = self.client.post(self.url(path)).json(body).timeout(timeout);
        self.send(request, path)
    }
}
