//! # ipify IP Resolver
//!
//! Fetches the current public IPv4 address from the ipify JSON endpoint.
//!
//! ## Protocol
//!
//! One `GET` per call; the response body is `{"ip": "<address>"}`.
//!
//! | Failure | Error |
//! |---|---|
//! | connection, DNS or TLS failure | `Error::Network` |
//! | status other than 200, body not JSON | `Error::Protocol` |
//! | missing or empty `ip` field | `Error::Data` |
//!
//! No retries and no caching: every call hits the endpoint, and a failed
//! call is simply retried by the next poll tick.

use async_trait::async_trait;
use dns_updater_core::cancel::run_cancellable;
use dns_updater_core::traits::IpResolver;
use dns_updater_core::{Error, Result};
use reqwest::StatusCode;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Public ipify endpoint returning JSON
pub const DEFAULT_ENDPOINT: &str = "https://api.ipify.org?format=json";

/// ipify response body
#[derive(Debug, Deserialize)]
struct IpifyResponse {
    #[serde(default)]
    ip: Option<String>,
}

/// IP resolver backed by an ipify-compatible HTTP endpoint
#[derive(Debug, Clone)]
pub struct IpifyResolver {
    /// URL queried on every fetch
    endpoint: String,

    /// HTTP client (connection pool shared across clones)
    client: reqwest::Client,
}

impl IpifyResolver {
    /// Resolver for the public ipify endpoint
    pub fn new() -> Self {
        Self::with_endpoint(DEFAULT_ENDPOINT)
    }

    /// Resolver for a custom endpoint speaking the ipify JSON format
    pub fn with_endpoint(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            client: reqwest::Client::new(),
        }
    }

    /// The URL this resolver queries
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn request(&self) -> Result<String> {
        let response = self
            .client
            .get(&self.endpoint)
            .send()
            .await
            .map_err(|e| Error::network(format!("Request to {} failed: {}", self.endpoint, e)))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(Error::protocol(format!(
                "Unexpected HTTP status from {}: {}",
                self.endpoint, status
            )));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| Error::network(format!("Failed to read response body: {}", e)))?;

        parse_body(&body)
    }
}

impl Default for IpifyResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IpResolver for IpifyResolver {
    async fn fetch(&self, cancel: &CancellationToken) -> Result<String> {
        let ip = run_cancellable(cancel, self.request()).await?;
        debug!("Resolved public IP {} from {}", ip, self.endpoint);
        Ok(ip)
    }
}

/// Extract the `ip` field from an ipify JSON body
fn parse_body(body: &[u8]) -> Result<String> {
    let parsed: IpifyResponse = serde_json::from_slice(body)
        .map_err(|e| Error::protocol(format!("Malformed JSON response: {}", e)))?;

    match parsed.ip {
        Some(ip) if !ip.is_empty() => Ok(ip),
        _ => Err(Error::data("Response has no 'ip' field")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_body() {
        assert_eq!(
            parse_body(br#"{"ip":"203.0.113.1"}"#).unwrap(),
            "203.0.113.1"
        );
    }

    #[test]
    fn test_parse_body_ignores_extra_fields() {
        let body = br#"{"ip":"203.0.113.1","country":"NL"}"#;
        assert_eq!(parse_body(body).unwrap(), "203.0.113.1");
    }

    #[test]
    fn test_parse_body_missing_ip_is_data_error() {
        assert!(matches!(parse_body(b"{}"), Err(Error::Data(_))));
        assert!(matches!(parse_body(br#"{"ip":""}"#), Err(Error::Data(_))));
        assert!(matches!(parse_body(br#"{"ip":null}"#), Err(Error::Data(_))));
    }

    #[test]
    fn test_parse_body_not_json_is_protocol_error() {
        assert!(matches!(
            parse_body(b"203.0.113.1\n"),
            Err(Error::Protocol(_))
        ));
    }

    #[test]
    fn test_default_endpoint() {
        assert_eq!(IpifyResolver::new().endpoint(), DEFAULT_ENDPOINT);
    }
}
