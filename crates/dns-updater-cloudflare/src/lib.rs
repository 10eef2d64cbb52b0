//! # Cloudflare DNS Provider
//!
//! Upserts A records through the Cloudflare API v4.
//!
//! ## Flow
//!
//! ```text
//! GET  /zones?name=<zone>                            → zone id
//! GET  /zones/:zone_id/dns_records?type=A&name=<fqdn> → existing record, if any
//! POST /zones/:zone_id/dns_records                    (record absent)
//! PATCH /zones/:zone_id/dns_records/:record_id        (content or TTL differ)
//! ```
//!
//! A record that already carries the requested content and TTL is left
//! alone, so re-applying the same value costs two GETs and no write. The
//! PATCH carries only `content` and `ttl`; proxying, comments and tags set
//! on the record stay as they are.
//!
//! ## Authentication
//!
//! Either a scoped API token (`Authorization: Bearer`) or the legacy
//! account email + global API key pair (`X-Auth-Email` / `X-Auth-Key`).
//! Credentials never appear in logs or `Debug` output.
//!
//! ## Errors
//!
//! Transport failures map to `Error::Network`; every API rejection
//! (auth, rate limit, missing zone, malformed body) maps to
//! `Error::Provider`. The provider performs no retries of its own: the
//! poll loop's next tick is the retry.

use async_trait::async_trait;
use dns_updater_core::cancel::run_cancellable;
use dns_updater_core::config::{ProviderConfig, non_blank};
use dns_updater_core::registry::ProviderRegistry;
use dns_updater_core::target::{fqdn, validate_ipv4};
use dns_updater_core::traits::{DnsUpdater, DnsUpdaterFactory, UpsertOutcome};
use dns_updater_core::{Error, Result};
use reqwest::{RequestBuilder, Response};
use serde_json::{Value, json};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Cloudflare API base URL
pub const CLOUDFLARE_API_BASE: &str = "https://api.cloudflare.com/client/v4";

const PROVIDER: &str = "cloudflare";

/// How requests authenticate against the API
#[derive(Clone, PartialEq, Eq)]
pub enum CloudflareAuth {
    /// Scoped API token with Zone:DNS:Edit permission
    Token(String),

    /// Legacy account email + global API key
    GlobalKey {
        /// Account email
        email: String,
        /// Global API key
        key: String,
    },
}

impl CloudflareAuth {
    fn apply(&self, request: RequestBuilder) -> RequestBuilder {
        match self {
            CloudflareAuth::Token(token) => request.bearer_auth(token),
            CloudflareAuth::GlobalKey { email, key } => request
                .header("X-Auth-Email", email)
                .header("X-Auth-Key", key),
        }
    }
}

// Custom Debug implementation that hides the credentials
impl std::fmt::Debug for CloudflareAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CloudflareAuth::Token(_) => f.debug_tuple("Token").field(&"<REDACTED>").finish(),
            CloudflareAuth::GlobalKey { email, .. } => f
                .debug_struct("GlobalKey")
                .field("email", email)
                .field("key", &"<REDACTED>")
                .finish(),
        }
    }
}

/// An existing A record as reported by the API
#[derive(Debug, Clone, PartialEq, Eq)]
struct ExistingRecord {
    id: String,
    content: String,
    ttl: u64,
}

/// Cloudflare DNS updater
///
/// Stateless between calls: the zone id and record id are looked up on
/// every upsert.
#[derive(Debug, Clone)]
pub struct CloudflareProvider {
    /// Credentials
    auth: CloudflareAuth,

    /// API base URL, without trailing slash
    api_base: String,

    /// HTTP client for API requests
    client: reqwest::Client,
}

impl CloudflareProvider {
    /// Create a provider talking to the public Cloudflare API
    pub fn new(auth: CloudflareAuth) -> Self {
        Self {
            auth,
            api_base: CLOUDFLARE_API_BASE.to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// Point the provider at a different API base URL
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    /// The API base URL in use
    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    /// Look up the zone id for `zone_name` (no trailing dot)
    ///
    /// ```http
    /// GET /zones?name=example.com
    /// ```
    async fn zone_id(&self, zone_name: &str) -> Result<String> {
        debug!("Looking up Cloudflare zone ID for {}", zone_name);

        let url = format!("{}/zones", self.api_base);
        let request = self.client.get(&url).query(&[("name", zone_name)]);
        let json = self.send(request, "Zone lookup").await?;

        let zones = result_array(&json)?;
        let zone = zones
            .first()
            .ok_or_else(|| Error::provider(PROVIDER, format!("Zone not found: {}", zone_name)))?;

        let zone_id = zone["id"].as_str().ok_or_else(|| {
            Error::provider(PROVIDER, "Invalid response format: zone.id is not a string")
        })?;

        debug!("Found zone ID: {}", zone_id);
        Ok(zone_id.to_string())
    }

    /// Look up the A record named `record_name` (no trailing dot)
    ///
    /// ```http
    /// GET /zones/:zone_id/dns_records?type=A&name=home.example.com
    /// ```
    async fn find_record(&self, zone_id: &str, record_name: &str) -> Result<Option<ExistingRecord>> {
        let url = format!("{}/zones/{}/dns_records", self.api_base, zone_id);
        let request = self
            .client
            .get(&url)
            .query(&[("type", "A"), ("name", record_name)]);
        let json = self.send(request, "Record lookup").await?;

        let Some(record) = result_array(&json)?.first() else {
            return Ok(None);
        };

        let id = record["id"].as_str().ok_or_else(|| {
            Error::provider(PROVIDER, "Invalid response format: record.id is not a string")
        })?;
        let content = record["content"].as_str().ok_or_else(|| {
            Error::provider(PROVIDER, "Invalid response format: record.content is not a string")
        })?;
        // "Automatic" TTL is reported as 1
        let ttl = record["ttl"].as_u64().unwrap_or(1);

        Ok(Some(ExistingRecord {
            id: id.to_string(),
            content: content.to_string(),
            ttl,
        }))
    }

    async fn create_record(&self, zone_id: &str, payload: &Value) -> Result<()> {
        let url = format!("{}/zones/{}/dns_records", self.api_base, zone_id);
        let request = self.client.post(&url).json(payload);
        self.send(request, "Record create").await?;
        Ok(())
    }

    async fn patch_record(&self, zone_id: &str, record_id: &str, payload: &Value) -> Result<()> {
        let url = format!(
            "{}/zones/{}/dns_records/{}",
            self.api_base, zone_id, record_id
        );
        let request = self.client.patch(&url).json(payload);
        self.send(request, "Record update").await?;
        Ok(())
    }

    /// Authenticate, send, and decode a Cloudflare API envelope
    async fn send(&self, request: RequestBuilder, action: &str) -> Result<Value> {
        let response = self
            .auth
            .apply(request)
            .header("Content-Type", "application/json")
            .send()
            .await
            .map_err(|e| Error::network(format!("Cloudflare request failed: {}", e)))?;

        let response = check_status(response, action).await?;

        let json: Value = response.json().await.map_err(|e| {
            Error::provider(PROVIDER, format!("Failed to parse response: {}", e))
        })?;

        if json["success"].as_bool() == Some(false) {
            return Err(Error::provider(
                PROVIDER,
                format!("{} rejected: {}", action, json["errors"]),
            ));
        }

        Ok(json)
    }

    async fn apply(&self, zone: &str, name: &str, ip: &str, ttl: Duration) -> Result<UpsertOutcome> {
        let zone_name = zone.trim_end_matches('.');
        let absolute = fqdn(name, zone);
        let record_name = absolute.trim_end_matches('.');
        let ttl_secs = ttl.as_secs();

        let zone_id = self.zone_id(zone_name).await?;

        match self.find_record(&zone_id, record_name).await? {
            None => {
                let payload = json!({
                    "type": "A",
                    "name": record_name,
                    "content": ip,
                    "ttl": ttl_secs,
                });
                self.create_record(&zone_id, &payload).await?;
                debug!("Created Cloudflare A record {} -> {}", record_name, ip);
                Ok(UpsertOutcome::Created)
            }
            Some(existing) if existing.content == ip && existing.ttl == ttl_secs => {
                debug!("Cloudflare A record {} already points to {}", record_name, ip);
                Ok(UpsertOutcome::Unchanged)
            }
            Some(existing) => {
                let payload = json!({"content": ip, "ttl": ttl_secs});
                self.patch_record(&zone_id, &existing.id, &payload).await?;
                debug!(
                    "Updated Cloudflare A record {} -> {} (was: {})",
                    record_name, ip, existing.content
                );
                Ok(UpsertOutcome::Updated)
            }
        }
    }
}

#[async_trait]
impl DnsUpdater for CloudflareProvider {
    async fn upsert(
        &self,
        cancel: &CancellationToken,
        zone: &str,
        name: &str,
        ip: &str,
        ttl: Duration,
    ) -> Result<UpsertOutcome> {
        validate_ipv4(ip)?;
        run_cancellable(cancel, self.apply(zone, name, ip, ttl)).await
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER
    }
}

/// Map non-success HTTP statuses to provider errors
async fn check_status(response: Response, action: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let error_text = response
        .text()
        .await
        .unwrap_or_else(|_| "Unable to read error response".to_string());

    let message = match status.as_u16() {
        401 | 403 => format!(
            "Authentication failed: invalid credentials or insufficient permissions. Status: {}",
            status
        ),
        404 => format!("{} failed: not found. Status: {}", action, status),
        409 => format!("Conflict: record is being updated by another process. Status: {}", status),
        429 => format!("Rate limit exceeded. Status: {}", status),
        500..=599 => format!("Cloudflare server error (transient): {} - {}", status, error_text),
        _ => format!("{} failed: {} - {}", action, status, error_text),
    };

    Err(Error::provider(PROVIDER, message))
}

fn result_array(json: &Value) -> Result<&Vec<Value>> {
    json["result"].as_array().ok_or_else(|| {
        Error::provider(PROVIDER, "Invalid response format: result is not an array")
    })
}

/// Factory for creating Cloudflare providers
///
/// An API token takes precedence; otherwise both email and global API key
/// must be set.
pub struct CloudflareFactory;

impl DnsUpdaterFactory for CloudflareFactory {
    fn create(&self, config: &ProviderConfig) -> Result<Box<dyn DnsUpdater>> {
        match config {
            ProviderConfig::Cloudflare {
                api_token,
                email,
                api_key,
            } => {
                let auth = if let Some(token) = non_blank(api_token) {
                    CloudflareAuth::Token(token.to_string())
                } else if let (Some(email), Some(key)) = (non_blank(email), non_blank(api_key)) {
                    CloudflareAuth::GlobalKey {
                        email: email.to_string(),
                        key: key.to_string(),
                    }
                } else {
                    return Err(Error::config(
                        "Cloudflare provider requires api_token (CF_API_TOKEN) \
                         or email and api_key (CF_EMAIL, CF_API_KEY)",
                    ));
                };

                Ok(Box::new(CloudflareProvider::new(auth)))
            }
            _ => Err(Error::config("Invalid config for Cloudflare provider")),
        }
    }
}

/// Register the Cloudflare provider with a registry
///
/// # Example
///
/// ```rust
/// use dns_updater_core::ProviderRegistry;
///
/// let mut registry = ProviderRegistry::new();
/// dns_updater_cloudflare::register(&mut registry);
/// assert!(registry.has_provider("cloudflare"));
/// ```
pub fn register(registry: &mut ProviderRegistry) {
    registry.register_provider(PROVIDER, Box::new(CloudflareFactory));
}
