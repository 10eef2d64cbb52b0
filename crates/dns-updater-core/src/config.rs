//! Configuration types for the updater
//!
//! The daemon loads one YAML document into [`UpdaterConfig`]. Global
//! settings apply to every record; each record carries its own provider
//! selector and credentials.
//!
//! ```yaml
//! update_interval_secs: 120
//! storage_path: /var/lib/dns-updater
//! records:
//!   home.example.com:
//!     provider: cloudflare
//!     api_token: "..."
//!   vpn.example.org:
//!     provider: route53
//!     zone: example.org
//!     ttl_secs: 300
//!     access_key_id: "..."
//!     secret_access_key: "..."
//!     region: us-east-1
//! ```
//!
//! Older files spelling durations as strings (`update_interval: 5m`,
//! `ttl: 300s`) and prefixing credentials (`cf_api_token`,
//! `aws_access_key_id`, `aws_secret_key`, `aws_region`) load unchanged.
//! Provider names match case-insensitively for the usual spellings.

use crate::error::{Error, Result};
use crate::target::RecordTarget;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main updater configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdaterConfig {
    /// Seconds between update cycles
    #[serde(
        default = "default_update_interval_secs",
        alias = "update_interval",
        deserialize_with = "seconds"
    )]
    pub update_interval_secs: u64,

    /// Directory holding one last-known-value file per record
    #[serde(default = "default_storage_path")]
    pub storage_path: PathBuf,

    /// Override for the public IP endpoint (ipify JSON format)
    #[serde(default)]
    pub ip_endpoint: Option<String>,

    /// Records to keep in sync, keyed by record name
    #[serde(default)]
    pub records: BTreeMap<String, RecordConfig>,
}

impl UpdaterConfig {
    /// Parse a YAML document
    pub fn from_yaml(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Read and parse a YAML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!(
                "Failed to read configuration file {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_yaml(&content)
    }

    /// Validate the configuration
    ///
    /// Provider credentials are checked later, by the provider factories.
    pub fn validate(&self) -> Result<()> {
        if self.records.is_empty() {
            return Err(Error::config("No DNS records configured"));
        }
        if self.update_interval_secs == 0 {
            return Err(Error::config("update_interval_secs must be > 0"));
        }
        if self.storage_path.as_os_str().is_empty() {
            return Err(Error::config("storage_path cannot be empty"));
        }
        for (name, record) in &self.records {
            if name.trim().is_empty() {
                return Err(Error::config("Record name cannot be empty"));
            }
            if record.ttl_secs == 0 {
                return Err(Error::config(format!("Record {}: ttl_secs must be > 0", name)));
            }
        }
        Ok(())
    }

    /// Interval between update cycles
    pub fn update_interval(&self) -> Duration {
        Duration::from_secs(self.update_interval_secs)
    }

    /// Fill blank credentials of every record from `lookup`
    pub fn fill_credentials_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        for record in self.records.values_mut() {
            record.provider.fill_from(&lookup);
        }
    }
}

/// Per-record configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordConfig {
    /// Zone the record lives in; derived from the record name when absent
    #[serde(default)]
    pub zone: Option<String>,

    /// Time-to-live in seconds
    #[serde(default = "default_ttl_secs", alias = "ttl", deserialize_with = "seconds")]
    pub ttl_secs: u64,

    /// Provider selector and credentials
    #[serde(flatten)]
    pub provider: ProviderConfig,
}

impl RecordConfig {
    /// Build the record target for `name`
    pub fn target(&self, name: &str) -> Result<RecordTarget> {
        let ttl = Duration::from_secs(self.ttl_secs);
        match &self.zone {
            Some(zone) => RecordTarget::new(zone, name, ttl),
            None => RecordTarget::from_record_name(name, ttl),
        }
    }
}

/// DNS provider configuration
///
/// The `provider` key selects the variant; [`ProviderConfig::type_name`]
/// is the key the provider registry looks factories up by.
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "provider", rename_all = "lowercase")]
pub enum ProviderConfig {
    /// Cloudflare API v4
    #[serde(alias = "Cloudflare", alias = "CloudFlare", alias = "CLOUDFLARE")]
    Cloudflare {
        /// Scoped API token (preferred)
        #[serde(default, alias = "cf_api_token")]
        api_token: Option<String>,
        /// Account email for legacy global-key auth
        #[serde(default, alias = "cf_email")]
        email: Option<String>,
        /// Legacy global API key
        #[serde(default, alias = "cf_api_key")]
        api_key: Option<String>,
    },

    /// AWS Route 53
    #[serde(alias = "Route53", alias = "ROUTE53")]
    Route53 {
        /// AWS access key id
        #[serde(default, alias = "aws_access_key_id")]
        access_key_id: Option<String>,
        /// AWS secret access key
        #[serde(default, alias = "aws_secret_key")]
        secret_access_key: Option<String>,
        /// AWS region used for request signing
        #[serde(default, alias = "aws_region")]
        region: Option<String>,
    },
}

impl ProviderConfig {
    /// Get the provider type name
    pub fn type_name(&self) -> &'static str {
        match self {
            ProviderConfig::Cloudflare { .. } => "cloudflare",
            ProviderConfig::Route53 { .. } => "route53",
        }
    }

    /// Fill blank credential fields from environment-style variables
    ///
    /// Cloudflare reads `CF_API_TOKEN`, `CF_EMAIL`, `CF_API_KEY`; Route 53
    /// reads `AWS_ACCESS_KEY_ID`, `AWS_SECRET_ACCESS_KEY`, `AWS_REGION`.
    pub fn fill_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        match self {
            ProviderConfig::Cloudflare {
                api_token,
                email,
                api_key,
            } => {
                fill(api_token, "CF_API_TOKEN", &lookup);
                fill(email, "CF_EMAIL", &lookup);
                fill(api_key, "CF_API_KEY", &lookup);
            }
            ProviderConfig::Route53 {
                access_key_id,
                secret_access_key,
                region,
            } => {
                fill(access_key_id, "AWS_ACCESS_KEY_ID", &lookup);
                fill(secret_access_key, "AWS_SECRET_ACCESS_KEY", &lookup);
                fill(region, "AWS_REGION", &lookup);
            }
        }
    }
}

// Credentials must never reach logs
impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        fn redact(value: &Option<String>) -> &'static str {
            match value {
                Some(v) if !v.is_empty() => "<REDACTED>",
                _ => "<unset>",
            }
        }

        match self {
            ProviderConfig::Cloudflare {
                api_token,
                email,
                api_key,
            } => f
                .debug_struct("Cloudflare")
                .field("api_token", &redact(api_token))
                .field("email", email)
                .field("api_key", &redact(api_key))
                .finish(),
            ProviderConfig::Route53 {
                access_key_id,
                secret_access_key,
                region,
            } => f
                .debug_struct("Route53")
                .field("access_key_id", &redact(access_key_id))
                .field("secret_access_key", &redact(secret_access_key))
                .field("region", region)
                .finish(),
        }
    }
}

/// Return the value if it is present and not blank
pub fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn fill<F>(slot: &mut Option<String>, var: &str, lookup: &F)
where
    F: Fn(&str) -> Option<String>,
{
    if non_blank(slot).is_none()
        && let Some(value) = lookup(var).filter(|v| !v.trim().is_empty())
    {
        *slot = Some(value);
    }
}

/// Whole seconds, given either as an integer or as a duration string
/// such as `90s`, `5m` or `1h30m`
fn seconds<'de, D>(deserializer: D) -> std::result::Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Seconds {
        Count(u64),
        Text(String),
    }

    match Seconds::deserialize(deserializer)? {
        Seconds::Count(secs) => Ok(secs),
        Seconds::Text(text) => {
            let duration =
                humantime::parse_duration(text.trim()).map_err(serde::de::Error::custom)?;
            if duration.subsec_nanos() != 0 {
                return Err(serde::de::Error::custom(format!(
                    "duration {} is not a whole number of seconds",
                    text
                )));
            }
            Ok(duration.as_secs())
        }
    }
}

fn default_update_interval_secs() -> u64 {
    120
}

fn default_storage_path() -> PathBuf {
    PathBuf::from("/tmp/dns-updater")
}

fn default_ttl_secs() -> u64 {
    60
}
