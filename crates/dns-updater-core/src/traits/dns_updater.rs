// # DNS Updater Trait
//
// Defines the interface for upserting A records via provider APIs.
//
// ## Implementations
//
// - Cloudflare: `dns-updater-cloudflare` crate
// - AWS Route 53: `dns-updater-route53` crate
//
// ## Usage
//
// ```rust,ignore
// use dns_updater_core::DnsUpdater;
// use std::time::Duration;
//
// let provider = /* DnsUpdater implementation */;
// provider
//     .upsert(&cancel, "example.com.", "home", "198.51.100.7", Duration::from_secs(60))
//     .await?;
// ```

use async_trait::async_trait;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// What the provider reported about an upsert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// The record did not exist and was created
    Created,
    /// The record existed with a different value or TTL and was replaced
    Updated,
    /// The record already had this value and TTL, nothing was sent
    Unchanged,
    /// The provider applied the change without saying which of the above it was
    Upserted,
}

impl std::fmt::Display for UpsertOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            UpsertOutcome::Created => "created",
            UpsertOutcome::Updated => "updated",
            UpsertOutcome::Unchanged => "unchanged",
            UpsertOutcome::Upserted => "upserted",
        };
        f.write_str(label)
    }
}

/// Trait for DNS provider implementations
///
/// # Contract
///
/// - The IP value is validated as IPv4 before any network call
///   (`Error::Validation`).
/// - The zone may arrive with or without a trailing dot; implementations
///   normalize it with [`crate::target::normalize_zone`].
/// - Record names follow [`crate::target::fqdn`] /
///   [`crate::target::relative_name`].
/// - Upsert is idempotent: applying the same arguments twice succeeds and
///   leaves the provider state unchanged.
/// - No retries, no backoff, no background tasks. Return the error; the
///   poll loop runs the cycle again on its next tick.
/// - Credentials never appear in logs or `Debug` output.
#[async_trait]
pub trait DnsUpdater: Send + Sync {
    /// Create or update the A record `name` in `zone` to point at `ip`
    ///
    /// # Errors
    ///
    /// - `Error::Validation`: `ip` is not a valid IPv4 address
    /// - `Error::Provider`: the API rejected the request
    /// - `Error::Network`: transport failure
    /// - `Error::Cancelled`: `cancel` fired during the call
    async fn upsert(
        &self,
        cancel: &CancellationToken,
        zone: &str,
        name: &str,
        ip: &str,
        ttl: Duration,
    ) -> Result<UpsertOutcome, crate::Error>;

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}

/// Helper trait for constructing DNS updaters from configuration
pub trait DnsUpdaterFactory: Send + Sync {
    /// Create a DnsUpdater instance from configuration
    ///
    /// Missing credentials fail here with `Error::Config`, before any
    /// network call is made.
    fn create(
        &self,
        config: &crate::config::ProviderConfig,
    ) -> Result<Box<dyn DnsUpdater>, crate::Error>;
}
