//! # Route 53 DNS Provider
//!
//! Upserts A records in an AWS Route 53 hosted zone.
//!
//! ## Flow
//!
//! 1. `ListHostedZonesByName` starting at the zone name; the first zone
//!    whose name matches exactly is used.
//! 2. One `ChangeResourceRecordSets` call carrying a single `UPSERT`.
//!
//! `UPSERT` is idempotent on the Route 53 side, so the provider reports
//! [`UpsertOutcome::Upserted`] and never inspects the existing record.
//!
//! ## Credentials
//!
//! Access key id, secret access key and region all come from the record's
//! configuration (or the `AWS_*` environment fallbacks applied by the
//! daemon). The SDK's own profile and IMDS chain is not consulted.
//!
//! The SDK calls sit behind [`RecordSetApi`] so the upsert logic can be
//! tested without AWS.

use async_trait::async_trait;
use aws_sdk_route53::config::{BehaviorVersion, Credentials, Region};
use aws_sdk_route53::error::{DisplayErrorContext, SdkError};
use aws_sdk_route53::types::{
    Change, ChangeAction, ChangeBatch, ResourceRecord, ResourceRecordSet, RrType,
};
use dns_updater_core::cancel::run_cancellable;
use dns_updater_core::config::{ProviderConfig, non_blank};
use dns_updater_core::registry::ProviderRegistry;
use dns_updater_core::target::{fqdn, normalize_zone, validate_ipv4};
use dns_updater_core::traits::{DnsUpdater, DnsUpdaterFactory, UpsertOutcome};
use dns_updater_core::{Error, Result};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::debug;

const PROVIDER: &str = "route53";

/// Prefix Route 53 puts in front of hosted zone ids
const HOSTED_ZONE_PREFIX: &str = "/hostedzone/";

/// The two Route 53 operations the provider needs
#[async_trait]
pub trait RecordSetApi: Send + Sync {
    /// Id of the hosted zone named exactly `zone` (trailing dot included)
    async fn hosted_zone_id(&self, zone: &str) -> Result<String>;

    /// Send a single `UPSERT` of an A record
    async fn upsert_a(&self, zone_id: &str, fqdn: &str, ip: &str, ttl_secs: i64) -> Result<()>;
}

/// [`RecordSetApi`] backed by the AWS SDK
#[derive(Debug, Clone)]
pub struct SdkRecordSetApi {
    client: aws_sdk_route53::Client,
}

impl SdkRecordSetApi {
    /// Build an SDK client from static credentials
    pub fn new(access_key_id: &str, secret_access_key: &str, region: &str) -> Self {
        let credentials = Credentials::new(
            access_key_id,
            secret_access_key,
            None,
            None,
            "dns-updater",
        );
        let config = aws_sdk_route53::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(region.to_string()))
            .credentials_provider(credentials)
            .build();

        Self {
            client: aws_sdk_route53::Client::from_conf(config),
        }
    }
}

#[async_trait]
impl RecordSetApi for SdkRecordSetApi {
    async fn hosted_zone_id(&self, zone: &str) -> Result<String> {
        let output = self
            .client
            .list_hosted_zones_by_name()
            .dns_name(zone)
            .send()
            .await
            .map_err(|e| map_sdk_error("ListHostedZonesByName", e))?;

        let hosted = output
            .hosted_zones()
            .iter()
            .find(|z| z.name().eq_ignore_ascii_case(zone))
            .ok_or_else(|| Error::provider(PROVIDER, format!("Hosted zone not found: {}", zone)))?;

        Ok(strip_zone_prefix(hosted.id()).to_string())
    }

    async fn upsert_a(&self, zone_id: &str, fqdn: &str, ip: &str, ttl_secs: i64) -> Result<()> {
        let record_set = ResourceRecordSet::builder()
            .r#type(RrType::A)
            .name(fqdn)
            .resource_records(ResourceRecord::builder().value(ip).build().map_err(build_error)?)
            .ttl(ttl_secs)
            .build()
            .map_err(build_error)?;

        let change = Change::builder()
            .action(ChangeAction::Upsert)
            .resource_record_set(record_set)
            .build()
            .map_err(build_error)?;

        let batch = ChangeBatch::builder()
            .comment("dns-updater")
            .changes(change)
            .build()
            .map_err(build_error)?;

        let output = self
            .client
            .change_resource_record_sets()
            .hosted_zone_id(zone_id)
            .change_batch(batch)
            .send()
            .await
            .map_err(|e| map_sdk_error("ChangeResourceRecordSets", e))?;

        if let Some(info) = output.change_info() {
            debug!("Route 53 change {} is {:?}", info.id(), info.status());
        }
        Ok(())
    }
}

/// Route 53 DNS updater
pub struct Route53Provider {
    api: Box<dyn RecordSetApi>,
}

impl Route53Provider {
    /// Provider using the AWS SDK with static credentials
    pub fn new(access_key_id: &str, secret_access_key: &str, region: &str) -> Self {
        Self::with_api(SdkRecordSetApi::new(
            access_key_id,
            secret_access_key,
            region,
        ))
    }

    /// Provider over any [`RecordSetApi`]
    pub fn with_api(api: impl RecordSetApi + 'static) -> Self {
        Self { api: Box::new(api) }
    }

    async fn apply(&self, zone: &str, name: &str, ip: &str, ttl: Duration) -> Result<UpsertOutcome> {
        let zone = normalize_zone(zone);
        let record_name = fqdn(name, &zone);
        let ttl_secs = i64::try_from(ttl.as_secs())
            .map_err(|_| Error::validation(format!("TTL out of range: {:?}", ttl)))?;

        let zone_id = self.api.hosted_zone_id(&zone).await?;
        debug!("Resolved hosted zone {} to {}", zone, zone_id);

        self.api
            .upsert_a(&zone_id, &record_name, ip, ttl_secs)
            .await?;

        debug!("Upserted Route 53 A record {} -> {}", record_name, ip);
        Ok(UpsertOutcome::Upserted)
    }
}

// Credentials live inside the SDK client; nothing here is secret
impl std::fmt::Debug for Route53Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Route53Provider").finish_non_exhaustive()
    }
}

#[async_trait]
impl DnsUpdater for Route53Provider {
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

/// Transport failures are network errors; everything else is the API
/// saying no
fn map_sdk_error<E, R>(operation: &str, err: SdkError<E, R>) -> Error
where
    E: std::error::Error + 'static,
    R: std::fmt::Debug,
{
    let detail = DisplayErrorContext(&err).to_string();
    match err {
        SdkError::DispatchFailure(_) | SdkError::TimeoutError(_) => {
            Error::network(format!("Route 53 {} failed: {}", operation, detail))
        }
        _ => Error::provider(PROVIDER, format!("{} failed: {}", operation, detail)),
    }
}

fn build_error(err: aws_sdk_route53::error::BuildError) -> Error {
    Error::provider(PROVIDER, format!("Invalid change request: {}", err))
}

fn strip_zone_prefix(id: &str) -> &str {
    id.strip_prefix(HOSTED_ZONE_PREFIX).unwrap_or(id)
}

/// Factory for creating Route 53 providers
///
/// Access key id, secret access key and region are all required.
pub struct Route53Factory;

impl DnsUpdaterFactory for Route53Factory {
    fn create(&self, config: &ProviderConfig) -> Result<Box<dyn DnsUpdater>> {
        match config {
            ProviderConfig::Route53 {
                access_key_id,
                secret_access_key,
                region,
            } => {
                let (Some(access_key_id), Some(secret_access_key), Some(region)) = (
                    non_blank(access_key_id),
                    non_blank(secret_access_key),
                    non_blank(region),
                ) else {
                    return Err(Error::config(
                        "Route 53 provider requires access_key_id, secret_access_key and region \
                         (AWS_ACCESS_KEY_ID, AWS_SECRET_ACCESS_KEY, AWS_REGION)",
                    ));
                };

                Ok(Box::new(Route53Provider::new(
                    access_key_id,
                    secret_access_key,
                    region,
                )))
            }
            _ => Err(Error::config("Invalid config for Route 53 provider")),
        }
    }
}

/// Register the Route 53 provider with a registry
pub fn register(registry: &mut ProviderRegistry) {
    registry.register_provider(PROVIDER, Box::new(Route53Factory));
}
