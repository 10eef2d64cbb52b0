//! Record identity and DNS name normalization
//!
//! A [`RecordTarget`] names what one update cycle keeps in sync. The free
//! functions below implement the naming rules every provider shares:
//!
//! ```text
//! zone "example.com"     -> "example.com."
//! name ""   or "@"       -> zone apex
//! name "foo.example.com" -> used as-is (already inside the zone)
//! name "foo"             -> "foo.example.com."
//! ```

use crate::error::{Error, Result};
use std::net::Ipv4Addr;
use std::time::Duration;

/// Marker for the zone apex in zone-relative names
pub const APEX: &str = "@";

/// Identity of one record kept in sync by an update cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordTarget {
    zone: String,
    name: String,
    ttl: Duration,
}

impl RecordTarget {
    /// Create a target for `name` inside `zone`
    ///
    /// The zone is normalized to end with a trailing dot. Fails with a
    /// configuration error if the zone is empty or the TTL is zero.
    pub fn new(zone: impl AsRef<str>, name: impl Into<String>, ttl: Duration) -> Result<Self> {
        let zone = zone.as_ref().trim();
        if zone.trim_end_matches('.').is_empty() {
            return Err(Error::config("Record zone cannot be empty"));
        }
        if ttl.is_zero() {
            return Err(Error::config("Record TTL must be positive"));
        }

        Ok(Self {
            zone: normalize_zone(zone),
            name: name.into(),
            ttl,
        })
    }

    /// Create a target whose zone is the record name minus its first label
    ///
    /// `foo.example.com` lives in `example.com`. Names with fewer than three
    /// labels are rejected because the zone would be a bare TLD or empty.
    pub fn from_record_name(name: impl Into<String>, ttl: Duration) -> Result<Self> {
        let name = name.into();
        let zone = zone_of(&name)?;
        Self::new(zone, name, ttl)
    }

    /// Zone, always ending with a trailing dot
    pub fn zone(&self) -> &str {
        &self.zone
    }

    /// Record name as configured
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Time-to-live advertised for the record
    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

/// Derive the zone of a record name by dropping its first DNS label
pub fn zone_of(record_name: &str) -> Result<String> {
    let trimmed = record_name.trim_end_matches('.');
    let labels: Vec<&str> = trimmed.split('.').collect();
    if labels.len() < 3 || labels.iter().any(|label| label.is_empty()) {
        return Err(Error::config(format!(
            "record name '{}' must have at least 3 DNS labels (e.g. host.domain.tld)",
            record_name
        )));
    }
    Ok(labels[1..].join("."))
}

/// Ensure the zone name ends with a trailing dot
pub fn normalize_zone(zone: &str) -> String {
    if zone.ends_with('.') {
        zone.to_string()
    } else {
        format!("{}.", zone)
    }
}

/// True if `name` denotes the zone apex
pub fn is_apex(name: &str) -> bool {
    name.is_empty() || name == APEX
}

/// Fully-qualified record name, with trailing dot
///
/// Names already inside the zone are kept; anything else gets the zone
/// appended. The suffix check respects label boundaries, so
/// `badexample.com` is not treated as part of `example.com`.
pub fn fqdn(name: &str, zone: &str) -> String {
    let zone = normalize_zone(zone);
    if is_apex(name) {
        return zone;
    }

    let bare_zone = zone.trim_end_matches('.');
    let bare_name = name.trim_end_matches('.');
    if in_zone(bare_name, bare_zone) {
        return format!("{}.", bare_name);
    }

    format!("{}.{}", bare_name, zone)
}

/// Record name relative to the zone, `@` for the apex
pub fn relative_name(name: &str, zone: &str) -> String {
    let zone = normalize_zone(zone);
    let absolute = fqdn(name, &zone);
    if absolute.eq_ignore_ascii_case(&zone) {
        return APEX.to_string();
    }

    let suffix_len = zone.len() + 1;
    absolute[..absolute.len() - suffix_len].to_string()
}

/// Validate that `ip` is a textual IPv4 address
pub fn validate_ipv4(ip: &str) -> Result<Ipv4Addr> {
    ip.parse::<Ipv4Addr>()
        .map_err(|_| Error::validation(format!("invalid IPv4 address: {:?}", ip)))
}

fn in_zone(bare_name: &str, bare_zone: &str) -> bool {
    if bare_name.eq_ignore_ascii_case(bare_zone) {
        return true;
    }
    let name = bare_name.to_ascii_lowercase();
    let zone = bare_zone.to_ascii_lowercase();
    name.ends_with(&format!(".{}", zone))
}
