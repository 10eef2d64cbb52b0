//! Core traits for the updater
//!
//! This module defines the abstract interfaces that all implementations must follow.
//!
//! - [`IpResolver`]: Discover the current public IP
//! - [`DnsUpdater`]: Upsert A records via provider APIs
//! - [`LastKnownStore`]: Persist the last applied value of one record

pub mod dns_updater;
pub mod ip_resolver;
pub mod store;

pub use dns_updater::{DnsUpdater, DnsUpdaterFactory, UpsertOutcome};
pub use ip_resolver::IpResolver;
pub use store::LastKnownStore;
