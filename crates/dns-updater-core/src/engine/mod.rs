//! Update cycle and poll loop
//!
//! The UpdateCycle is responsible for:
//! - Fetching the current public IP via IpResolver
//! - Comparing it with the last applied value from LastKnownStore
//! - Upserting the record via DnsUpdater when it changed
//! - Persisting the new value after a successful upsert
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐
//! │  PollLoop   │─── tick ───┐
//! └─────────────┘            │
//!                            ▼
//!                   ┌──────────────┐
//!                   │ UpdateCycle  │
//!                   └──────────────┘
//!                            │
//!         ┌──────────────────┼──────────────────┐
//!         │                  │                  │
//!         ▼                  ▼                  ▼
//! ┌─────────────┐   ┌────────────────┐   ┌─────────────┐
//! │ IpResolver  │   │ LastKnownStore │   │ DnsUpdater  │
//! │ (fetch)     │   │ (read/write)   │   │ (upsert)    │
//! └─────────────┘   └────────────────┘   └─────────────┘
//! ```
//!
//! ## Cycle
//!
//! ```text
//! Start → FetchIP → CompareIP → {Unchanged: Done | Changed: Upsert → Persist → Done}
//! ```
//!
//! The store is written strictly after the upsert succeeded, so the cache
//! never claims a value was applied when it was not. A failed persist leaves
//! the cache stale; the next cycle then re-upserts the same value, which is
//! harmless because upserts are idempotent.

mod poll;

pub use poll::PollLoop;

use crate::error::Result;
use crate::target::RecordTarget;
use crate::traits::{DnsUpdater, IpResolver, LastKnownStore, UpsertOutcome};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Result of one successful update cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Stored value equals the fetched IP; nothing was sent
    Unchanged {
        /// The current IP
        ip: String,
    },

    /// The record was upserted and the new value persisted
    Changed {
        /// Previously stored value (`None` on first run)
        previous: Option<String>,
        /// The IP now applied
        current: String,
        /// What the provider reported
        upsert: UpsertOutcome,
    },
}

/// One fetch → compare → upsert → persist pass for a single record
///
/// Holds no state between invocations; every call starts from the top, so a
/// cycle interrupted at any point can simply be run again.
pub struct UpdateCycle {
    /// Public IP resolver (shared across records)
    resolver: Arc<dyn IpResolver>,

    /// DNS provider for this record
    updater: Box<dyn DnsUpdater>,

    /// Last applied value for this record
    store: Box<dyn LastKnownStore>,

    /// What to keep in sync
    target: RecordTarget,
}

impl UpdateCycle {
    /// Create a new update cycle
    pub fn new(
        resolver: Arc<dyn IpResolver>,
        updater: Box<dyn DnsUpdater>,
        store: Box<dyn LastKnownStore>,
        target: RecordTarget,
    ) -> Self {
        Self {
            resolver,
            updater,
            store,
            target,
        }
    }

    /// The record this cycle keeps in sync
    pub fn target(&self) -> &RecordTarget {
        &self.target
    }

    /// Run the cycle once
    ///
    /// Errors from any step are returned unchanged in kind. On error, no
    /// later step has run.
    pub async fn run_once(&self, cancel: &CancellationToken) -> Result<CycleOutcome> {
        let current = self.resolver.fetch(cancel).await?;
        debug!("Public IP for {}: {}", self.target.name(), current);

        let previous = self.store.read(cancel).await?;
        if previous == current {
            debug!("IP unchanged for {}; skipping DNS update", self.target.name());
            return Ok(CycleOutcome::Unchanged { ip: current });
        }

        let upsert = self
            .updater
            .upsert(
                cancel,
                self.target.zone(),
                self.target.name(),
                &current,
                self.target.ttl(),
            )
            .await?;

        self.store.write(cancel, &current).await?;

        let previous = (!previous.is_empty()).then_some(previous);
        info!(
            "Updated {} via {}: {} -> {} ({})",
            self.target.name(),
            self.updater.provider_name(),
            previous.as_deref().unwrap_or("<none>"),
            current,
            upsert
        );

        Ok(CycleOutcome::Changed {
            previous,
            current,
            upsert,
        })
    }
}
