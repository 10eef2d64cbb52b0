// # dns-updater-core
//
// Core library for the polling dynamic-DNS updater.
//
// ## Architecture Overview
//
// - **IpResolver**: Trait for discovering the current public IPv4 address
// - **DnsUpdater**: Trait for upserting A records via provider APIs
// - **LastKnownStore**: Trait for the persisted last-applied value of one record
// - **UpdateCycle**: One fetch → compare → upsert → persist pass
// - **PollLoop**: Drives an UpdateCycle on a fixed interval until cancelled
// - **ProviderRegistry**: String-keyed factories for DNS providers
//
// ## Design Principles
//
// 1. **Separation of Concerns**: Orchestration lives here, integrations live in plugin crates
// 2. **Cancellable**: Every suspending call takes the same `CancellationToken`
// 3. **Plugin-Based**: Providers are selected by configuration string, no hard-coded if-else
// 4. **Library-First**: The daemon is a thin wiring layer over this crate
// 5. **Ordering**: The cache is written only after the provider accepted the change

pub mod cancel;
pub mod config;
pub mod engine;
pub mod error;
pub mod registry;
pub mod state;
pub mod target;
pub mod traits;

// Re-export core types for convenience
pub use config::{ProviderConfig, RecordConfig, UpdaterConfig};
pub use engine::{CycleOutcome, PollLoop, UpdateCycle};
pub use error::{Error, Result};
pub use registry::ProviderRegistry;
pub use state::{FileStore, MemoryStore};
pub use target::RecordTarget;
pub use traits::{DnsUpdater, IpResolver, LastKnownStore, UpsertOutcome};

pub use tokio_util::sync::CancellationToken;
