// # Last-Known-Value Store Trait
//
// Persists the IP value most recently applied at the provider for one
// record target. The update cycle reads it to decide whether anything
// changed and writes it only after a successful upsert.
//
// ## Implementations
//
// - File-based: one file per record, raw IP text
// - Memory: shared in-process slot

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

/// Trait for last-known-value store implementations
///
/// "Never written" is not an error: `read` returns an empty string, which
/// the update cycle treats as "always changed". Only genuine I/O failures
/// surface as `Error::Storage`.
#[async_trait]
pub trait LastKnownStore: Send + Sync {
    /// Read the last applied value, or `""` if none was ever written
    async fn read(&self, cancel: &CancellationToken) -> Result<String, crate::Error>;

    /// Replace the stored value
    ///
    /// A single write is atomic; there is no other transactionality.
    async fn write(&self, cancel: &CancellationToken, ip: &str) -> Result<(), crate::Error>;
}
