// # IP Resolver Trait
//
// Defines the interface for discovering the caller's public IPv4 address.
//
// ## Implementations
//
// - ipify JSON endpoint: `dns-updater-ipify` crate
//
// ## Usage
//
// ```rust,ignore
// use dns_updater_core::{CancellationToken, IpResolver};
//
// let resolver = /* IpResolver implementation */;
// let ip = resolver.fetch(&CancellationToken::new()).await?;
// ```

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

/// Trait for public IP resolver implementations
///
/// Implementations perform exactly one outbound request per call. They do
/// not retry and do not cache; the poll loop's next tick is the retry.
#[async_trait]
pub trait IpResolver: Send + Sync {
    /// Fetch the current public IPv4 address as text
    ///
    /// # Errors
    ///
    /// - `Error::Network`: connection failure
    /// - `Error::Protocol`: non-200 status or malformed body
    /// - `Error::Data`: body lacks the expected IP field
    /// - `Error::Cancelled`: `cancel` fired before the response arrived
    async fn fetch(&self, cancel: &CancellationToken) -> Result<String, crate::Error>;
}
