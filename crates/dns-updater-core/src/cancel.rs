//! Cancellation helper shared by every suspending call
//!
//! Resolvers, stores and providers all receive the poll loop's
//! [`CancellationToken`]. Wrapping their I/O in [`run_cancellable`] makes a
//! shutdown abort the in-flight request instead of waiting for it.

use crate::error::{Error, Result};
use std::future::Future;
use tokio_util::sync::CancellationToken;

/// Run `fut` until it completes or `cancel` fires, whichever comes first
///
/// An already-cancelled token never polls `fut`.
pub async fn run_cancellable<F, T>(cancel: &CancellationToken, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(Error::Cancelled),
        result = fut => result,
    }
}
