//! Bounded-attempt retry helper
//!
//! Every page fetch in this pipeline is allowed a small, fixed number of
//! attempts and nothing more: no exponential backoff, no jitter. The upstream
//! API is rate-limited but reliable, and the operator is expected to diagnose
//! and re-run on persistent failure rather than have the pipeline wait it out.
//! Completed artifacts survive on disk, so a re-run is cheap.

use crate::error::{Error, Result};
use std::future::Future;

/// Default number of attempts per page fetch.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 2;

/// Execute an async operation with a fixed attempt bound.
///
/// The operation is invoked up to `max_attempts` times. Only errors for which
/// [`Error::is_retryable`] returns true are absorbed; any other error returns
/// immediately. When the last allowed attempt also fails with a transient
/// error, it is promoted to [`Error::RetryExhausted`] so callers see the final
/// URL and status rather than a single-attempt failure.
///
/// # Example
///
/// ```no_run
/// use spotify_etl::retry::{attempt, DEFAULT_MAX_ATTEMPTS};
/// use spotify_etl::error::Error;
///
/// # async fn example() -> Result<(), Error> {
/// let page = attempt(DEFAULT_MAX_ATTEMPTS, || async {
///     // one GET against the API
///     Ok::<_, Error>("page body")
/// })
/// .await?;
/// # Ok(())
/// # }
/// ```
pub async fn attempt<F, Fut, T>(max_attempts: u32, mut operation: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    debug_assert!(max_attempts > 0, "attempt bound must be at least 1");

    let mut tries = 0;
    loop {
        match operation().await {
            Ok(result) => {
                if tries > 0 {
                    tracing::info!(attempts = tries + 1, "operation succeeded after retry");
                }
                return Ok(result);
            }
            Err(e) if e.is_retryable() && tries + 1 < max_attempts => {
                tries += 1;
                tracing::warn!(
                    error = %e,
                    attempt = tries,
                    max_attempts,
                    "attempt failed, retrying"
                );
            }
            Err(Error::Transient { url, status }) => {
                // Last allowed attempt also failed: promote to the terminal error.
                tracing::error!(%url, status, attempts = tries + 1, "all attempts exhausted");
                return Err(Error::RetryExhausted {
                    url,
                    status,
                    attempts: tries + 1,
                });
            }
            Err(e) => {
                tracing::error!(error = %e, "operation failed with non-retryable error");
                return Err(e);
            }
        }
    }
}
