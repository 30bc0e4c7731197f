//! Timeout enforcement.
//!
//! # Responsibilities
//! - Wrap the whole upstream fetch (connect, headers, body) in one deadline
//! - Cancel the in-flight operation cleanly on expiry
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities
//! - Timeout errors are distinct from other errors
//! - Timed-out fetches return 504 Gateway Timeout

use std::future::Future;
use std::time::Duration;

use thiserror::Error;

/// The wrapped operation did not finish within its deadline.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("operation timed out after {0:?}")]
pub struct Elapsed(pub Duration);

/// Run `future` to completion or fail once `limit` has passed.
pub async fn with_timeout<F>(limit: Duration, future: F) -> Result<F::Output, Elapsed>
where
    F: Future,
{
    tokio::time::timeout(limit, future)
        .await
        .map_err(|_| Elapsed(limit))
}
