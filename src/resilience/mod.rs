//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Request to upstream:
//!     → timeouts.rs (one deadline around the whole fetch)
//!     → On expiry: FetchError::Timeout → 504
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every external call has a deadline
//! - No retries: the client decides whether to reload a page

pub mod timeouts;

pub use timeouts::{with_timeout, Elapsed};
