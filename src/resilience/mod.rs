//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Read request to node:
//!     → timeouts.rs (enforce per-request deadline)
//!     → On transient failure: retries.rs (retry with jittered backoff)
//!     → Exhausted: caller fails over to the next endpoint
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every node call has a deadline
//! - Only idempotent reads are retried; submissions go out exactly once

pub mod retries;
pub mod timeouts;

pub use retries::{retry_idempotent, RetryPolicy};
pub use timeouts::with_timeout;
