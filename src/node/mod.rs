//! Ledger node integration subsystem.
//!
//! # Data Flow
//! ```text
//! signed batch
//!     → submit.rs (broadcast once, then poll round by round)
//!     → client.rs (NodeClient trait; AlgodClient over HTTP with timeouts,
//!                  read retries and endpoint failover)
//!     → ConfirmedTransaction
//! ```
//!
//! # Constraints
//! - Every node call has a deadline
//! - Submissions are never retried or sent to a second endpoint
//! - The API token is never logged

pub mod client;
pub mod submit;
pub mod types;

pub use client::{AlgodClient, NodeClient};
pub use submit::{ConfirmationPolicy, Submitter};
pub use types::{
    AccountInfo, AssetHolding, ConfirmedTransaction, HealthRecord, NodeError, NodeResult,
    NodeStatus, PendingTransaction,
};
