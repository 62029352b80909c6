//! Wallet bridge: one interface over several wallet providers, plus the
//! transaction plumbing to sign and submit to an algod node.
//!
//! # Architecture Overview
//!
//! ```text
//!   encoded batch ──▶ transaction ──▶ signing::SigningReconciler ──▶ provider::WalletProvider
//!   (bytes/base64)    decode/group      partition / re-merge          (inkey, local, ...)
//!                                              │
//!                                              ▼
//!                                       node::Submitter ──▶ node::NodeClient (AlgodClient)
//!                                       send + confirm         HTTP, timeouts, failover
//!
//!   Cross-cutting: config · observability · resilience
//! ```

// Core subsystems
pub mod node;
pub mod provider;
pub mod signing;
pub mod transaction;

// Cross-cutting concerns
pub mod config;
pub mod error;
pub mod observability;
pub mod resilience;

pub use config::BridgeConfig;
pub use error::{WalletError, WalletResult};
pub use node::{AlgodClient, ConfirmationPolicy, NodeClient, Submitter};
pub use provider::{WalletClient, WalletManager, WalletProvider};
pub use signing::SigningReconciler;
