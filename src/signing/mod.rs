//! Signing subsystem.
//!
//! # Data Flow
//! ```text
//! connected accounts + ordered batch
//!     → reconciler.rs (decode, select, one provider call, re-merge)
//!     → keepalive.rs (optional host hook around the remote call)
//! ```

pub mod keepalive;
pub mod reconciler;

pub use keepalive::SessionKeepAlive;
pub use reconciler::SigningReconciler;
