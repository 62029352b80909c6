//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events via `tracing`)
//!     → metrics.rs (counters and gauges via the `metrics` facade)
//!
//! Consumers:
//!     → stdout subscriber installed by the binary
//!     → whatever recorder the host application installs
//! ```
//!
//! # Design Decisions
//! - Structured fields (provider, tx_id, endpoint) on every event
//! - Metrics are no-ops until a recorder is installed and recording is enabled

pub mod logging;
pub mod metrics;

pub use logging::init_logging;
