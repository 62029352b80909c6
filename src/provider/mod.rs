//! Wallet provider subsystem.
//!
//! # Data Flow
//! ```text
//! host application
//!     → manager.rs (registry, sessions, active provider)
//!     → client.rs (WalletClient: uniform surface per provider)
//!         → traits.rs (WalletProvider contract)
//!             → inkey.rs (embedded frame) / local.rs (in-process key)
//!         → signing::SigningReconciler
//!         → node::Submitter
//! ```
//!
//! # Security Constraints
//! - SDK handles and key material are private fields, never logged

pub mod client;
pub mod inkey;
pub mod local;
pub mod manager;
pub mod traits;
pub mod types;

pub use client::WalletClient;
pub use inkey::{InkeyAccount, InkeyFrame, InkeySignResponse, InkeyWallet};
pub use local::LocalWallet;
pub use manager::{ProviderSession, WalletManager};
pub use traits::WalletProvider;
pub use types::{ProviderId, ProviderMetadata, SigningResult, Wallet, WalletAccount};
