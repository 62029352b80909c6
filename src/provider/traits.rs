//! The capability contract every wallet integration implements.

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::WalletResult;
use crate::provider::types::{ProviderMetadata, SigningResult, Wallet, WalletAccount};

/// A remote signer behind one wallet SDK.
///
/// Implementations keep their SDK handle private; callers only reach it
/// through these methods.
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Static provider description.
    fn metadata(&self) -> &ProviderMetadata;

    /// Open a session and list the authorized accounts, in provider order.
    async fn connect(&self) -> WalletResult<Vec<WalletAccount>>;

    /// Restore a previous session. Returns `None`, without side effects,
    /// when there is nothing to restore.
    async fn reconnect(&self) -> WalletResult<Option<Wallet>>;

    /// Close the session.
    async fn disconnect(&self) -> WalletResult<()>;

    /// Sign an ordered batch of unsigned transactions in one remote call.
    async fn sign(&self, transactions: &[Bytes]) -> WalletResult<SigningResult>;

    /// Whether one `sign` call may cover several distinct senders.
    fn supports_multi_sender_batches(&self) -> bool {
        true
    }
}
