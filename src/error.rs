//! Error taxonomy shared by the decoder, reconciler, providers and submitter.

use thiserror::Error;

use crate::config::ConfigError;
use crate::node::types::NodeError;
use crate::provider::types::ProviderId;
use crate::transaction::address::AddressError;

/// Errors surfaced to callers of the wallet bridge.
#[derive(Debug, Error)]
pub enum WalletError {
    /// Input bytes are not a valid encoded transaction. Fatal, never retried.
    #[error("Malformed transaction: {0}")]
    MalformedTransaction(String),

    /// The provider rejected the batch or returned an inconsistent result.
    /// The batch is left untouched and the caller may retry.
    #[error("Signing failed: {0}")]
    SigningFailed(String),

    /// The provider reported zero accounts on connect.
    #[error("No accounts found for {0}")]
    NoAccountsFound(ProviderId),

    /// The node refused the raw batch.
    #[error("Submission rejected: {0}")]
    SubmissionRejected(String),

    /// Inclusion was not observed in time. The outcome is ambiguous: the
    /// transaction may still land, so query the node before resubmitting.
    #[error("Transaction {tx_id} not confirmed after {rounds} rounds")]
    ConfirmationTimeout { tx_id: String, rounds: u64 },

    /// Address text failed to parse.
    #[error("Invalid address: {0}")]
    InvalidAddress(#[from] AddressError),

    /// No client is registered under this provider id.
    #[error("Unknown provider: {0}")]
    UnknownProvider(String),

    /// The provider has no live session.
    #[error("Provider {0} is not connected")]
    NotConnected(ProviderId),

    /// No provider has been marked active.
    #[error("No active provider")]
    NoActiveProvider,

    /// The account is not part of the provider's session.
    #[error("Account {address} is not connected to {provider}")]
    UnknownAccount { provider: ProviderId, address: String },

    /// Transport-level failure talking to a wallet SDK.
    #[error("Provider error: {0}")]
    Provider(String),

    /// Node RPC failure that is not a refusal of the batch.
    #[error(transparent)]
    Node(#[from] NodeError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Result type for wallet bridge operations.
pub type WalletResult<T> = Result<T, WalletError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = WalletError::ConfirmationTimeout {
            tx_id: "ABC".to_string(),
            rounds: 4,
        };
        assert_eq!(err.to_string(), "Transaction ABC not confirmed after 4 rounds");

        let err = WalletError::NoAccountsFound(ProviderId::Inkey);
        assert_eq!(err.to_string(), "No accounts found for inkey");
    }

    #[test]
    fn test_node_error_is_transparent() {
        let err: WalletError = NodeError::Timeout(10).into();
        assert_eq!(err.to_string(), "Node request timed out after 10 seconds");
    }
}
