//! Uniform client over one wallet provider and one node.
//!
//! `WalletClient` gives every provider the same surface: session handling
//! is forwarded to the provider, signing goes through the reconciler, and
//! chain access goes through the node client.

use bytes::Bytes;
use std::sync::Arc;

use crate::error::{WalletError, WalletResult};
use crate::node::client::NodeClient;
use crate::node::submit::{ConfirmationPolicy, Submitter};
use crate::node::types::{AccountInfo, AssetHolding, ConfirmedTransaction, HealthRecord, NodeError};
use crate::provider::traits::WalletProvider;
use crate::provider::types::{ProviderId, ProviderMetadata, Wallet};
use crate::signing::{SessionKeepAlive, SigningReconciler};
use crate::transaction::address::Address;
use crate::transaction::batch::EncodedTxn;
use crate::transaction::decode::{decode_encoded, log_encoded_transaction};
use crate::transaction::group::{group_by_sender, SenderGroups};
use crate::transaction::types::DecodedTransaction;

#[derive(Clone)]
pub struct WalletClient {
    provider: Arc<dyn WalletProvider>,
    node: Arc<dyn NodeClient>,
    reconciler: SigningReconciler,
    submitter: Submitter,
}

impl WalletClient {
    pub fn new(provider: Arc<dyn WalletProvider>, node: Arc<dyn NodeClient>) -> Self {
        Self {
            submitter: Submitter::new(node.clone()),
            provider,
            node,
            reconciler: SigningReconciler::new(),
        }
    }

    /// Run `hook` around every remote signing call.
    pub fn with_keepalive(mut self, hook: Arc<dyn SessionKeepAlive>) -> Self {
        self.reconciler = self.reconciler.with_keepalive(hook);
        self
    }

    pub fn with_confirmation_policy(mut self, policy: ConfirmationPolicy) -> Self {
        self.submitter = self.submitter.with_policy(policy);
        self
    }

    pub fn metadata(&self) -> &ProviderMetadata {
        self.provider.metadata()
    }

    pub fn provider_id(&self) -> ProviderId {
        self.provider.metadata().id
    }

    /// Open a session. A provider that reports no accounts is an error.
    pub async fn connect(&self) -> WalletResult<Wallet> {
        let accounts = self.provider.connect().await?;
        if accounts.is_empty() {
            return Err(WalletError::NoAccountsFound(self.provider_id()));
        }

        tracing::info!(
            provider = %self.provider_id(),
            accounts = accounts.len(),
            "Wallet connected"
        );

        Ok(Wallet {
            metadata: self.metadata().clone(),
            accounts,
        })
    }

    pub async fn reconnect(&self) -> WalletResult<Option<Wallet>> {
        let wallet = self.provider.reconnect().await?;
        if let Some(wallet) = &wallet {
            tracing::info!(
                provider = %self.provider_id(),
                accounts = wallet.accounts.len(),
                "Wallet session restored"
            );
        }
        Ok(wallet)
    }

    /// Close the session. Provider failures are logged, never surfaced.
    pub async fn disconnect(&self) {
        match self.provider.disconnect().await {
            Ok(()) => tracing::info!(provider = %self.provider_id(), "Wallet disconnected"),
            Err(e) => tracing::warn!(provider = %self.provider_id(), error = %e, "Disconnect failed"),
        }
    }

    pub async fn health_check(&self) -> WalletResult<HealthRecord> {
        Ok(self.node.health_check().await?)
    }

    pub async fn get_account_info(&self, address: &str) -> WalletResult<AccountInfo> {
        let address: Address = address.parse()?;
        Ok(self.node.account_information(&address.to_string()).await?)
    }

    /// Asset holdings of `address`. A response without an asset list is an error.
    pub async fn get_assets(&self, address: &str) -> WalletResult<Vec<AssetHolding>> {
        let info = self.get_account_info(address).await?;
        info.assets.ok_or_else(|| {
            NodeError::Decode(format!("Unable to get account assets for {}", address)).into()
        })
    }

    pub async fn wait_for_confirmation(
        &self,
        tx_id: &str,
        wait_rounds: u64,
    ) -> WalletResult<ConfirmedTransaction> {
        let policy = ConfirmationPolicy {
            wait_rounds,
            ..self.submitter.policy()
        };
        self.submitter.wait_for_confirmation(tx_id, policy).await
    }

    pub fn decode_transaction(&self, txn: &str, is_signed: bool) -> WalletResult<DecodedTransaction> {
        decode_encoded(txn, is_signed)
    }

    pub fn log_encoded_transaction(&self, txn: &str, is_signed: bool) {
        log_encoded_transaction(txn, is_signed)
    }

    pub fn group_transactions_by_sender(&self, batch: &[EncodedTxn]) -> WalletResult<SenderGroups> {
        group_by_sender(batch)
    }

    /// Sign what `connected_accounts` can sign; see [`SigningReconciler`].
    pub async fn sign_transactions(
        &self,
        connected_accounts: &[String],
        transactions: &[Bytes],
    ) -> WalletResult<Vec<Bytes>> {
        self.reconciler
            .sign_transactions(self.provider.as_ref(), connected_accounts, transactions)
            .await
    }

    pub async fn sign_encoded_transactions(&self, batch: &[EncodedTxn]) -> WalletResult<Vec<Bytes>> {
        self.reconciler
            .sign_encoded_transactions(self.provider.as_ref(), batch)
            .await
    }

    /// Submit a fully signed batch and wait for it with the configured policy.
    pub async fn send_raw_transactions(&self, signed: &[Bytes]) -> WalletResult<ConfirmedTransaction> {
        self.submitter.submit(signed).await
    }
}

impl std::fmt::Debug for WalletClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletClient")
            .field("provider", &self.provider_id())
            .field("submitter", &self.submitter)
            .finish_non_exhaustive()
    }
}
