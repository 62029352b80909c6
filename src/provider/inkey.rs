//! Inkey microwallet adapter.
//!
//! The wallet lives in an embedded frame owned by the host. The host
//! implements [`InkeyFrame`] over whatever channel reaches that frame; this
//! adapter only maps frame responses onto the provider contract.

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::InkeyConfig;
use crate::error::WalletResult;
use crate::provider::traits::WalletProvider;
use crate::provider::types::{ProviderId, ProviderMetadata, SigningResult, Wallet, WalletAccount};

const DEFAULT_ACCOUNT_NAME: &str = "Inkey account";

/// Account reported by the frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InkeyAccount {
    pub address: String,
    #[serde(default)]
    pub username: Option<String>,
}

/// Frame reply to a signing request.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct InkeySignResponse {
    pub success: bool,
    pub signed_txns: Vec<Bytes>,
    pub error: Option<String>,
}

/// Bridge to the embedded wallet frame.
#[async_trait]
pub trait InkeyFrame: Send + Sync {
    /// Ask the user to connect. `None` when the user dismisses the frame.
    async fn connect(&self) -> WalletResult<Option<InkeyAccount>>;

    /// The account of a still-live frame session, if any.
    async fn active_account(&self) -> WalletResult<Option<InkeyAccount>>;

    async fn disconnect(&self) -> WalletResult<()>;

    async fn sign(&self, transactions: &[Bytes]) -> WalletResult<InkeySignResponse>;
}

/// [`WalletProvider`] backed by an Inkey frame.
pub struct InkeyWallet {
    frame: Arc<dyn InkeyFrame>,
    frame_url: String,
    metadata: ProviderMetadata,
}

impl InkeyWallet {
    pub fn new(frame: Arc<dyn InkeyFrame>, frame_url: impl Into<String>) -> Self {
        Self {
            frame,
            frame_url: frame_url.into(),
            metadata: ProviderMetadata {
                id: ProviderId::Inkey,
                name: "Inkey Microwallet".to_string(),
                is_walletconnect: false,
            },
        }
    }

    /// Build the adapter for the frame URL configured in `[inkey]`.
    pub fn from_config(frame: Arc<dyn InkeyFrame>, config: &InkeyConfig) -> Self {
        Self::new(frame, config.frame_url.clone())
    }

    pub fn frame_url(&self) -> &str {
        &self.frame_url
    }

    fn to_account(&self, account: InkeyAccount) -> WalletAccount {
        WalletAccount {
            address: account.address,
            name: account
                .username
                .filter(|name| !name.is_empty())
                .unwrap_or_else(|| DEFAULT_ACCOUNT_NAME.to_string()),
            provider_id: self.metadata.id,
        }
    }
}

#[async_trait]
impl WalletProvider for InkeyWallet {
    fn metadata(&self) -> &ProviderMetadata {
        &self.metadata
    }

    async fn connect(&self) -> WalletResult<Vec<WalletAccount>> {
        tracing::debug!(frame_url = %self.frame_url, "Connecting to Inkey frame");
        let account = self.frame.connect().await?;
        Ok(account.into_iter().map(|a| self.to_account(a)).collect())
    }

    async fn reconnect(&self) -> WalletResult<Option<Wallet>> {
        Ok(self.frame.active_account().await?.map(|account| Wallet {
            metadata: self.metadata.clone(),
            accounts: vec![self.to_account(account)],
        }))
    }

    async fn disconnect(&self) -> WalletResult<()> {
        self.frame.disconnect().await
    }

    async fn sign(&self, transactions: &[Bytes]) -> WalletResult<SigningResult> {
        let response = self.frame.sign(transactions).await?;
        if response.success {
            Ok(SigningResult::Signed(response.signed_txns))
        } else {
            Ok(SigningResult::rejected(
                response
                    .error
                    .unwrap_or_else(|| "did not sign txns".to_string()),
            ))
        }
    }
}

impl std::fmt::Debug for InkeyWallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InkeyWallet")
            .field("frame_url", &self.frame_url)
            .finish_non_exhaustive()
    }
}
