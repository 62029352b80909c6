//! Provider-facing types.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifier of a wallet provider integration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    /// Inkey embedded microwallet.
    Inkey,
    /// WalletConnect-style mobile wallets.
    WalletConnect,
    /// Browser extension wallets.
    Extension,
    /// In-process key, for development and automation.
    Local,
}

impl ProviderId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::Inkey => "inkey",
            ProviderId::WalletConnect => "walletconnect",
            ProviderId::Extension => "extension",
            ProviderId::Local => "local",
        }
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "inkey" => Ok(ProviderId::Inkey),
            "walletconnect" => Ok(ProviderId::WalletConnect),
            "extension" => Ok(ProviderId::Extension),
            "local" => Ok(ProviderId::Local),
            other => Err(other.to_string()),
        }
    }
}

/// Static description of a provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderMetadata {
    pub id: ProviderId,
    pub name: String,
    pub is_walletconnect: bool,
}

/// An account a provider is authorized to sign for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletAccount {
    pub address: String,
    pub name: String,
    pub provider_id: ProviderId,
}

/// Session info returned by connect and reconnect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wallet {
    #[serde(flatten)]
    pub metadata: ProviderMetadata,
    pub accounts: Vec<WalletAccount>,
}

/// Outcome of one remote signing call.
///
/// There is no partial success: either every requested transaction comes
/// back signed, in request order, or none does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SigningResult {
    Signed(Vec<Bytes>),
    Rejected { reason: String },
}

impl SigningResult {
    pub fn rejected(reason: impl Into<String>) -> Self {
        SigningResult::Rejected {
            reason: reason.into(),
        }
    }
}
