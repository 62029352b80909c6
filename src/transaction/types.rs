//! Decoded transaction records.

use data_encoding::BASE32_NOPAD;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::transaction::address::Address;

/// Transaction kinds understood by the decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TxnKind {
    #[serde(rename = "pay")]
    Payment,
    #[serde(rename = "keyreg")]
    KeyRegistration,
    #[serde(rename = "acfg")]
    AssetConfig,
    #[serde(rename = "axfer")]
    AssetTransfer,
    #[serde(rename = "afrz")]
    AssetFreeze,
    #[serde(rename = "appl")]
    ApplicationCall,
    #[serde(rename = "stpf")]
    StateProof,
}

impl TxnKind {
    /// Wire tag for this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            TxnKind::Payment => "pay",
            TxnKind::KeyRegistration => "keyreg",
            TxnKind::AssetConfig => "acfg",
            TxnKind::AssetTransfer => "axfer",
            TxnKind::AssetFreeze => "afrz",
            TxnKind::ApplicationCall => "appl",
            TxnKind::StateProof => "stpf",
        }
    }
}

impl FromStr for TxnKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pay" => Ok(TxnKind::Payment),
            "keyreg" => Ok(TxnKind::KeyRegistration),
            "acfg" => Ok(TxnKind::AssetConfig),
            "axfer" => Ok(TxnKind::AssetTransfer),
            "afrz" => Ok(TxnKind::AssetFreeze),
            "appl" => Ok(TxnKind::ApplicationCall),
            "stpf" => Ok(TxnKind::StateProof),
            other => Err(format!("unknown transaction type '{}'", other)),
        }
    }
}

impl fmt::Display for TxnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured view of one transaction.
///
/// A signed transaction decodes to the same field values as the unsigned
/// transaction it wraps; only `is_signed` differs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecodedTransaction {
    pub sender: Address,
    /// `rcv` for payments, `arcv` for asset transfers.
    pub receiver: Option<Address>,
    #[serde(rename = "type")]
    pub kind: TxnKind,
    /// `amt` for payments, `aamt` for asset transfers.
    pub amount: u64,
    pub fee: u64,
    pub first_valid: u64,
    pub last_valid: u64,
    pub genesis_id: Option<String>,
    pub group: Option<[u8; 32]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<Vec<u8>>,
    pub asset_id: Option<u64>,
    pub application_id: Option<u64>,
    pub is_signed: bool,
    /// SHA-512/256 of `"TX"` followed by the canonical unsigned bytes.
    #[serde(skip)]
    pub(crate) tx_hash: [u8; 32],
}

impl DecodedTransaction {
    /// Network transaction id.
    pub fn tx_id(&self) -> String {
        BASE32_NOPAD.encode(&self.tx_hash)
    }

    /// Raw 32-byte transaction hash, as used in group id computation.
    pub fn tx_hash(&self) -> &[u8; 32] {
        &self.tx_hash
    }

    /// Whether the unsigned fields match another decode of the same transaction.
    pub fn same_fields(&self, other: &DecodedTransaction) -> bool {
        self.sender == other.sender
            && self.receiver == other.receiver
            && self.kind == other.kind
            && self.amount == other.amount
            && self.group == other.group
            && self.tx_hash == other.tx_hash
    }
}
