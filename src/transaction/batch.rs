//! Tagged base64 batches, as exchanged with front-ends.
//!
//! JSON form: `[["u", "<base64>"], ["s", "<base64>"]]`.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::error::{WalletError, WalletResult};

/// Signed-state marker of a batch entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TxnEncoding {
    #[serde(rename = "u")]
    Unsigned,
    #[serde(rename = "s")]
    Signed,
}

/// One `(marker, base64)` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedTxn(pub TxnEncoding, pub String);

/// Ordered batch of tagged transactions.
pub type EncodedBatch = Vec<EncodedTxn>;

impl EncodedTxn {
    pub fn unsigned(raw: &[u8]) -> Self {
        Self(TxnEncoding::Unsigned, STANDARD.encode(raw))
    }

    pub fn signed(raw: &[u8]) -> Self {
        Self(TxnEncoding::Signed, STANDARD.encode(raw))
    }

    pub fn is_signed(&self) -> bool {
        self.0 == TxnEncoding::Signed
    }

    /// Base64 text of the transaction.
    pub fn text(&self) -> &str {
        &self.1
    }

    /// Decoded raw bytes.
    pub fn raw(&self) -> WalletResult<Bytes> {
        decode_base64(&self.1).map(Bytes::from)
    }
}

/// Decode standard base64, mapping failures to `MalformedTransaction`.
pub fn decode_base64(text: &str) -> WalletResult<Vec<u8>> {
    STANDARD
        .decode(text.trim())
        .map_err(|e| WalletError::MalformedTransaction(format!("invalid base64: {}", e)))
}

/// Parse a batch from its JSON form.
pub fn parse_batch(json: &str) -> WalletResult<EncodedBatch> {
    serde_json::from_str(json)
        .map_err(|e| WalletError::MalformedTransaction(format!("invalid batch: {}", e)))
}

/// Raw bytes of every entry, in order.
pub fn batch_to_raw(batch: &[EncodedTxn]) -> WalletResult<Vec<Bytes>> {
    batch.iter().map(EncodedTxn::raw).collect()
}
