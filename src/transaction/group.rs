//! Grouping of unsigned batch entries by sender.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::error::WalletResult;
use crate::transaction::batch::EncodedTxn;
use crate::transaction::decode::decode_encoded;
use crate::transaction::types::TxnKind;

/// Summary of one unsigned transaction for display and inspection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TxnInfo {
    /// Position in the original batch, counting signed entries too.
    pub group_index: usize,
    pub amount: u64,
    pub from: String,
    pub to: Option<String>,
    #[serde(rename = "type")]
    pub kind: TxnKind,
    /// The base64 transaction as supplied.
    pub txn: String,
}

/// Sender address → that sender's unsigned transactions in batch order.
pub type SenderGroups = BTreeMap<String, Vec<TxnInfo>>;

/// Partition the unsigned entries of `batch` by sender.
///
/// Signed entries are skipped but still count toward `group_index`.
pub fn group_by_sender(batch: &[EncodedTxn]) -> WalletResult<SenderGroups> {
    let mut groups = SenderGroups::new();

    for (index, entry) in batch.iter().enumerate() {
        if entry.is_signed() {
            continue;
        }

        let decoded = decode_encoded(entry.text(), false)?;
        let from = decoded.sender.to_string();

        groups.entry(from.clone()).or_default().push(TxnInfo {
            group_index: index,
            amount: decoded.amount,
            from,
            to: decoded.receiver.map(|a| a.to_string()),
            kind: decoded.kind,
            txn: entry.text().to_string(),
        });
    }

    Ok(groups)
}
