//! Canonical transaction encoding.
//!
//! Canonical form: map keys sorted, zero and empty fields omitted.

use bytes::Bytes;
use rmpv::Value;
use sha2::{Digest, Sha512_256};

use crate::error::{WalletError, WalletResult};
use crate::transaction::address::Address;
use crate::transaction::decode::decode_transaction;
use crate::transaction::types::TxnKind;

/// Domain separation prefix for group ids.
const TG_PREFIX: &[u8] = b"TG";

fn encoding_error(e: impl std::fmt::Display) -> WalletError {
    WalletError::MalformedTransaction(format!("failed to encode: {}", e))
}

/// Builder for payment and asset-transfer transactions.
#[derive(Debug, Clone)]
pub struct TransactionBuilder {
    kind: TxnKind,
    sender: Address,
    receiver: Address,
    amount: u64,
    asset_id: Option<u64>,
    fee: u64,
    first_valid: u64,
    last_valid: u64,
    genesis_id: Option<String>,
    genesis_hash: Option<[u8; 32]>,
    group: Option<[u8; 32]>,
    note: Option<Vec<u8>>,
}

impl TransactionBuilder {
    /// A native-currency payment.
    pub fn payment(sender: Address, receiver: Address, amount: u64) -> Self {
        Self {
            kind: TxnKind::Payment,
            sender,
            receiver,
            amount,
            asset_id: None,
            fee: 0,
            first_valid: 0,
            last_valid: 0,
            genesis_id: None,
            genesis_hash: None,
            group: None,
            note: None,
        }
    }

    /// An asset transfer of `amount` units of `asset_id`.
    pub fn asset_transfer(sender: Address, receiver: Address, asset_id: u64, amount: u64) -> Self {
        Self {
            kind: TxnKind::AssetTransfer,
            asset_id: Some(asset_id),
            ..Self::payment(sender, receiver, amount)
        }
    }

    pub fn fee(mut self, fee: u64) -> Self {
        self.fee = fee;
        self
    }

    pub fn validity(mut self, first_valid: u64, last_valid: u64) -> Self {
        self.first_valid = first_valid;
        self.last_valid = last_valid;
        self
    }

    pub fn genesis_id(mut self, id: impl Into<String>) -> Self {
        self.genesis_id = Some(id.into());
        self
    }

    pub fn genesis_hash(mut self, hash: [u8; 32]) -> Self {
        self.genesis_hash = Some(hash);
        self
    }

    pub fn group(mut self, group: [u8; 32]) -> Self {
        self.group = Some(group);
        self
    }

    pub fn note(mut self, note: impl Into<Vec<u8>>) -> Self {
        self.note = Some(note.into());
        self
    }

    /// Encode to canonical msgpack.
    pub fn encode(&self) -> WalletResult<Bytes> {
        let mut fields: Vec<(&'static str, Value)> = Vec::new();

        let (amount_key, receiver_key) = match self.kind {
            TxnKind::AssetTransfer => ("aamt", "arcv"),
            _ => ("amt", "rcv"),
        };

        put_u64(&mut fields, amount_key, self.amount);
        put_u64(&mut fields, "fee", self.fee);
        put_u64(&mut fields, "fv", self.first_valid);
        put_u64(&mut fields, "lv", self.last_valid);
        if let Some(asset_id) = self.asset_id {
            put_u64(&mut fields, "xaid", asset_id);
        }
        if let Some(gen) = self.genesis_id.as_ref().filter(|g| !g.is_empty()) {
            fields.push(("gen", Value::from(gen.as_str())));
        }
        if let Some(gh) = self.genesis_hash {
            fields.push(("gh", Value::Binary(gh.to_vec())));
        }
        if let Some(grp) = self.group {
            fields.push(("grp", Value::Binary(grp.to_vec())));
        }
        if let Some(note) = self.note.as_ref().filter(|n| !n.is_empty()) {
            fields.push(("note", Value::Binary(note.clone())));
        }
        if self.receiver != Address::ZERO {
            fields.push((receiver_key, Value::Binary(self.receiver.as_bytes().to_vec())));
        }
        fields.push(("snd", Value::Binary(self.sender.as_bytes().to_vec())));
        fields.push(("type", Value::from(self.kind.as_str())));

        fields.sort_by(|a, b| a.0.cmp(b.0));

        let map = Value::Map(
            fields
                .into_iter()
                .map(|(k, v)| (Value::from(k), v))
                .collect(),
        );

        let mut buf = Vec::new();
        rmpv::encode::write_value(&mut buf, &map).map_err(encoding_error)?;
        Ok(Bytes::from(buf))
    }
}

fn put_u64(fields: &mut Vec<(&'static str, Value)>, key: &'static str, v: u64) {
    if v != 0 {
        fields.push((key, Value::from(v)));
    }
}

/// Wrap an unsigned transaction in a single-signature envelope.
///
/// The inner bytes are copied verbatim so the transaction id is unchanged.
pub fn attach_signature(unsigned: &[u8], signature: &[u8; 64]) -> WalletResult<Bytes> {
    // Validates that the input is an unsigned transaction.
    decode_transaction(unsigned, false)?;

    let mut buf = Vec::with_capacity(unsigned.len() + 80);
    rmp::encode::write_map_len(&mut buf, 2).map_err(encoding_error)?;
    rmp::encode::write_str(&mut buf, "sig").map_err(encoding_error)?;
    rmp::encode::write_bin(&mut buf, signature).map_err(encoding_error)?;
    rmp::encode::write_str(&mut buf, "txn").map_err(encoding_error)?;
    buf.extend_from_slice(unsigned);
    Ok(Bytes::from(buf))
}

/// Compute the atomic group id for an ordered list of unsigned transactions.
pub fn compute_group_id(transactions: &[Bytes]) -> WalletResult<[u8; 32]> {
    if transactions.is_empty() {
        return Err(WalletError::MalformedTransaction(
            "cannot group an empty batch".to_string(),
        ));
    }

    let mut hashes = Vec::with_capacity(transactions.len());
    for txn in transactions {
        let decoded = decode_transaction(txn, false)?;
        hashes.push(Value::Binary(decoded.tx_hash().to_vec()));
    }

    let list = Value::Map(vec![(Value::from("txlist"), Value::Array(hashes))]);
    let mut buf = TG_PREFIX.to_vec();
    rmpv::encode::write_value(&mut buf, &list).map_err(encoding_error)?;

    let digest = Sha512_256::digest(&buf);
    let mut out = [0u8; 32];
    out.copy_from_slice(&digest);
    Ok(out)
}

/// Stamp a group id onto each transaction built by `builders`, in order.
pub fn build_group(builders: Vec<TransactionBuilder>) -> WalletResult<Vec<Bytes>> {
    let ungrouped = builders
        .iter()
        .map(TransactionBuilder::encode)
        .collect::<WalletResult<Vec<_>>>()?;
    let group = compute_group_id(&ungrouped)?;

    builders
        .into_iter()
        .map(|b| b.group(group).encode())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(n: u8) -> Address {
        Address::from_public_key([n; 32])
    }

    #[test]
    fn test_canonical_omits_zero_fields() {
        let bytes = TransactionBuilder::payment(addr(1), addr(2), 0).encode().unwrap();
        let value = rmpv::decode::read_value(&mut &bytes[..]).unwrap();
        let keys: Vec<&str> = value
            .as_map()
            .unwrap()
            .iter()
            .filter_map(|(k, _)| k.as_str())
            .collect();
        assert_eq!(keys, vec!["rcv", "snd", "type"]);
    }

    #[test]
    fn test_keys_are_sorted() {
        let bytes = TransactionBuilder::asset_transfer(addr(1), addr(2), 10, 5)
            .fee(1000)
            .validity(1, 2)
            .note(b"hi".to_vec())
            .encode()
            .unwrap();
        let value = rmpv::decode::read_value(&mut &bytes[..]).unwrap();
        let keys: Vec<&str> = value
            .as_map()
            .unwrap()
            .iter()
            .filter_map(|(k, _)| k.as_str())
            .collect();
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted);
    }

    #[test]
    fn test_attach_signature_rejects_signed_input() {
        let unsigned = TransactionBuilder::payment(addr(1), addr(2), 1).encode().unwrap();
        let signed = attach_signature(&unsigned, &[1u8; 64]).unwrap();
        assert!(attach_signature(&signed, &[1u8; 64]).is_err());
    }

    #[test]
    fn test_group_id_depends_on_order() {
        let a = TransactionBuilder::payment(addr(1), addr(2), 1).encode().unwrap();
        let b = TransactionBuilder::payment(addr(2), addr(1), 2).encode().unwrap();
        let ab = compute_group_id(&[a.clone(), b.clone()]).unwrap();
        let ba = compute_group_id(&[b, a]).unwrap();
        assert_ne!(ab, ba);
    }

    #[test]
    fn test_build_group_stamps_every_member() {
        let txns = build_group(vec![
            TransactionBuilder::payment(addr(1), addr(2), 1),
            TransactionBuilder::payment(addr(3), addr(4), 2),
        ])
        .unwrap();

        let first = decode_transaction(&txns[0], false).unwrap();
        let second = decode_transaction(&txns[1], false).unwrap();
        assert!(first.group.is_some());
        assert_eq!(first.group, second.group);
    }
}
