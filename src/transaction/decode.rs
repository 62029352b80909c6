//! Transaction decoding.
//!
//! Transactions are msgpack maps with short field names. A signed transaction
//! wraps the unsigned map in an envelope `{ "sig" | "msig" | "lsig", "txn" }`.
//! Decoding is a pure function of the input bytes.

use rmpv::Value;
use sha2::{Digest, Sha512_256};

use crate::error::{WalletError, WalletResult};
use crate::transaction::address::Address;
use crate::transaction::batch::decode_base64;
use crate::transaction::types::{DecodedTransaction, TxnKind};

/// Domain separation prefix for transaction ids and signatures.
pub const TX_PREFIX: &[u8] = b"TX";

const ENVELOPE_TXN_KEY: &str = "txn";
const SIGNATURE_KEYS: [&str; 3] = ["sig", "msig", "lsig"];

/// Deepest msgpack nesting accepted. Envelopes with multisig or logic-sig
/// arguments stay well under this.
const MAX_NESTING_DEPTH: usize = 16;

fn malformed(msg: impl Into<String>) -> WalletError {
    WalletError::MalformedTransaction(msg.into())
}

/// Decode a transaction whose signed state is known.
pub fn decode_transaction(bytes: &[u8], is_signed: bool) -> WalletResult<DecodedTransaction> {
    let entries = read_map(bytes)?;

    if is_signed {
        let inner = envelope_inner(&entries)?
            .ok_or_else(|| malformed("signed transaction has no 'txn' field"))?;
        decode_fields(inner, true)
    } else {
        decode_fields(&entries, false)
    }
}

/// Decode a transaction, detecting whether it carries a signature envelope.
pub fn decode_any(bytes: &[u8]) -> WalletResult<DecodedTransaction> {
    let entries = read_map(bytes)?;
    match envelope_inner(&entries)? {
        Some(inner) => decode_fields(inner, true),
        None => decode_fields(&entries, false),
    }
}

/// The inner transaction of a signed envelope, or `None` when `entries` is
/// not an envelope. An envelope must carry a signature next to its `txn`.
fn envelope_inner(entries: &[(Value, Value)]) -> WalletResult<Option<&[(Value, Value)]>> {
    let inner = match lookup(entries, ENVELOPE_TXN_KEY) {
        None => return Ok(None),
        Some(Value::Map(fields)) => fields,
        Some(_) => return Err(malformed("'txn' field is not a map")),
    };
    if !SIGNATURE_KEYS.iter().any(|key| lookup(entries, key).is_some()) {
        return Err(malformed("envelope has no 'sig', 'msig' or 'lsig'"));
    }
    Ok(Some(inner.as_slice()))
}

/// Decode a base64 transaction as carried in an encoded batch.
pub fn decode_encoded(txn: &str, is_signed: bool) -> WalletResult<DecodedTransaction> {
    let bytes = decode_base64(txn)?;
    decode_transaction(&bytes, is_signed)
}

/// Emit a structured log event describing a base64 transaction.
pub fn log_encoded_transaction(txn: &str, is_signed: bool) {
    match decode_encoded(txn, is_signed) {
        Ok(decoded) => tracing::info!(
            is_signed,
            from = %decoded.sender,
            to = ?decoded.receiver.map(|a| a.to_string()),
            kind = %decoded.kind,
            amount = decoded.amount,
            tx_id = %decoded.tx_id(),
            "Transaction"
        ),
        Err(e) => tracing::warn!(is_signed, error = %e, "Undecodable transaction"),
    }
}

/// Bytes a signer must sign: the `TX` prefix followed by the unsigned transaction.
pub fn signing_payload(unsigned: &[u8]) -> Vec<u8> {
    let mut payload = Vec::with_capacity(TX_PREFIX.len() + unsigned.len());
    payload.extend_from_slice(TX_PREFIX);
    payload.extend_from_slice(unsigned);
    payload
}

fn read_map(bytes: &[u8]) -> WalletResult<Vec<(Value, Value)>> {
    if bytes.is_empty() {
        return Err(malformed("empty input"));
    }

    let mut cursor = bytes;
    let value = rmpv::decode::read_value_with_max_depth(&mut cursor, MAX_NESTING_DEPTH)
        .map_err(|e| malformed(format!("invalid msgpack: {}", e)))?;

    if !cursor.is_empty() {
        return Err(malformed(format!("{} trailing bytes", cursor.len())));
    }

    match value {
        Value::Map(entries) => Ok(entries),
        _ => Err(malformed("expected a map")),
    }
}

fn lookup<'a>(entries: &'a [(Value, Value)], key: &str) -> Option<&'a Value> {
    entries
        .iter()
        .find(|(k, _)| k.as_str() == Some(key))
        .map(|(_, v)| v)
}

fn field_u64(entries: &[(Value, Value)], key: &str) -> WalletResult<Option<u64>> {
    match lookup(entries, key) {
        None => Ok(None),
        Some(v) => v
            .as_u64()
            .map(Some)
            .ok_or_else(|| malformed(format!("'{}' is not an unsigned integer", key))),
    }
}

fn field_bytes<'a>(entries: &'a [(Value, Value)], key: &str) -> WalletResult<Option<&'a [u8]>> {
    match lookup(entries, key) {
        None => Ok(None),
        Some(Value::Binary(b)) => Ok(Some(b.as_slice())),
        Some(_) => Err(malformed(format!("'{}' is not binary", key))),
    }
}

fn field_address(entries: &[(Value, Value)], key: &str) -> WalletResult<Option<Address>> {
    match field_bytes(entries, key)? {
        None => Ok(None),
        Some(raw) => Address::from_slice(raw)
            .map(Some)
            .ok_or_else(|| malformed(format!("'{}' is {} bytes, expected 32", key, raw.len()))),
    }
}

fn field_hash(entries: &[(Value, Value)], key: &str) -> WalletResult<Option<[u8; 32]>> {
    match field_bytes(entries, key)? {
        None => Ok(None),
        Some(raw) => raw
            .try_into()
            .map(Some)
            .map_err(|_| malformed(format!("'{}' is {} bytes, expected 32", key, raw.len()))),
    }
}

fn decode_fields(entries: &[(Value, Value)], is_signed: bool) -> WalletResult<DecodedTransaction> {
    let kind: TxnKind = lookup(entries, "type")
        .ok_or_else(|| malformed("missing 'type'"))?
        .as_str()
        .ok_or_else(|| malformed("'type' is not a string"))?
        .parse()
        .map_err(malformed)?;

    let sender = field_address(entries, "snd")?.ok_or_else(|| malformed("missing 'snd'"))?;

    let (receiver, amount) = match kind {
        TxnKind::AssetTransfer => (
            field_address(entries, "arcv")?,
            field_u64(entries, "aamt")?.unwrap_or(0),
        ),
        _ => (
            field_address(entries, "rcv")?,
            field_u64(entries, "amt")?.unwrap_or(0),
        ),
    };

    let genesis_id = match lookup(entries, "gen") {
        None => None,
        Some(v) => Some(
            v.as_str()
                .ok_or_else(|| malformed("'gen' is not a string"))?
                .to_string(),
        ),
    };

    let asset_id = match kind {
        TxnKind::AssetTransfer => field_u64(entries, "xaid")?,
        TxnKind::AssetConfig => field_u64(entries, "caid")?,
        TxnKind::AssetFreeze => field_u64(entries, "faid")?,
        _ => None,
    };

    Ok(DecodedTransaction {
        sender,
        receiver,
        kind,
        amount,
        fee: field_u64(entries, "fee")?.unwrap_or(0),
        first_valid: field_u64(entries, "fv")?.unwrap_or(0),
        last_valid: field_u64(entries, "lv")?.unwrap_or(0),
        genesis_id,
        group: field_hash(entries, "grp")?,
        note: field_bytes(entries, "note")?.map(|n| n.to_vec()),
        asset_id,
        application_id: field_u64(entries, "apid")?,
        is_signed,
        tx_hash: transaction_hash(entries)?,
    })
}

/// Hash over the canonical re-encoding of the unsigned map, so a signed
/// and an unsigned decode of one transaction agree.
fn transaction_hash(entries: &[(Value, Value)]) -> WalletResult<[u8; 32]> {
    let mut canonical = Vec::new();
    rmpv::encode::write_value(&mut canonical, &Value::Map(entries.to_vec()))
        .map_err(|e| malformed(format!("failed to re-encode: {}", e)))?;

    let digest = Sha512_256::digest(signing_payload(&canonical));
    let mut out = [0u8; 32];
    out.copy_from_slice(&digest);
    Ok(out)
}
