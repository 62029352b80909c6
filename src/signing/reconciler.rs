//! Signing reconciliation.
//!
//! Given an ordered batch, pick out the unsigned transactions whose sender is
//! a connected account, have the provider sign them in one call, and put the
//! signed blobs back in their original slots. Everything else passes through
//! as the caller's original bytes.
//!
//! # Invariants
//! - Output length and order equal input length and order.
//! - Already-signed entries are never re-signed.
//! - Unsigned entries from unconnected senders are returned unchanged.
//! - No provider call is made when nothing needs signing.
//! - On any signing failure nothing is substituted.

use bytes::Bytes;
use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use crate::error::{WalletError, WalletResult};
use crate::observability::metrics;
use crate::provider::traits::WalletProvider;
use crate::provider::types::SigningResult;
use crate::signing::keepalive::{KeepAliveGuard, SessionKeepAlive};
use crate::transaction::batch::EncodedTxn;
use crate::transaction::decode::{decode_any, decode_transaction};
use crate::transaction::types::DecodedTransaction;

/// Stateless reconciler; all per-call state lives on the stack.
#[derive(Clone, Default)]
pub struct SigningReconciler {
    keepalive: Option<Arc<dyn SessionKeepAlive>>,
}

impl SigningReconciler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a hook to run around every remote signing call.
    pub fn with_keepalive(mut self, hook: Arc<dyn SessionKeepAlive>) -> Self {
        self.keepalive = Some(hook);
        self
    }

    /// Sign the entries of `transactions` that are unsigned and sent from
    /// one of `connected_accounts`.
    pub async fn sign_transactions(
        &self,
        provider: &dyn WalletProvider,
        connected_accounts: &[String],
        transactions: &[Bytes],
    ) -> WalletResult<Vec<Bytes>> {
        let decoded = transactions
            .iter()
            .enumerate()
            .map(|(i, txn)| {
                decode_any(txn).map_err(|e| match e {
                    WalletError::MalformedTransaction(msg) => {
                        WalletError::MalformedTransaction(format!("transaction {}: {}", i, msg))
                    }
                    other => other,
                })
            })
            .collect::<WalletResult<Vec<_>>>()?;

        let connected: HashSet<&str> = connected_accounts.iter().map(String::as_str).collect();

        // Signed state takes precedence over sender membership.
        let needs_signature: Vec<bool> = decoded
            .iter()
            .map(|txn| !txn.is_signed && connected.contains(txn.sender.to_string().as_str()))
            .collect();

        let (to_sign, requests): (Vec<Bytes>, Vec<&DecodedTransaction>) = transactions
            .iter()
            .zip(&decoded)
            .zip(&needs_signature)
            .filter(|(_, sign)| **sign)
            .map(|((raw, txn), _)| (raw.clone(), txn))
            .unzip();

        if to_sign.is_empty() {
            tracing::debug!(
                provider = %provider.metadata().id,
                batch_size = transactions.len(),
                "Nothing to sign, returning batch unchanged"
            );
            return Ok(transactions.to_vec());
        }

        let signed = self.dispatch(provider, to_sign, &requests).await?;

        let mut queue = signed.into_iter();
        let mut merged = Vec::with_capacity(transactions.len());
        for (raw, &sign) in transactions.iter().zip(&needs_signature) {
            if sign {
                let blob = queue.next().ok_or_else(|| {
                    WalletError::SigningFailed("signature queue exhausted".to_string())
                })?;
                merged.push(blob);
            } else {
                merged.push(raw.clone());
            }
        }

        Ok(merged)
    }

    /// Sign every `"u"` entry of a tagged batch and return the raw batch
    /// with signed entries decoded from base64.
    pub async fn sign_encoded_transactions(
        &self,
        provider: &dyn WalletProvider,
        batch: &[EncodedTxn],
    ) -> WalletResult<Vec<Bytes>> {
        let raw = batch
            .iter()
            .map(EncodedTxn::raw)
            .collect::<WalletResult<Vec<_>>>()?;

        let mut to_sign = Vec::new();
        let mut requests = Vec::new();
        for (entry, bytes) in batch.iter().zip(&raw) {
            if !entry.is_signed() {
                requests.push(decode_transaction(bytes, false)?);
                to_sign.push(bytes.clone());
            }
        }

        if to_sign.is_empty() {
            return Ok(raw);
        }

        let request_refs: Vec<&DecodedTransaction> = requests.iter().collect();
        let mut queue = self.dispatch(provider, to_sign, &request_refs).await?.into_iter();

        batch
            .iter()
            .zip(raw)
            .map(|(entry, bytes)| {
                if entry.is_signed() {
                    Ok(bytes)
                } else {
                    queue.next().ok_or_else(|| {
                        WalletError::SigningFailed("signature queue exhausted".to_string())
                    })
                }
            })
            .collect()
    }

    /// One remote call for the whole subset, then validation of the result.
    async fn dispatch(
        &self,
        provider: &dyn WalletProvider,
        to_sign: Vec<Bytes>,
        requests: &[&DecodedTransaction],
    ) -> WalletResult<Vec<Bytes>> {
        let provider_id = provider.metadata().id;

        let senders: BTreeSet<String> = requests.iter().map(|t| t.sender.to_string()).collect();
        if senders.len() > 1 && !provider.supports_multi_sender_batches() {
            // TODO: split per sender once a provider that needs it is integrated;
            // a split would break single-prompt signing of atomic groups.
            tracing::warn!(
                provider = %provider_id,
                senders = senders.len(),
                "Provider does not advertise multi-sender batches; dispatching as one call"
            );
        }

        tracing::info!(
            provider = %provider_id,
            count = to_sign.len(),
            senders = senders.len(),
            "Requesting signatures"
        );

        let outcome = {
            let _guard = self.keepalive.clone().map(KeepAliveGuard::start);
            provider.sign(&to_sign).await
        };

        let signed = match outcome {
            Ok(SigningResult::Signed(blobs)) => blobs,
            Ok(SigningResult::Rejected { reason }) => {
                metrics::record_signing_request(provider_id.as_str(), "rejected");
                return Err(WalletError::SigningFailed(reason));
            }
            Err(e @ WalletError::SigningFailed(_)) => {
                metrics::record_signing_request(provider_id.as_str(), "error");
                return Err(e);
            }
            Err(e) => {
                metrics::record_signing_request(provider_id.as_str(), "error");
                return Err(WalletError::SigningFailed(e.to_string()));
            }
        };

        if let Err(e) = validate_signed(&signed, requests) {
            metrics::record_signing_request(provider_id.as_str(), "inconsistent");
            tracing::warn!(provider = %provider_id, error = %e, "Provider returned an inconsistent result");
            return Err(e);
        }

        metrics::record_signing_request(provider_id.as_str(), "signed");
        metrics::record_transactions_signed(provider_id.as_str(), signed.len());
        Ok(signed)
    }
}

/// Every returned blob must be a signed envelope around the transaction
/// requested in the same position.
fn validate_signed(signed: &[Bytes], requests: &[&DecodedTransaction]) -> WalletResult<()> {
    if signed.len() != requests.len() {
        return Err(WalletError::SigningFailed(format!(
            "requested {} signatures, provider returned {}",
            requests.len(),
            signed.len()
        )));
    }

    for (i, (blob, request)) in signed.iter().zip(requests).enumerate() {
        let returned = decode_transaction(blob, true).map_err(|e| {
            WalletError::SigningFailed(format!("signed transaction {} is unreadable: {}", i, e))
        })?;
        if !returned.same_fields(request) {
            return Err(WalletError::SigningFailed(format!(
                "signed transaction {} does not match request {}",
                returned.tx_id(),
                request.tx_id()
            )));
        }
    }

    Ok(())
}
