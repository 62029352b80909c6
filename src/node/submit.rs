//! Transaction submission and confirmation monitoring.
//!
//! # Responsibilities
//! - Broadcast a signed batch as one atomic node call
//! - Poll the pending pool round by round until inclusion
//! - Bound the wait by rounds and an optional wall-clock deadline
//!
//! A batch is submitted at most once; nothing here resubmits.

use bytes::Bytes;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

use crate::config::ConfirmationConfig;
use crate::error::{WalletError, WalletResult};
use crate::node::client::NodeClient;
use crate::node::types::{ConfirmedTransaction, NodeError};
use crate::observability::metrics;

/// How long to wait for a submitted transaction to be included.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfirmationPolicy {
    pub wait_rounds: u64,
    pub deadline: Option<Duration>,
}

impl Default for ConfirmationPolicy {
    fn default() -> Self {
        Self {
            wait_rounds: 4,
            deadline: None,
        }
    }
}

impl ConfirmationPolicy {
    pub fn rounds(wait_rounds: u64) -> Self {
        Self {
            wait_rounds,
            ..Self::default()
        }
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }
}

impl From<&ConfirmationConfig> for ConfirmationPolicy {
    fn from(config: &ConfirmationConfig) -> Self {
        Self {
            wait_rounds: config.wait_rounds,
            deadline: config.deadline_secs.map(Duration::from_secs),
        }
    }
}

/// Sends signed batches to a node and tracks them to inclusion.
#[derive(Clone)]
pub struct Submitter {
    node: Arc<dyn NodeClient>,
    policy: ConfirmationPolicy,
}

impl Submitter {
    pub fn new(node: Arc<dyn NodeClient>) -> Self {
        Self {
            node,
            policy: ConfirmationPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: ConfirmationPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> ConfirmationPolicy {
        self.policy
    }

    /// Submit with the configured policy and wait for confirmation.
    pub async fn submit(&self, signed: &[Bytes]) -> WalletResult<ConfirmedTransaction> {
        self.submit_with(signed, self.policy).await
    }

    pub async fn submit_with(
        &self,
        signed: &[Bytes],
        policy: ConfirmationPolicy,
    ) -> WalletResult<ConfirmedTransaction> {
        let tx_id = self.broadcast(signed).await?;
        self.wait_for_confirmation(&tx_id, policy).await
    }

    /// Broadcast without waiting. Returns the node-reported transaction id.
    pub async fn broadcast(&self, signed: &[Bytes]) -> WalletResult<String> {
        if signed.is_empty() {
            metrics::record_submission("rejected");
            return Err(WalletError::SubmissionRejected(
                "empty transaction batch".to_string(),
            ));
        }

        match self.node.send_raw_transactions(signed).await {
            Ok(tx_id) => {
                metrics::record_submission("accepted");
                tracing::info!(tx_id = %tx_id, count = signed.len(), "Transaction batch submitted");
                Ok(tx_id)
            }
            Err(NodeError::Rejected(message)) => {
                metrics::record_submission("rejected");
                tracing::warn!(error = %message, "Node rejected transaction batch");
                Err(WalletError::SubmissionRejected(message))
            }
            Err(e) => {
                metrics::record_submission("error");
                Err(e.into())
            }
        }
    }

    /// Wait for `tx_id` to appear in a block.
    ///
    /// Starts at the round after the node's current one and polls the
    /// pending pool once per round for `policy.wait_rounds` rounds. Errors
    /// looking up the pool entry are not fatal; the entry may not be
    /// visible yet. A pool error means the node dropped the transaction.
    pub async fn wait_for_confirmation(
        &self,
        tx_id: &str,
        policy: ConfirmationPolicy,
    ) -> WalletResult<ConfirmedTransaction> {
        let result = match policy.deadline {
            Some(deadline) => {
                match timeout(deadline, self.poll_rounds(tx_id, policy.wait_rounds)).await {
                    Ok(result) => result,
                    Err(_) => Err(WalletError::ConfirmationTimeout {
                        tx_id: tx_id.to_string(),
                        rounds: policy.wait_rounds,
                    }),
                }
            }
            None => self.poll_rounds(tx_id, policy.wait_rounds).await,
        };

        match &result {
            Ok(confirmed) => {
                metrics::record_submission("confirmed");
                tracing::info!(tx_id = %tx_id, round = confirmed.confirmed_round, "Transaction confirmed");
            }
            Err(WalletError::ConfirmationTimeout { .. }) => {
                metrics::record_submission("timeout");
                tracing::warn!(tx_id = %tx_id, rounds = policy.wait_rounds, "Transaction not confirmed in time");
            }
            Err(_) => {}
        }
        result
    }

    async fn poll_rounds(&self, tx_id: &str, wait_rounds: u64) -> WalletResult<ConfirmedTransaction> {
        let start_round = self.node.status().await?.last_round.saturating_add(1);
        let end_round = start_round.saturating_add(wait_rounds);
        let mut current_round = start_round;

        while current_round < end_round {
            match self.node.pending_transaction(tx_id).await {
                Ok(pending) => {
                    if let Some(round) = pending.confirmed_round.filter(|r| *r > 0) {
                        return Ok(ConfirmedTransaction {
                            id: tx_id.to_string(),
                            confirmed_round: round,
                            pool_error: pending.pool_error,
                            asset_index: pending.asset_index,
                            application_index: pending.application_index,
                        });
                    }
                    if !pending.pool_error.is_empty() {
                        return Err(WalletError::SubmissionRejected(format!(
                            "Transaction {} rejected by pool: {}",
                            tx_id, pending.pool_error
                        )));
                    }
                }
                Err(e) => {
                    tracing::debug!(tx_id = %tx_id, error = %e, "Pending transaction lookup failed");
                }
            }

            tracing::debug!(tx_id = %tx_id, round = current_round, "Waiting for confirmation");
            self.node.status_after_block(current_round).await?;
            current_round += 1;
        }

        Err(WalletError::ConfirmationTimeout {
            tx_id: tx_id.to_string(),
            rounds: wait_rounds,
        })
    }
}

impl std::fmt::Debug for Submitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Submitter").field("policy", &self.policy).finish()
    }
}
