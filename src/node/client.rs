//! Node RPC client with timeout, retry and failover handling.
//!
//! # Responsibilities
//! - Speak the algod v2 REST API over HTTP
//! - Query chain state (status, accounts, pending pool entries)
//! - Submit raw signed transaction groups
//! - Provide a health check for node connectivity

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::{Duration, Instant};

use crate::config::NodeConfig;
use crate::node::types::{
    AccountInfo, HealthRecord, NodeError, NodeResult, NodeStatus, PendingTransaction,
};
use crate::observability::metrics;
use crate::resilience::{retry_idempotent, with_timeout, RetryPolicy};

/// Header carrying the node API token.
pub const API_TOKEN_HEADER: &str = "X-Algo-API-Token";

/// The ledger node boundary.
///
/// Everything above this trait (submitter, wallet client) is written
/// against it, so tests can substitute an in-memory node.
#[async_trait]
pub trait NodeClient: Send + Sync {
    /// Submit concatenated signed transactions as one atomic call.
    /// Returns the node-reported transaction id.
    async fn send_raw_transactions(&self, signed: &[Bytes]) -> NodeResult<String>;

    async fn account_information(&self, address: &str) -> NodeResult<AccountInfo>;

    async fn status(&self) -> NodeResult<NodeStatus>;

    /// Block until the node has seen a round after `round`.
    async fn status_after_block(&self, round: u64) -> NodeResult<NodeStatus>;

    async fn pending_transaction(&self, tx_id: &str) -> NodeResult<PendingTransaction>;

    async fn health_check(&self) -> NodeResult<HealthRecord>;
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubmitResponse {
    tx_id: String,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

/// HTTP client for an algod node with failover support.
#[derive(Clone)]
pub struct AlgodClient {
    /// Base URLs (primary first, then failovers), without trailing slash.
    endpoints: Vec<String>,
    http: reqwest::Client,
    api_token: String,
    timeout_duration: Duration,
    retry: RetryPolicy,
}

impl AlgodClient {
    /// Create a client from node configuration.
    ///
    /// An unparseable primary URL is an error; unparseable failover URLs are
    /// skipped with a warning.
    pub fn new(config: &NodeConfig) -> NodeResult<Self> {
        let mut endpoints = vec![normalize_endpoint(&config.url).map_err(|e| {
            NodeError::Rpc(format!("Invalid node URL '{}': {}", config.url, e))
        })?];

        for url_str in &config.failover_urls {
            match normalize_endpoint(url_str) {
                Ok(url) => endpoints.push(url),
                Err(e) => tracing::warn!(url = %url_str, error = %e, "Ignoring invalid failover node URL"),
            }
        }

        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| NodeError::Rpc(format!("Failed to build HTTP client: {}", e)))?;

        tracing::info!(
            node_url = %endpoints[0],
            failovers = endpoints.len() - 1,
            "Node client initialized"
        );

        Ok(Self {
            endpoints,
            http,
            api_token: config.api_token.clone(),
            timeout_duration: Duration::from_secs(config.request_timeout_secs),
            retry: RetryPolicy::from(config),
        })
    }

    /// Configured endpoints, primary first.
    pub fn endpoints(&self) -> &[String] {
        &self.endpoints
    }

    fn get(&self, url: &str) -> reqwest::RequestBuilder {
        let request = self.http.get(url);
        if self.api_token.is_empty() {
            request
        } else {
            request.header(API_TOKEN_HEADER, &self.api_token)
        }
    }

    /// Idempotent GET: retried per endpoint, then failed over in order.
    async fn read_json<T: DeserializeOwned>(&self, path: &str) -> NodeResult<T> {
        let mut last_error = None;

        for (i, endpoint) in self.endpoints.iter().enumerate() {
            let url = format!("{}{}", endpoint, path);
            let this = self;
            let result = retry_idempotent(&self.retry, move || this.fetch_json::<T>(url.clone())).await;

            match result {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() => {
                    tracing::warn!(provider_idx = i, endpoint = %endpoint, error = %e, "Node error, trying next endpoint");
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(match last_error {
            Some(NodeError::Timeout(secs)) if self.endpoints.len() == 1 => NodeError::Timeout(secs),
            Some(e) => NodeError::Rpc(format!("All node endpoints failed: {}", e)),
            None => NodeError::Rpc("All node endpoints failed".to_string()),
        })
    }

    async fn fetch_json<T: DeserializeOwned>(&self, url: String) -> NodeResult<T> {
        let request = self.get(&url);
        with_timeout(self.timeout_duration, async move {
            let response = request.send().await.map_err(map_transport_error)?;
            let response = check_status(response).await?;
            response
                .json::<T>()
                .await
                .map_err(|e| NodeError::Decode(e.to_string()))
        })
        .await
    }
}

fn normalize_endpoint(raw: &str) -> Result<String, url::ParseError> {
    let url = url::Url::parse(raw)?;
    Ok(url.as_str().trim_end_matches('/').to_string())
}

fn map_transport_error(e: reqwest::Error) -> NodeError {
    NodeError::Rpc(e.to_string())
}

/// Turn non-success statuses into `NodeError::Http`, preferring the node's
/// `{"message": ...}` body over the bare status text.
async fn check_status(response: reqwest::Response) -> NodeResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&body)
        .map(|b| b.message)
        .unwrap_or_else(|_| {
            if body.is_empty() {
                status.canonical_reason().unwrap_or("unknown error").to_string()
            } else {
                body
            }
        });

    Err(NodeError::Http {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl NodeClient for AlgodClient {
    async fn send_raw_transactions(&self, signed: &[Bytes]) -> NodeResult<String> {
        let mut body = BytesMut::with_capacity(signed.iter().map(Bytes::len).sum());
        for blob in signed {
            body.extend_from_slice(blob);
        }

        // Submission is not idempotent: primary endpoint only, one attempt.
        let url = format!("{}/v2/transactions", self.endpoints[0]);
        let mut request = self
            .http
            .post(&url)
            .header(reqwest::header::CONTENT_TYPE, "application/x-binary")
            .body(body.freeze());
        if !self.api_token.is_empty() {
            request = request.header(API_TOKEN_HEADER, &self.api_token);
        }

        let response: SubmitResponse = with_timeout(self.timeout_duration, async move {
            let response = request.send().await.map_err(map_transport_error)?;
            let response = match check_status(response).await {
                Err(NodeError::Http { status, message }) if status == 400 => {
                    return Err(NodeError::Rejected(message));
                }
                other => other?,
            };
            response
                .json::<SubmitResponse>()
                .await
                .map_err(|e| NodeError::Decode(e.to_string()))
        })
        .await?;

        Ok(response.tx_id)
    }

    async fn account_information(&self, address: &str) -> NodeResult<AccountInfo> {
        self.read_json(&format!("/v2/accounts/{}", address)).await
    }

    async fn status(&self) -> NodeResult<NodeStatus> {
        self.read_json("/v2/status").await
    }

    async fn status_after_block(&self, round: u64) -> NodeResult<NodeStatus> {
        self.read_json(&format!("/v2/status/wait-for-block-after/{}", round))
            .await
    }

    async fn pending_transaction(&self, tx_id: &str) -> NodeResult<PendingTransaction> {
        self.read_json(&format!("/v2/transactions/pending/{}", tx_id))
            .await
    }

    /// First endpoint answering `GET /health` wins; each probe updates the
    /// health gauge for its endpoint.
    async fn health_check(&self) -> NodeResult<HealthRecord> {
        for (i, endpoint) in self.endpoints.iter().enumerate() {
            let request = self.get(&format!("{}/health", endpoint));
            let started = Instant::now();
            let result = with_timeout(self.timeout_duration, async move {
                let response = request.send().await.map_err(map_transport_error)?;
                check_status(response).await
            })
            .await;

            match result {
                Ok(_) => {
                    metrics::record_node_health(endpoint, true);
                    return Ok(HealthRecord {
                        endpoint: endpoint.clone(),
                        latency: started.elapsed(),
                    });
                }
                Err(e) => {
                    metrics::record_node_health(endpoint, false);
                    tracing::warn!(provider_idx = i, endpoint = %endpoint, error = %e, "Node health check failed");
                }
            }
        }
        Err(NodeError::Rpc("All node endpoints failed health check".to_string()))
    }
}

impl std::fmt::Debug for AlgodClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlgodClient")
            .field("endpoints", &self.endpoints)
            .field("api_token", &if self.api_token.is_empty() { "" } else { "<redacted>" })
            .field("timeout_secs", &self.timeout_duration.as_secs())
            .finish()
    }
}
