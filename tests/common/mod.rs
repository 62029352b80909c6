//! Shared utilities for integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use wallet_bridge::config::NodeConfig;
use wallet_bridge::provider::{
    ProviderId, ProviderMetadata, SigningResult, Wallet, WalletAccount, WalletProvider,
};
use wallet_bridge::transaction::{attach_signature, Address, TransactionBuilder};
use wallet_bridge::{WalletError, WalletResult};

/// One HTTP request as seen by the mock backend.
#[derive(Debug, Clone)]
pub struct MockRequest {
    pub method: String,
    pub path: String,
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
}

async fn read_request(socket: &mut tokio::net::TcpStream) -> Option<MockRequest> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    let header_end = loop {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let mut lines = head.split("\r\n");
    let mut request_line = lines.next()?.split_whitespace();
    let method = request_line.next()?.to_string();
    let path = request_line.next()?.to_string();

    let headers: HashMap<String, String> = lines
        .filter_map(|line| line.split_once(':'))
        .map(|(k, v)| (k.trim().to_ascii_lowercase(), v.trim().to_string()))
        .collect();

    let content_length: usize = headers
        .get("content-length")
        .and_then(|v| v.parse().ok())
        .unwrap_or(0);

    let mut body = buf[header_end..].to_vec();
    while body.len() < content_length {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            break;
        }
        body.extend_from_slice(&chunk[..n]);
    }

    Some(MockRequest {
        method,
        path,
        headers,
        body,
    })
}

/// Start a programmable mock backend on an ephemeral port.
pub async fn start_programmable_backend<F, Fut>(f: F) -> SocketAddr
where
    F: Fn(MockRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let f = Arc::new(f);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let f = f.clone();
                    tokio::spawn(async move {
                        let Some(request) = read_request(&mut socket).await else {
                            return;
                        };
                        let (status, body) = f(request).await;
                        let status_text = match status {
                            200 => "200 OK",
                            400 => "400 Bad Request",
                            404 => "404 Not Found",
                            429 => "429 Too Many Requests",
                            500 => "500 Internal Server Error",
                            502 => "502 Bad Gateway",
                            503 => "503 Service Unavailable",
                            _ => "200 OK",
                        };

                        let response_str = format!(
                            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status_text,
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response_str.as_bytes()).await;
                        let _ = socket.shutdown().await;
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

/// Behaviour knobs and request log for [`start_mock_algod`].
#[derive(Debug, Default)]
pub struct AlgodState {
    pub last_round: u64,
    /// Round at which the submitted transaction shows as confirmed.
    pub confirm_at: Option<u64>,
    /// Reply to `POST /v2/transactions` with 400 and this message.
    pub reject_with: Option<String>,
    pub pool_error: String,
    pub assets: Option<String>,
    /// Answer every request with 503.
    pub unavailable: bool,
    pub requests: Vec<MockRequest>,
}

impl AlgodState {
    pub fn count(&self, method: &str, prefix: &str) -> usize {
        self.requests
            .iter()
            .filter(|r| r.method == method && r.path.starts_with(prefix))
            .count()
    }
}

pub const MOCK_TX_ID: &str = "MOCKTXID";

/// Start a mock algod node answering the v2 endpoints the bridge uses.
pub async fn start_mock_algod(state: AlgodState) -> (SocketAddr, Arc<Mutex<AlgodState>>) {
    let state = Arc::new(Mutex::new(state));
    let shared = state.clone();

    let addr = start_programmable_backend(move |request: MockRequest| {
        let state = shared.clone();
        async move {
            let mut s = state.lock().unwrap();
            s.requests.push(request.clone());
            if s.unavailable {
                return (503, r#"{"message":"node is catching up"}"#.to_string());
            }

            let path = request.path.as_str();
            match (request.method.as_str(), path) {
                ("GET", "/health") => (200, "null".to_string()),
                ("POST", "/v2/transactions") => match &s.reject_with {
                    Some(message) => (400, serde_json::json!({ "message": message }).to_string()),
                    None => (200, serde_json::json!({ "txId": MOCK_TX_ID }).to_string()),
                },
                ("GET", "/v2/status") => (
                    200,
                    serde_json::json!({ "last-round": s.last_round }).to_string(),
                ),
                ("GET", p) if p.starts_with("/v2/status/wait-for-block-after/") => {
                    let round: u64 = p.rsplit('/').next().and_then(|r| r.parse().ok()).unwrap_or(0);
                    s.last_round = round + 1;
                    (200, serde_json::json!({ "last-round": s.last_round }).to_string())
                }
                ("GET", p) if p.starts_with("/v2/transactions/pending/") => {
                    let confirmed = s.confirm_at.filter(|at| s.last_round >= *at);
                    let mut body = serde_json::json!({ "pool-error": s.pool_error });
                    if let Some(round) = confirmed {
                        body["confirmed-round"] = round.into();
                    }
                    (200, body.to_string())
                }
                ("GET", p) if p.starts_with("/v2/accounts/") => {
                    let address = p.rsplit('/').next().unwrap_or_default();
                    let assets = s
                        .assets
                        .as_ref()
                        .map(|a| format!(r#","assets":{}"#, a))
                        .unwrap_or_default();
                    (
                        200,
                        format!(
                            r#"{{"address":"{}","amount":1000000,"min-balance":100000,"round":{}{}}}"#,
                            address, s.last_round, assets
                        ),
                    )
                }
                _ => (404, r#"{"message":"not found"}"#.to_string()),
            }
        }
    })
    .await;

    (addr, state)
}

pub fn node_config(addr: SocketAddr) -> NodeConfig {
    NodeConfig {
        url: format!("http://{}", addr),
        api_token: "test-token".to_string(),
        request_timeout_secs: 5,
        max_read_attempts: 2,
        retry_base_delay_ms: 1,
        retry_max_delay_ms: 5,
        ..NodeConfig::default()
    }
}

pub fn addr(n: u8) -> Address {
    Address::from_public_key([n; 32])
}

pub fn pay(from: Address, to: Address, amount: u64) -> Bytes {
    TransactionBuilder::payment(from, to, amount)
        .fee(1000)
        .validity(1000, 2000)
        .genesis_id("testnet-v1.0")
        .encode()
        .unwrap()
}

/// A signed envelope with a dummy signature.
pub fn presigned(unsigned: &Bytes) -> Bytes {
    attach_signature(unsigned, &[0x11; 64]).unwrap()
}

#[derive(Clone, Copy, PartialEq, Eq)]
pub enum SpyMode {
    Sign,
    Reject,
    /// Sign everything but return the blobs in reverse order.
    Reverse,
}

/// Provider that records every sign call and signs with a dummy signature.
pub struct SpyProvider {
    metadata: ProviderMetadata,
    accounts: Vec<String>,
    mode: SpyMode,
    pub calls: AtomicUsize,
    pub payloads: Mutex<Vec<Vec<Bytes>>>,
}

impl SpyProvider {
    pub fn new(id: ProviderId, accounts: &[Address], mode: SpyMode) -> Self {
        Self {
            metadata: ProviderMetadata {
                id,
                name: format!("spy-{}", id),
                is_walletconnect: id == ProviderId::WalletConnect,
            },
            accounts: accounts.iter().map(Address::to_string).collect(),
            mode,
            calls: AtomicUsize::new(0),
            payloads: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WalletProvider for SpyProvider {
    fn metadata(&self) -> &ProviderMetadata {
        &self.metadata
    }

    async fn connect(&self) -> WalletResult<Vec<WalletAccount>> {
        Ok(self
            .accounts
            .iter()
            .map(|address| WalletAccount {
                address: address.clone(),
                name: "spy".to_string(),
                provider_id: self.metadata.id,
            })
            .collect())
    }

    async fn reconnect(&self) -> WalletResult<Option<Wallet>> {
        Ok(None)
    }

    async fn disconnect(&self) -> WalletResult<()> {
        Err(WalletError::Provider("already closed".to_string()))
    }

    async fn sign(&self, transactions: &[Bytes]) -> WalletResult<SigningResult> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.payloads.lock().unwrap().push(transactions.to_vec());
        let signed = transactions
            .iter()
            .map(|t| attach_signature(t, &[0x22; 64]))
            .collect::<WalletResult<Vec<_>>>()?;
        match self.mode {
            SpyMode::Sign => Ok(SigningResult::Signed(signed)),
            SpyMode::Reject => Ok(SigningResult::rejected("user declined")),
            SpyMode::Reverse => Ok(SigningResult::Signed(signed.into_iter().rev().collect())),
        }
    }
}
