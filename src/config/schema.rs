//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from TOML files.

use serde::{Deserialize, Serialize};

/// Root configuration for the wallet bridge.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct BridgeConfig {
    /// Ledger node connection.
    pub node: NodeConfig,

    /// Confirmation polling.
    pub confirmation: ConfirmationConfig,

    /// Inkey microwallet frame.
    pub inkey: InkeyConfig,

    /// Local key wallet.
    pub local_wallet: LocalWalletConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Node RPC configuration.
#[derive(Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NodeConfig {
    /// Primary node URL.
    pub url: String,

    /// Fallback node URLs, tried in order for read-only requests.
    pub failover_urls: Vec<String>,

    /// Value of the `X-Algo-API-Token` header.
    pub api_token: String,

    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,

    /// Attempts per endpoint for read-only requests.
    pub max_read_attempts: u32,

    /// Base delay for exponential backoff in milliseconds.
    pub retry_base_delay_ms: u64,

    /// Maximum backoff delay in milliseconds.
    pub retry_max_delay_ms: u64,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:4001".to_string(),
            failover_urls: Vec::new(),
            api_token: String::new(),
            request_timeout_secs: 10,
            max_read_attempts: 3,
            retry_base_delay_ms: 100,
            retry_max_delay_ms: 2000,
        }
    }
}

impl std::fmt::Debug for NodeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeConfig")
            .field("url", &self.url)
            .field("failover_urls", &self.failover_urls)
            .field("api_token", &if self.api_token.is_empty() { "" } else { "<redacted>" })
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("max_read_attempts", &self.max_read_attempts)
            .finish()
    }
}

/// Confirmation polling configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ConfirmationConfig {
    /// Rounds to wait for inclusion before giving up.
    pub wait_rounds: u64,

    /// Optional wall-clock limit in seconds on top of the round limit.
    pub deadline_secs: Option<u64>,
}

impl Default for ConfirmationConfig {
    fn default() -> Self {
        Self {
            wait_rounds: 4,
            deadline_secs: None,
        }
    }
}

/// Inkey microwallet configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct InkeyConfig {
    /// URL the host loads the wallet frame from.
    pub frame_url: String,
}

impl Default for InkeyConfig {
    fn default() -> Self {
        Self {
            frame_url: "http://127.0.0.1:5200".to_string(),
        }
    }
}

/// Local key wallet configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LocalWalletConfig {
    /// Enable the local key wallet.
    pub enabled: bool,

    /// Environment variable holding the hex-encoded ed25519 seed.
    pub key_env_var: String,
}

impl Default for LocalWalletConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            key_env_var: crate::provider::local::PRIVATE_KEY_ENV_VAR.to_string(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error), overridden by `RUST_LOG`.
    pub log_level: String,

    /// Record metrics through the `metrics` facade.
    pub metrics_enabled: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: true,
        }
    }
}
