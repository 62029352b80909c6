//! In-process ed25519 key wallet.
//!
//! # Security
//! - The seed is loaded ONLY from a hex string or an environment variable
//! - Key material is never logged or serialized

use async_trait::async_trait;
use bytes::Bytes;
use ed25519_dalek::{Signature, Signer, SigningKey, VerifyingKey};
use std::sync::atomic::{AtomicBool, Ordering};

use crate::config::LocalWalletConfig;
use crate::error::{WalletError, WalletResult};
use crate::provider::traits::WalletProvider;
use crate::provider::types::{ProviderId, ProviderMetadata, SigningResult, Wallet, WalletAccount};
use crate::transaction::address::Address;
use crate::transaction::decode::{decode_transaction, signing_payload};
use crate::transaction::encode::attach_signature;

/// Environment variable name for the hex-encoded seed.
pub const PRIVATE_KEY_ENV_VAR: &str = "WALLET_BRIDGE_PRIVATE_KEY";

const SEED_LENGTH: usize = 32;

/// A single-account wallet holding its signing key in memory.
pub struct LocalWallet {
    signing_key: SigningKey,
    address: Address,
    metadata: ProviderMetadata,
    connected: AtomicBool,
}

impl LocalWallet {
    /// Create a wallet from a hex-encoded 32-byte ed25519 seed
    /// (with or without `0x` prefix).
    pub fn from_seed_hex(seed_hex: &str) -> WalletResult<Self> {
        let seed_hex = seed_hex.trim();
        let seed_hex = seed_hex.strip_prefix("0x").unwrap_or(seed_hex);

        let seed = hex::decode(seed_hex)
            .map_err(|e| WalletError::Provider(format!("Invalid private key format: {}", e)))?;
        let seed: [u8; SEED_LENGTH] = seed.as_slice().try_into().map_err(|_| {
            WalletError::Provider(format!(
                "Invalid private key length: expected {} bytes, got {}",
                SEED_LENGTH,
                seed.len()
            ))
        })?;

        Ok(Self::from_seed(&seed))
    }

    pub fn from_seed(seed: &[u8; SEED_LENGTH]) -> Self {
        let signing_key = SigningKey::from_bytes(seed);
        let verifying_key: VerifyingKey = (&signing_key).into();
        let address = Address::from_public_key(verifying_key.to_bytes());

        tracing::info!(address = %address, "Local wallet initialized");

        Self {
            signing_key,
            address,
            metadata: ProviderMetadata {
                id: ProviderId::Local,
                name: "Local Key".to_string(),
                is_walletconnect: false,
            },
            connected: AtomicBool::new(false),
        }
    }

    /// Load the seed from `var`.
    pub fn from_env_var(var: &str) -> WalletResult<Self> {
        let seed = std::env::var(var).map_err(|_| {
            WalletError::Provider(format!("Environment variable {} not set", var))
        })?;
        Self::from_seed_hex(&seed)
    }

    /// Load the seed from `WALLET_BRIDGE_PRIVATE_KEY`.
    pub fn from_env() -> WalletResult<Self> {
        Self::from_env_var(PRIVATE_KEY_ENV_VAR)
    }

    /// Load the wallet as configured in `[local_wallet]`. Fails when the
    /// local wallet is not enabled.
    pub fn from_config(config: &LocalWalletConfig) -> WalletResult<Self> {
        if !config.enabled {
            return Err(WalletError::Provider(
                "Local wallet is disabled; set local_wallet.enabled = true".to_string(),
            ));
        }
        Self::from_env_var(&config.key_env_var)
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn account(&self) -> WalletAccount {
        WalletAccount {
            address: self.address.to_string(),
            name: "Local account".to_string(),
            provider_id: ProviderId::Local,
        }
    }

    fn sign_one(&self, unsigned: &[u8]) -> WalletResult<Result<Bytes, String>> {
        let decoded = decode_transaction(unsigned, false)?;
        if decoded.sender != self.address {
            return Ok(Err(format!(
                "transaction {} is not sent from {}",
                decoded.tx_id(),
                self.address
            )));
        }

        let signature: Signature = self.signing_key.sign(&signing_payload(unsigned));
        attach_signature(unsigned, &signature.to_bytes()).map(Ok)
    }
}

#[async_trait]
impl WalletProvider for LocalWallet {
    fn metadata(&self) -> &ProviderMetadata {
        &self.metadata
    }

    async fn connect(&self) -> WalletResult<Vec<WalletAccount>> {
        self.connected.store(true, Ordering::SeqCst);
        Ok(vec![self.account()])
    }

    async fn reconnect(&self) -> WalletResult<Option<Wallet>> {
        if !self.is_connected() {
            return Ok(None);
        }
        Ok(Some(Wallet {
            metadata: self.metadata.clone(),
            accounts: vec![self.account()],
        }))
    }

    async fn disconnect(&self) -> WalletResult<()> {
        self.connected.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn sign(&self, transactions: &[Bytes]) -> WalletResult<SigningResult> {
        if !self.is_connected() {
            return Ok(SigningResult::rejected("local wallet is not connected"));
        }

        let mut signed = Vec::with_capacity(transactions.len());
        for txn in transactions {
            match self.sign_one(txn)? {
                Ok(blob) => signed.push(blob),
                Err(reason) => return Ok(SigningResult::rejected(reason)),
            }
        }
        Ok(SigningResult::Signed(signed))
    }
}

impl std::fmt::Debug for LocalWallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalWallet")
            .field("address", &self.address)
            .field("connected", &self.is_connected())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transaction::decode::decode_any;
    use crate::transaction::encode::TransactionBuilder;
    use ed25519_dalek::Verifier;

    const SEED: &str = "9d61b19deffd5a60ba844af492ec2cc44449c5697b326919703bac031cae7f60";

    fn payment(sender: Address) -> Bytes {
        TransactionBuilder::payment(sender, Address::from_public_key([7u8; 32]), 1000)
            .fee(1000)
            .validity(10, 1010)
            .genesis_id("testnet-v1.0")
            .encode()
            .unwrap()
    }

    #[test]
    fn test_from_seed_hex() {
        let wallet = LocalWallet::from_seed_hex(&format!("0x{}", SEED)).unwrap();
        assert_eq!(wallet.address().to_string().len(), 58);

        assert!(LocalWallet::from_seed_hex("zz").is_err());
        let err = LocalWallet::from_seed_hex("abcd").unwrap_err();
        assert!(err.to_string().contains("expected 32 bytes"));
    }

    #[test]
    fn test_missing_env_var() {
        let err = LocalWallet::from_env_var("WALLET_BRIDGE_TEST_UNSET_VAR").unwrap_err();
        assert!(err.to_string().contains("WALLET_BRIDGE_TEST_UNSET_VAR"));
    }

    #[test]
    fn test_from_config_requires_enabled() {
        let var = "WALLET_BRIDGE_TEST_CONFIG_SEED";
        std::env::set_var(var, SEED);

        let mut config = LocalWalletConfig {
            enabled: false,
            key_env_var: var.to_string(),
        };
        let err = LocalWallet::from_config(&config).unwrap_err();
        assert!(err.to_string().contains("local_wallet.enabled"));

        config.enabled = true;
        let wallet = LocalWallet::from_config(&config).unwrap();
        assert_eq!(
            wallet.address(),
            LocalWallet::from_seed_hex(SEED).unwrap().address()
        );
    }

    #[test]
    fn test_debug_hides_key() {
        let wallet = LocalWallet::from_seed_hex(SEED).unwrap();
        let debug = format!("{:?}", wallet);
        assert!(!debug.contains(SEED));
        assert!(!debug.contains("signing_key"));
    }

    #[tokio::test]
    async fn test_sign_produces_valid_signature() {
        let wallet = LocalWallet::from_seed_hex(SEED).unwrap();
        wallet.connect().await.unwrap();
        let unsigned = payment(wallet.address());

        let result = wallet.sign(&[unsigned.clone()]).await.unwrap();
        let signed = match result {
            SigningResult::Signed(blobs) => blobs,
            other => panic!("unexpected result: {other:?}"),
        };
        assert_eq!(signed.len(), 1);

        let decoded = decode_any(&signed[0]).unwrap();
        assert!(decoded.is_signed);
        assert_eq!(decoded.sender, wallet.address());

        let entries = match rmpv::decode::read_value(&mut &signed[0][..]).unwrap() {
            rmpv::Value::Map(entries) => entries,
            other => panic!("unexpected value: {other:?}"),
        };
        let sig = entries
            .iter()
            .find(|(k, _)| k.as_str() == Some("sig"))
            .and_then(|(_, v)| v.as_slice())
            .unwrap();
        let signature = Signature::from_slice(sig).unwrap();
        let verifying_key = VerifyingKey::from_bytes(wallet.address().as_bytes()).unwrap();
        assert!(verifying_key
            .verify(&signing_payload(&unsigned), &signature)
            .is_ok());
    }

    #[tokio::test]
    async fn test_rejects_foreign_sender() {
        let wallet = LocalWallet::from_seed_hex(SEED).unwrap();
        wallet.connect().await.unwrap();

        let foreign = payment(Address::from_public_key([1u8; 32]));
        let result = wallet.sign(&[foreign]).await.unwrap();
        assert!(matches!(result, SigningResult::Rejected { .. }));
    }

    #[tokio::test]
    async fn test_rejects_when_disconnected() {
        let wallet = LocalWallet::from_seed_hex(SEED).unwrap();
        assert!(wallet.reconnect().await.unwrap().is_none());

        let result = wallet.sign(&[payment(wallet.address())]).await.unwrap();
        assert_eq!(
            result,
            SigningResult::rejected("local wallet is not connected")
        );

        wallet.connect().await.unwrap();
        let restored = wallet.reconnect().await.unwrap().unwrap();
        assert_eq!(restored.accounts.len(), 1);
    }
}
