//! Registry of wallet clients and their live sessions.
//!
//! One client per provider id. A session exists for every provider that
//! has connected (or reconnected) and not yet disconnected; exactly one
//! provider may be marked active, and signing through the manager always
//! goes to it.
//!
//! Connect and disconnect calls on the same provider are not serialized.

use arc_swap::ArcSwapOption;
use bytes::Bytes;
use dashmap::DashMap;
use futures_util::future::join_all;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{WalletError, WalletResult};
use crate::provider::client::WalletClient;
use crate::provider::types::{ProviderId, Wallet, WalletAccount};

/// A connected provider's state.
#[derive(Debug, Clone)]
pub struct ProviderSession {
    pub id: Uuid,
    pub wallet: Wallet,
    /// Address of the account selected in this session.
    pub selected: Option<String>,
}

impl ProviderSession {
    fn new(wallet: Wallet) -> Self {
        let selected = wallet.accounts.first().map(|a| a.address.clone());
        Self {
            id: Uuid::new_v4(),
            wallet,
            selected,
        }
    }

    pub fn addresses(&self) -> Vec<String> {
        self.wallet
            .accounts
            .iter()
            .map(|a| a.address.clone())
            .collect()
    }
}

#[derive(Clone, Default)]
pub struct WalletManager {
    clients: Arc<DashMap<ProviderId, Arc<WalletClient>>>,
    sessions: Arc<DashMap<ProviderId, ProviderSession>>,
    active: Arc<ArcSwapOption<ProviderId>>,
}

impl WalletManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a client under its provider id, replacing any previous one.
    pub fn register(&self, client: WalletClient) -> Option<Arc<WalletClient>> {
        let id = client.provider_id();
        tracing::debug!(provider = %id, "Registering wallet client");
        self.clients.insert(id, Arc::new(client))
    }

    pub fn providers(&self) -> Vec<ProviderId> {
        let mut ids: Vec<ProviderId> = self.clients.iter().map(|entry| *entry.key()).collect();
        ids.sort_by_key(|id| id.as_str());
        ids
    }

    pub fn client(&self, id: ProviderId) -> WalletResult<Arc<WalletClient>> {
        self.clients
            .get(&id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| WalletError::UnknownProvider(id.to_string()))
    }

    pub fn session(&self, id: ProviderId) -> Option<ProviderSession> {
        self.sessions.get(&id).map(|entry| entry.value().clone())
    }

    /// Connect `id` and open a session. The first connected provider
    /// becomes active.
    pub async fn connect(&self, id: ProviderId) -> WalletResult<Wallet> {
        let client = self.client(id)?;
        let wallet = client.connect().await?;
        self.open_session(id, wallet.clone());
        Ok(wallet)
    }

    /// Disconnect `id` and drop its session. If `id` was active, the
    /// remaining session with the lowest provider id becomes active; with no
    /// sessions left there is no active provider.
    pub async fn disconnect(&self, id: ProviderId) -> WalletResult<()> {
        let client = self.client(id)?;
        client.disconnect().await;
        self.sessions.remove(&id);

        if self.active_provider() == Some(id) {
            let next = self
                .sessions
                .iter()
                .map(|entry| *entry.key())
                .min_by_key(|candidate| candidate.as_str());
            self.active.store(next.map(Arc::new));
            tracing::debug!(provider = %id, next = ?next, "Active provider disconnected");
        }
        Ok(())
    }

    /// Try to restore every registered provider concurrently. Returns the
    /// sessions that came back; failures are logged and skipped.
    pub async fn reconnect_providers(&self) -> Vec<Wallet> {
        let clients: Vec<(ProviderId, Arc<WalletClient>)> = self
            .clients
            .iter()
            .map(|entry| (*entry.key(), entry.value().clone()))
            .collect();

        let results = join_all(clients.iter().map(|(id, client)| async move {
            (*id, client.reconnect().await)
        }))
        .await;

        let mut restored = Vec::new();
        for (id, result) in results {
            match result {
                Ok(Some(wallet)) => {
                    self.open_session(id, wallet.clone());
                    restored.push(wallet);
                }
                Ok(None) => {}
                Err(e) => tracing::warn!(provider = %id, error = %e, "Reconnect failed"),
            }
        }
        restored
    }

    fn open_session(&self, id: ProviderId, wallet: Wallet) {
        let session = ProviderSession::new(wallet);
        tracing::info!(provider = %id, session_id = %session.id, "Session opened");
        self.sessions.insert(id, session);

        if self.active_provider().is_none() {
            self.active.store(Some(Arc::new(id)));
        }
    }

    pub fn set_active(&self, id: ProviderId) -> WalletResult<()> {
        if !self.sessions.contains_key(&id) {
            return Err(WalletError::NotConnected(id));
        }
        self.active.store(Some(Arc::new(id)));
        tracing::debug!(provider = %id, "Active provider changed");
        Ok(())
    }

    pub fn active_provider(&self) -> Option<ProviderId> {
        self.active.load_full().map(|id| *id)
    }

    /// Select `address` within the session of `id`.
    pub fn select_account(&self, id: ProviderId, address: &str) -> WalletResult<()> {
        let mut session = self
            .sessions
            .get_mut(&id)
            .ok_or(WalletError::NotConnected(id))?;

        if !session.wallet.accounts.iter().any(|a| a.address == address) {
            return Err(WalletError::UnknownAccount {
                provider: id,
                address: address.to_string(),
            });
        }
        session.selected = Some(address.to_string());
        Ok(())
    }

    /// Every connected account across all sessions, grouped by provider.
    pub fn accounts(&self) -> Vec<WalletAccount> {
        let mut sessions: Vec<(ProviderId, Vec<WalletAccount>)> = self
            .sessions
            .iter()
            .map(|entry| (*entry.key(), entry.value().wallet.accounts.clone()))
            .collect();
        sessions.sort_by_key(|(id, _)| id.as_str());
        sessions.into_iter().flat_map(|(_, accounts)| accounts).collect()
    }

    /// The selected account of the active provider.
    pub fn active_account(&self) -> Option<WalletAccount> {
        let id = self.active_provider()?;
        let session = self.sessions.get(&id)?;
        let selected = session.selected.as_deref()?;
        let account = session
            .wallet
            .accounts
            .iter()
            .find(|a| a.address == selected)
            .cloned();
        account
    }

    pub fn connected_addresses(&self, id: ProviderId) -> Vec<String> {
        self.sessions
            .get(&id)
            .map(|entry| entry.value().addresses())
            .unwrap_or_default()
    }

    /// Sign through the active provider, for its connected accounts.
    pub async fn sign_transactions(&self, transactions: &[Bytes]) -> WalletResult<Vec<Bytes>> {
        let id = self.active_provider().ok_or(WalletError::NoActiveProvider)?;
        let client = self.client(id)?;
        let addresses = self
            .session(id)
            .map(|session| session.addresses())
            .ok_or(WalletError::NotConnected(id))?;

        client.sign_transactions(&addresses, transactions).await
    }
}

impl std::fmt::Debug for WalletManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletManager")
            .field("providers", &self.providers())
            .field("sessions", &self.sessions.len())
            .field("active", &self.active_provider())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::types::{
        AccountInfo, HealthRecord, NodeError, NodeResult, NodeStatus, PendingTransaction,
    };
    use crate::node::NodeClient;
    use crate::provider::traits::WalletProvider;
    use crate::provider::types::{ProviderMetadata, SigningResult};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct NoNode;

    #[async_trait]
    impl NodeClient for NoNode {
        async fn send_raw_transactions(&self, _signed: &[Bytes]) -> NodeResult<String> {
            Err(NodeError::Rpc("offline".into()))
        }
        async fn account_information(&self, _address: &str) -> NodeResult<AccountInfo> {
            Err(NodeError::Rpc("offline".into()))
        }
        async fn status(&self) -> NodeResult<NodeStatus> {
            Err(NodeError::Rpc("offline".into()))
        }
        async fn status_after_block(&self, _round: u64) -> NodeResult<NodeStatus> {
            Err(NodeError::Rpc("offline".into()))
        }
        async fn pending_transaction(&self, _tx_id: &str) -> NodeResult<PendingTransaction> {
            Err(NodeError::Rpc("offline".into()))
        }
        async fn health_check(&self) -> NodeResult<HealthRecord> {
            Err(NodeError::Rpc("offline".into()))
        }
    }

    struct FixedProvider {
        metadata: ProviderMetadata,
        addresses: Vec<String>,
        restorable: bool,
        sign_calls: AtomicUsize,
    }

    impl FixedProvider {
        fn new(id: ProviderId, addresses: &[&str], restorable: bool) -> Self {
            Self {
                metadata: ProviderMetadata {
                    id,
                    name: id.to_string(),
                    is_walletconnect: id == ProviderId::WalletConnect,
                },
                addresses: addresses.iter().map(|a| a.to_string()).collect(),
                restorable,
                sign_calls: AtomicUsize::new(0),
            }
        }

        fn accounts(&self) -> Vec<WalletAccount> {
            self.addresses
                .iter()
                .enumerate()
                .map(|(i, address)| WalletAccount {
                    address: address.clone(),
                    name: format!("account {}", i),
                    provider_id: self.metadata.id,
                })
                .collect()
        }
    }

    #[async_trait]
    impl WalletProvider for FixedProvider {
        fn metadata(&self) -> &ProviderMetadata {
            &self.metadata
        }

        async fn connect(&self) -> WalletResult<Vec<WalletAccount>> {
            Ok(self.accounts())
        }

        async fn reconnect(&self) -> WalletResult<Option<Wallet>> {
            if !self.restorable {
                return Ok(None);
            }
            Ok(Some(Wallet {
                metadata: self.metadata.clone(),
                accounts: self.accounts(),
            }))
        }

        async fn disconnect(&self) -> WalletResult<()> {
            Ok(())
        }

        async fn sign(&self, _transactions: &[Bytes]) -> WalletResult<SigningResult> {
            self.sign_calls.fetch_add(1, Ordering::SeqCst);
            Ok(SigningResult::rejected("unused"))
        }
    }

    fn manager_with(providers: Vec<FixedProvider>) -> WalletManager {
        let manager = WalletManager::new();
        for provider in providers {
            manager.register(WalletClient::new(Arc::new(provider), Arc::new(NoNode)));
        }
        manager
    }

    #[tokio::test]
    async fn test_first_connect_becomes_active() {
        let manager = manager_with(vec![
            FixedProvider::new(ProviderId::Inkey, &["A1", "A2"], false),
            FixedProvider::new(ProviderId::Extension, &["B1"], false),
        ]);

        manager.connect(ProviderId::Inkey).await.unwrap();
        manager.connect(ProviderId::Extension).await.unwrap();

        assert_eq!(manager.active_provider(), Some(ProviderId::Inkey));
        assert_eq!(manager.active_account().unwrap().address, "A1");
        assert_eq!(manager.accounts().len(), 3);
        assert_eq!(manager.connected_addresses(ProviderId::Inkey), vec!["A1", "A2"]);
        assert!(manager.session(ProviderId::Inkey).is_some());
    }

    #[tokio::test]
    async fn test_select_and_switch() {
        let manager = manager_with(vec![
            FixedProvider::new(ProviderId::Inkey, &["A1", "A2"], false),
            FixedProvider::new(ProviderId::Extension, &["B1"], false),
        ]);
        manager.connect(ProviderId::Inkey).await.unwrap();

        assert!(matches!(
            manager.set_active(ProviderId::Extension),
            Err(WalletError::NotConnected(ProviderId::Extension))
        ));

        manager.select_account(ProviderId::Inkey, "A2").unwrap();
        assert_eq!(manager.active_account().unwrap().address, "A2");

        let err = manager.select_account(ProviderId::Inkey, "B1").unwrap_err();
        assert!(matches!(err, WalletError::UnknownAccount { .. }));

        manager.connect(ProviderId::Extension).await.unwrap();
        manager.set_active(ProviderId::Extension).unwrap();
        assert_eq!(manager.active_account().unwrap().address, "B1");
    }

    #[tokio::test]
    async fn test_disconnect_clears_active() {
        let manager = manager_with(vec![FixedProvider::new(ProviderId::Inkey, &["A1"], false)]);
        manager.connect(ProviderId::Inkey).await.unwrap();
        manager.disconnect(ProviderId::Inkey).await.unwrap();

        assert_eq!(manager.active_provider(), None);
        assert!(manager.accounts().is_empty());
        let err = manager
            .sign_transactions(&[Bytes::from_static(b"x")])
            .await
            .unwrap_err();
        assert!(matches!(err, WalletError::NoActiveProvider));
    }

    #[tokio::test]
    async fn test_disconnect_active_promotes_remaining_session() {
        let manager = manager_with(vec![
            FixedProvider::new(ProviderId::Inkey, &["A1"], false),
            FixedProvider::new(ProviderId::Extension, &["B1"], false),
            FixedProvider::new(ProviderId::WalletConnect, &["C1"], false),
        ]);
        manager.connect(ProviderId::WalletConnect).await.unwrap();
        manager.connect(ProviderId::Inkey).await.unwrap();
        manager.connect(ProviderId::Extension).await.unwrap();
        assert_eq!(manager.active_provider(), Some(ProviderId::WalletConnect));

        manager.disconnect(ProviderId::WalletConnect).await.unwrap();
        assert_eq!(manager.active_provider(), Some(ProviderId::Extension));
        assert_eq!(manager.active_account().unwrap().address, "B1");

        manager.disconnect(ProviderId::Inkey).await.unwrap();
        assert_eq!(manager.active_provider(), Some(ProviderId::Extension));
    }

    #[tokio::test]
    async fn test_unknown_provider() {
        let manager = WalletManager::new();
        let err = manager.connect(ProviderId::Local).await.unwrap_err();
        assert_eq!(err.to_string(), "Unknown provider: local");
    }

    #[tokio::test]
    async fn test_reconnect_providers() {
        let manager = manager_with(vec![
            FixedProvider::new(ProviderId::Inkey, &["A1"], true),
            FixedProvider::new(ProviderId::Extension, &["B1"], false),
            FixedProvider::new(ProviderId::WalletConnect, &["C1"], true),
        ]);

        let restored = manager.reconnect_providers().await;
        assert_eq!(restored.len(), 2);
        assert!(manager.session(ProviderId::Extension).is_none());
        assert!(manager.session(ProviderId::WalletConnect).is_some());
        assert!(manager.active_provider().is_some());
    }
}
