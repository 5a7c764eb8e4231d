use std::fmt;
use std::sync::Arc;

use alloy::primitives::Address;
use log::{debug, info, warn};
use tracing::instrument;

use crate::contract::{ContractClientFactory, GreenDishContract};
use crate::error::{SessionError, SessionResult};
use crate::model::truncate_address;
use crate::reads::ReadAggregator;
use crate::transactions::{TransactionOrchestrator, TxPolicy};
use crate::wallet::{InjectedProvider, ProviderEvent, Subscription};

/// A connected account with a contract client bound to it.
#[derive(Clone)]
pub struct Session {
    address: Address,
    chain_id: u64,
    is_restaurant: bool,
    client: Arc<dyn GreenDishContract>,
}

impl Session {
    pub fn address(&self) -> Address {
        self.address
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    pub fn is_restaurant(&self) -> bool {
        self.is_restaurant
    }

    pub fn client(&self) -> Arc<dyn GreenDishContract> {
        self.client.clone()
    }

    pub fn reads(&self) -> ReadAggregator {
        ReadAggregator::new(self.client.clone())
    }

    pub fn transactions(&self, policy: TxPolicy) -> TransactionOrchestrator {
        TransactionOrchestrator::for_session(self, policy)
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("address", &self.address)
            .field("chain_id", &self.chain_id)
            .field("is_restaurant", &self.is_restaurant)
            .finish_non_exhaustive()
    }
}

/// What a provider notification did to the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionChange {
    Unchanged,
    AccountSwitched { from: Address, to: Address },
    Disconnected,
    /// Session state was discarded and silently re-established where possible.
    Reloaded { chain_id: Option<u64> },
}

struct ActiveSession {
    session: Session,
    subscription: Subscription,
}

/// Owns the connection lifecycle between the wallet provider and the contract client.
///
/// Either fully connected (account, client and role all set) or fully
/// disconnected. Provider listeners live exactly as long as the connection.
pub struct WalletSession {
    provider: Option<Arc<dyn InjectedProvider>>,
    factory: Arc<dyn ContractClientFactory>,
    active: Option<ActiveSession>,
}

impl WalletSession {
    pub fn new(provider: Option<Arc<dyn InjectedProvider>>, factory: Arc<dyn ContractClientFactory>) -> Self {
        Self {
            provider,
            factory,
            active: None,
        }
    }

    /// Builds a session and reconnects silently if the provider already
    /// authorizes an account.
    pub async fn restore(provider: Option<Arc<dyn InjectedProvider>>, factory: Arc<dyn ContractClientFactory>) -> Self {
        let mut session = Self::new(provider, factory);
        session.reconnect_silently().await;
        session
    }

    pub fn session(&self) -> Option<&Session> {
        self.active.as_ref().map(|a| &a.session)
    }

    pub fn require(&self) -> SessionResult<&Session> {
        self.session().ok_or(SessionError::NotConnected)
    }

    pub fn is_connected(&self) -> bool {
        self.active.is_some()
    }

    pub fn address(&self) -> Option<Address> {
        self.session().map(Session::address)
    }

    pub fn is_restaurant(&self) -> bool {
        self.session().is_some_and(Session::is_restaurant)
    }

    pub fn has_provider(&self) -> bool {
        self.provider.is_some()
    }

    #[instrument(name = "session.connect", skip_all, err)]
    pub async fn connect(&mut self) -> SessionResult<&Session> {
        let provider = self.provider.clone().ok_or(SessionError::ProviderMissing)?;

        let accounts = provider.request_accounts().await.map_err(SessionError::provider)?;
        let address = accounts.first().copied().ok_or(SessionError::NoAccounts)?;
        let chain_id = provider.chain_id().await.map_err(SessionError::provider)?;

        let session = self.open(address, chain_id).await?;

        // Listeners of a previous connection must not outlive it.
        self.disconnect();
        let subscription = provider.subscribe();
        info!(
            "Connected {} on chain {chain_id} (restaurant: {})",
            truncate_address(&address),
            session.is_restaurant
        );

        let active = self.active.insert(ActiveSession { session, subscription });
        Ok(&active.session)
    }

    /// Clears all session state. Safe to call when already disconnected.
    pub fn disconnect(&mut self) {
        if let Some(active) = self.active.take() {
            active.subscription.unsubscribe();
            info!("Disconnected {}", truncate_address(&active.session.address));
        }
    }

    /// Re-reads the restaurant role, e.g. after a registration confirms.
    pub async fn refresh_role(&mut self) -> SessionResult<bool> {
        let active = self.active.as_mut().ok_or(SessionError::NotConnected)?;
        let is_restaurant = Self::resolve_role(active.session.client.as_ref(), active.session.address).await;
        active.session.is_restaurant = is_restaurant;
        Ok(is_restaurant)
    }

    /// Applies every notification already delivered by the provider.
    pub async fn process_events(&mut self) -> Vec<SessionChange> {
        let mut pending = Vec::new();
        if let Some(active) = self.active.as_mut() {
            while let Some(event) = active.subscription.try_next() {
                pending.push(event);
            }
        }

        let mut changes = Vec::with_capacity(pending.len());
        for event in pending {
            changes.push(self.handle_event(event).await);
        }
        changes
    }

    pub async fn handle_event(&mut self, event: ProviderEvent) -> SessionChange {
        debug!("Provider event: {event:?}");
        match event {
            ProviderEvent::AccountsChanged(accounts) => self.on_accounts_changed(accounts).await,
            ProviderEvent::ChainChanged(chain_id) => {
                info!("Chain changed to {chain_id}, reloading session");
                self.reload().await
            }
        }
    }

    #[instrument(name = "session.switch_chain", skip(self), err)]
    pub async fn switch_chain(&mut self, chain_id: u64) -> SessionResult<SessionChange> {
        let provider = self.provider.clone().ok_or(SessionError::ProviderMissing)?;
        provider.switch_chain(chain_id).await.map_err(SessionError::provider)?;
        Ok(self.reload().await)
    }

    /// Asks the wallet to re-grant account access, then rebuilds the session
    /// from whatever account it now exposes.
    #[instrument(name = "session.reset_permissions", skip_all, err)]
    pub async fn reset_permissions(&mut self) -> SessionResult<SessionChange> {
        let provider = self.provider.clone().ok_or(SessionError::ProviderMissing)?;
        provider.request_permissions().await.map_err(SessionError::provider)?;
        Ok(self.reload().await)
    }

    async fn on_accounts_changed(&mut self, accounts: Vec<Address>) -> SessionChange {
        let Some(next) = accounts.first().copied() else {
            info!("Wallet revoked all accounts");
            self.disconnect();
            return SessionChange::Disconnected;
        };
        let Some(active) = self.active.as_ref() else {
            return SessionChange::Unchanged;
        };

        let current = active.session.address;
        if current == next {
            return SessionChange::Unchanged;
        }

        // The new account gets its own client and role before anything can use it.
        match self.open(next, active.session.chain_id).await {
            Ok(session) => {
                if let Some(active) = self.active.as_mut() {
                    active.session = session;
                }
                info!(
                    "Account switched {} -> {}",
                    truncate_address(&current),
                    truncate_address(&next)
                );
                SessionChange::AccountSwitched { from: current, to: next }
            }
            Err(err) => {
                warn!("Could not rebind session to {next}: {err}");
                self.disconnect();
                SessionChange::Disconnected
            }
        }
    }

    async fn reload(&mut self) -> SessionChange {
        self.disconnect();
        self.reconnect_silently().await;
        SessionChange::Reloaded {
            chain_id: self.session().map(Session::chain_id),
        }
    }

    async fn reconnect_silently(&mut self) -> bool {
        let Some(provider) = self.provider.clone() else {
            return false;
        };

        match provider.accounts().await {
            Ok(accounts) if !accounts.is_empty() => match self.connect().await {
                Ok(_) => true,
                Err(err) => {
                    warn!("Silent reconnect failed: {err}");
                    false
                }
            },
            Ok(_) => false,
            Err(err) => {
                warn!("Could not query authorized accounts: {err}");
                false
            }
        }
    }

    async fn open(&self, address: Address, chain_id: u64) -> SessionResult<Session> {
        let client = self
            .factory
            .build(address, chain_id)
            .map_err(|source| SessionError::ClientBuild { account: address, source })?;
        let is_restaurant = Self::resolve_role(client.as_ref(), address).await;

        Ok(Session {
            address,
            chain_id,
            is_restaurant,
            client,
        })
    }

    async fn resolve_role(client: &dyn GreenDishContract, address: Address) -> bool {
        match client.is_verified_restaurant(address).await {
            Ok(verified) => verified,
            Err(err) => {
                warn!("Restaurant check failed for {address}, treating as customer: {err}");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::contract::{ContractError, MockContractClientFactory, MockGreenDishContract};
    use crate::model::{RestaurantInfo, SupplySource};
    use crate::testing::{FakeFactory, FakeWallet, Ledger, account};
    use crate::wallet::MockInjectedProvider;

    fn ledger_with_restaurant(restaurant: Address) -> Arc<Mutex<Ledger>> {
        let mut ledger = Ledger::default();
        ledger.restaurants.insert(
            restaurant,
            RestaurantInfo {
                supply_source: SupplySource::GreenProducer,
                supply_details: "rooftop garden".into(),
                is_registered: true,
            },
        );
        Arc::new(Mutex::new(ledger))
    }

    #[tokio::test]
    async fn connect_without_provider_fails_and_stays_disconnected() {
        let mut wallet = WalletSession::new(None, Arc::new(FakeFactory::default()));

        let err = wallet.connect().await.unwrap_err();

        assert!(matches!(err, SessionError::ProviderMissing));
        assert!(!wallet.is_connected());
    }

    #[tokio::test]
    async fn connect_with_no_accounts_fails() {
        let provider = Arc::new(FakeWallet::new(vec![]));
        let mut wallet = WalletSession::new(Some(provider), Arc::new(FakeFactory::default()));

        let err = wallet.connect().await.unwrap_err();

        assert!(matches!(err, SessionError::NoAccounts));
        assert!(wallet.session().is_none());
    }

    #[tokio::test]
    async fn connect_binds_first_account_and_resolves_role() {
        // given
        let restaurant = account(1);
        let factory = Arc::new(FakeFactory::new(ledger_with_restaurant(restaurant)));
        let provider = Arc::new(FakeWallet::new(vec![restaurant, account(2)]));
        let mut wallet = WalletSession::new(Some(provider.clone()), factory.clone());

        // when
        let session = wallet.connect().await.unwrap();

        // then
        assert_eq!(session.address(), restaurant);
        assert_eq!(session.chain_id(), 31337);
        assert!(session.is_restaurant());
        assert_eq!(session.client().signer(), restaurant);
        assert_eq!(factory.builds(), vec![restaurant]);
        assert_eq!(provider.hub.listener_count(), 1);
    }

    #[tokio::test]
    async fn failed_role_check_means_customer() {
        let mut factory = MockContractClientFactory::new();
        factory.expect_build().returning(|signer, _| {
            let mut client = MockGreenDishContract::new();
            client.expect_signer().return_const(signer);
            client
                .expect_is_verified_restaurant()
                .returning(|_| Err(ContractError::Rpc("node down".into())));
            let client: Arc<dyn GreenDishContract> = Arc::new(client);
            Ok(client)
        });
        let provider = Arc::new(FakeWallet::new(vec![account(3)]));
        let mut wallet = WalletSession::new(Some(provider), Arc::new(factory));

        let session = wallet.connect().await.unwrap();

        assert!(!session.is_restaurant());
    }

    #[tokio::test]
    async fn rejected_connect_reports_user_rejection() {
        let mut provider = MockInjectedProvider::new();
        provider
            .expect_request_accounts()
            .returning(|| Err(crate::wallet::ProviderError::UserRejected));
        let mut wallet = WalletSession::new(Some(Arc::new(provider)), Arc::new(FakeFactory::default()));

        let err = wallet.connect().await.unwrap_err();

        assert!(err.is_user_rejection());
        assert!(!wallet.is_connected());
    }

    #[tokio::test]
    async fn disconnect_clears_state_and_listeners() {
        let provider = Arc::new(FakeWallet::new(vec![account(1)]));
        let mut wallet = WalletSession::new(Some(provider.clone()), Arc::new(FakeFactory::default()));
        wallet.connect().await.unwrap();

        wallet.disconnect();
        wallet.disconnect();

        assert!(!wallet.is_connected());
        assert!(!wallet.is_restaurant());
        assert_eq!(wallet.address(), None);
        assert_eq!(provider.hub.listener_count(), 0);
    }

    #[tokio::test]
    async fn reconnecting_keeps_a_single_listener() {
        let provider = Arc::new(FakeWallet::new(vec![account(1)]));
        let mut wallet = WalletSession::new(Some(provider.clone()), Arc::new(FakeFactory::default()));

        wallet.connect().await.unwrap();
        wallet.connect().await.unwrap();

        assert_eq!(provider.hub.listener_count(), 1);
    }

    #[tokio::test]
    async fn empty_accounts_event_disconnects() {
        let provider = Arc::new(FakeWallet::new(vec![account(1)]));
        let mut wallet = WalletSession::new(Some(provider.clone()), Arc::new(FakeFactory::default()));
        wallet.connect().await.unwrap();

        provider.set_accounts(vec![]);
        let changes = wallet.process_events().await;

        assert_eq!(changes, vec![SessionChange::Disconnected]);
        assert!(!wallet.is_connected());
    }

    #[tokio::test]
    async fn account_switch_rebinds_client_and_role() {
        // given
        let customer = account(1);
        let restaurant = account(2);
        let factory = Arc::new(FakeFactory::new(ledger_with_restaurant(restaurant)));
        let provider = Arc::new(FakeWallet::new(vec![customer]));
        let mut wallet = WalletSession::new(Some(provider.clone()), factory.clone());
        wallet.connect().await.unwrap();
        assert!(!wallet.is_restaurant());

        // when
        provider.set_accounts(vec![restaurant]);
        let changes = wallet.process_events().await;

        // then
        assert_eq!(
            changes,
            vec![SessionChange::AccountSwitched {
                from: customer,
                to: restaurant
            }]
        );
        let session = wallet.session().unwrap();
        assert_eq!(session.address(), restaurant);
        assert_eq!(session.client().signer(), restaurant);
        assert!(session.is_restaurant());
        assert_eq!(factory.builds(), vec![customer, restaurant]);
    }

    #[tokio::test]
    async fn same_account_event_is_a_no_op() {
        let factory = Arc::new(FakeFactory::default());
        let provider = Arc::new(FakeWallet::new(vec![account(1)]));
        let mut wallet = WalletSession::new(Some(provider.clone()), factory.clone());
        wallet.connect().await.unwrap();

        provider.set_accounts(vec![account(1), account(4)]);

        assert_eq!(wallet.process_events().await, vec![SessionChange::Unchanged]);
        assert_eq!(factory.builds().len(), 1);
    }

    #[tokio::test]
    async fn failed_rebind_disconnects() {
        let mut factory = FakeFactory::default();
        factory.failing_signers.insert(account(9));
        let provider = Arc::new(FakeWallet::new(vec![account(1)]));
        let mut wallet = WalletSession::new(Some(provider.clone()), Arc::new(factory));
        wallet.connect().await.unwrap();

        provider.set_accounts(vec![account(9)]);

        assert_eq!(wallet.process_events().await, vec![SessionChange::Disconnected]);
        assert!(!wallet.is_connected());
    }

    #[tokio::test]
    async fn chain_change_reloads_the_session() {
        let factory = Arc::new(FakeFactory::default());
        let provider = Arc::new(FakeWallet::new(vec![account(1)]));
        let mut wallet = WalletSession::new(Some(provider.clone()), factory.clone());
        wallet.connect().await.unwrap();

        provider.change_chain(1337);
        let changes = wallet.process_events().await;

        assert_eq!(changes, vec![SessionChange::Reloaded { chain_id: Some(1337) }]);
        assert_eq!(wallet.session().unwrap().chain_id(), 1337);
        assert_eq!(factory.builds().len(), 2);
        assert_eq!(provider.hub.listener_count(), 1);
    }

    #[tokio::test]
    async fn restore_reconnects_only_when_already_authorized() {
        let fresh = Arc::new(FakeWallet::new(vec![account(1)]));
        let wallet = WalletSession::restore(Some(fresh), Arc::new(FakeFactory::default())).await;
        assert!(!wallet.is_connected());

        let authorized = Arc::new(FakeWallet::new(vec![account(1)]).authorized());
        let wallet = WalletSession::restore(Some(authorized), Arc::new(FakeFactory::default())).await;
        assert_eq!(wallet.address(), Some(account(1)));
    }

    #[tokio::test]
    async fn switch_chain_reloads_once() {
        let provider = Arc::new(FakeWallet::new(vec![account(1)]));
        let mut wallet = WalletSession::new(Some(provider.clone()), Arc::new(FakeFactory::default()));
        wallet.connect().await.unwrap();

        let change = wallet.switch_chain(1337).await.unwrap();

        assert_eq!(change, SessionChange::Reloaded { chain_id: Some(1337) });
        assert!(wallet.process_events().await.is_empty());
    }

    #[tokio::test]
    async fn switch_to_unknown_chain_surfaces_provider_error() {
        let provider = Arc::new(FakeWallet::new(vec![account(1)]));
        let mut wallet = WalletSession::new(Some(provider), Arc::new(FakeFactory::default()));
        wallet.connect().await.unwrap();

        let err = wallet.switch_chain(0).await.unwrap_err();

        assert!(matches!(
            err,
            SessionError::Provider {
                source: crate::wallet::ProviderError::UnrecognizedChain(0)
            }
        ));
        assert!(wallet.is_connected());
    }

    #[tokio::test]
    async fn refresh_role_picks_up_new_registration() {
        let ledger = Arc::new(Mutex::new(Ledger::default()));
        let provider = Arc::new(FakeWallet::new(vec![account(5)]));
        let mut wallet = WalletSession::new(Some(provider), Arc::new(FakeFactory::new(ledger.clone())));
        wallet.connect().await.unwrap();
        assert!(!wallet.is_restaurant());

        ledger
            .lock()
            .unwrap()
            .restaurants
            .insert(account(5), RestaurantInfo::unavailable());

        assert!(wallet.refresh_role().await.unwrap());
        assert!(wallet.is_restaurant());
    }
}
