use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use alloy::primitives::Address;
use async_trait::async_trait;
use greendish_core::wallet::{InjectedProvider, ProviderError, ProviderEvent, ProviderEventHub, Subscription};
use log::info;

use crate::error::{ConnectorError, ConnectorResult};
use crate::wallet::keystore::Keystore;

struct WalletState {
    authorized: bool,
    selected: usize,
    chain_id: u64,
}

/// Injected-provider stand-in backed by a local [`Keystore`].
///
/// Account access is granted on the first `request_accounts` (or up front when
/// pre-authorized). Host-side controls (`select_account`, `lock`,
/// `switch_chain`) emit the same notifications a browser wallet would.
pub struct LocalWallet {
    keystore: Arc<Keystore>,
    networks: BTreeMap<u64, String>,
    state: Mutex<WalletState>,
    hub: ProviderEventHub,
}

impl LocalWallet {
    pub fn new(keystore: Arc<Keystore>, networks: BTreeMap<u64, String>, chain_id: u64) -> ConnectorResult<Self> {
        if !networks.contains_key(&chain_id) {
            return Err(ConnectorError::UnknownChain { chain_id });
        }
        Ok(Self {
            keystore,
            networks,
            state: Mutex::new(WalletState {
                authorized: false,
                selected: 0,
                chain_id,
            }),
            hub: ProviderEventHub::new(),
        })
    }

    /// Grants account access without waiting for a connect request.
    pub fn preauthorized(self) -> Self {
        if let Ok(mut state) = self.state.lock() {
            state.authorized = true;
        }
        self
    }

    pub fn keystore(&self) -> Arc<Keystore> {
        self.keystore.clone()
    }

    pub fn rpc_url(&self, chain_id: u64) -> Option<&str> {
        self.networks.get(&chain_id).map(String::as_str)
    }

    pub fn current_chain(&self) -> u64 {
        self.state.lock().map(|s| s.chain_id).unwrap_or_default()
    }

    /// Makes `account` the active account, as if chosen in the wallet UI.
    pub fn select_account(&self, account: Address) -> ConnectorResult<()> {
        let index = self
            .keystore
            .addresses()
            .iter()
            .position(|a| *a == account)
            .ok_or_else(|| ConnectorError::UnknownAccount {
                account: account.to_string(),
            })?;

        let authorized = {
            let mut state = self.lock_state()?;
            if state.selected == index {
                return Ok(());
            }
            state.selected = index;
            state.authorized
        };

        info!("Wallet account set to {account}");
        if authorized {
            self.hub.emit(ProviderEvent::AccountsChanged(self.ordered_accounts(index)));
        }
        Ok(())
    }

    /// Revokes account access; listeners see an empty account list.
    pub fn lock(&self) -> ConnectorResult<()> {
        let was_authorized = {
            let mut state = self.lock_state()?;
            std::mem::replace(&mut state.authorized, false)
        };
        if was_authorized {
            info!("Wallet locked");
            self.hub.emit(ProviderEvent::AccountsChanged(Vec::new()));
        }
        Ok(())
    }

    fn lock_state(&self) -> ConnectorResult<std::sync::MutexGuard<'_, WalletState>> {
        self.state
            .lock()
            .map_err(|_| ConnectorError::backend("wallet state poisoned"))
    }

    fn ordered_accounts(&self, selected: usize) -> Vec<Address> {
        let mut accounts = self.keystore.addresses();
        if selected < accounts.len() {
            let active = accounts.remove(selected);
            accounts.insert(0, active);
        }
        accounts
    }

    fn state_or_err(&self) -> Result<std::sync::MutexGuard<'_, WalletState>, ProviderError> {
        self.state
            .lock()
            .map_err(|_| ProviderError::Request("wallet state poisoned".to_string()))
    }

    fn grant(&self) -> Result<Vec<Address>, ProviderError> {
        let selected = {
            let mut state = self.state_or_err()?;
            state.authorized = true;
            state.selected
        };
        Ok(self.ordered_accounts(selected))
    }
}

#[async_trait]
impl InjectedProvider for LocalWallet {
    async fn request_accounts(&self) -> Result<Vec<Address>, ProviderError> {
        self.grant()
    }

    async fn accounts(&self) -> Result<Vec<Address>, ProviderError> {
        let (authorized, selected) = {
            let state = self.state_or_err()?;
            (state.authorized, state.selected)
        };
        Ok(if authorized {
            self.ordered_accounts(selected)
        } else {
            Vec::new()
        })
    }

    async fn chain_id(&self) -> Result<u64, ProviderError> {
        Ok(self.state_or_err()?.chain_id)
    }

    async fn switch_chain(&self, chain_id: u64) -> Result<(), ProviderError> {
        if !self.networks.contains_key(&chain_id) {
            return Err(ProviderError::UnrecognizedChain(chain_id));
        }

        let changed = {
            let mut state = self.state_or_err()?;
            std::mem::replace(&mut state.chain_id, chain_id) != chain_id
        };
        if changed {
            info!("Wallet switched to chain {chain_id}");
            self.hub.emit(ProviderEvent::ChainChanged(chain_id));
        }
        Ok(())
    }

    async fn request_permissions(&self) -> Result<Vec<Address>, ProviderError> {
        self.grant()
    }

    fn subscribe(&self) -> Subscription {
        self.hub.subscribe()
    }
}
