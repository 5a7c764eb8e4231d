use std::sync::Arc;

use greendish_commons::secret_store::EnvSecretStore;
use greendish_connectors::contract::AlloyContractFactory;
use greendish_connectors::wallet::{Keystore, LocalWallet};
use greendish_core::contract::ContractClientFactory;
use greendish_core::reads::ReadAggregator;
use greendish_core::session::{Session, WalletSession};
use greendish_core::transactions::TransactionOrchestrator;
use greendish_core::wallet::InjectedProvider;
use log::{debug, info};

use crate::config::Config;
use crate::error::CliResult;

/// Everything a command needs: config, the local wallet and the live session.
pub struct AppContext {
    pub config: Arc<Config>,
    pub wallet: Option<Arc<LocalWallet>>,
    pub session: WalletSession,
}

impl AppContext {
    pub async fn init(connect: bool) -> CliResult<Self> {
        let config = Config::load(&EnvSecretStore).await?;
        Self::from_config(config, connect).await
    }

    pub async fn from_config(config: Arc<Config>, connect: bool) -> CliResult<Self> {
        let keystore = Arc::new(Keystore::from_hex_keys(&config.private_keys)?);

        let wallet = if keystore.is_empty() {
            debug!("No wallet keys configured");
            None
        } else {
            let wallet = LocalWallet::new(keystore.clone(), config.networks.clone(), config.chain_id)?;
            let wallet = if config.wallet_preauthorized {
                wallet.preauthorized()
            } else {
                wallet
            };
            Some(Arc::new(wallet))
        };

        let factory: Arc<dyn ContractClientFactory> = Arc::new(AlloyContractFactory::new(
            keystore,
            config.networks.clone(),
            config.contract_address,
            config.client_policy.clone(),
        ));
        let provider = wallet.clone().map(|w| w as Arc<dyn InjectedProvider>);

        let mut session = WalletSession::restore(provider, factory).await;
        if connect && !session.is_connected() {
            session.connect().await?;
        }
        if let Some(active) = session.session() {
            info!("Session ready for {} on chain {}", active.address(), active.chain_id());
        }

        Ok(Self {
            config,
            wallet,
            session,
        })
    }

    pub fn active(&self) -> CliResult<&Session> {
        Ok(self.session.require()?)
    }

    pub fn reads(&self) -> CliResult<ReadAggregator> {
        Ok(self.active()?.reads())
    }

    pub fn transactions(&self) -> CliResult<TransactionOrchestrator> {
        Ok(self.active()?.transactions(self.config.tx_policy.clone()))
    }
}
