use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::Address;
use greendish_client::TxPolicyConfig;
use greendish_commons::env::{EnvError, flag, parse_or, require};
use greendish_commons::error::{CodedError, ErrorCode};
use greendish_commons::secret_store::{SecretError, SecretStore};
use greendish_core::amount::parse_ether;
use greendish_core::transactions::TxPolicy;
use log::debug;
use thiserror::Error;

pub const PRIVATE_KEYS_VAR: &str = "GREENDISH_PRIVATE_KEYS";
const DEFAULT_CHAIN_ID: u64 = 31337;

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required env var {var}")]
    MissingEnv { var: &'static str },
    #[error("invalid value for {var}: {reason}")]
    InvalidValue { var: &'static str, reason: String },
    #[error("could not read wallet keys")]
    Secret {
        #[source]
        source: SecretError,
    },
}

impl ConfigError {
    fn invalid(var: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::InvalidValue {
            var,
            reason: reason.into(),
        }
    }
}

impl From<EnvError> for ConfigError {
    fn from(value: EnvError) -> Self {
        match value {
            EnvError::Missing(var) => ConfigError::MissingEnv { var },
            EnvError::Invalid { var, value } => ConfigError::invalid(var, format!("{value:?}")),
        }
    }
}

impl CodedError for ConfigError {
    fn code(&self) -> ErrorCode {
        match self {
            ConfigError::MissingEnv { .. } => ErrorCode::ConfigMissingEnv,
            ConfigError::InvalidValue { .. } => ErrorCode::ConfigInvalidValue,
            ConfigError::Secret { .. } => ErrorCode::ConfigSecret,
        }
    }
}

pub struct Config {
    pub rpc_url: String,
    pub chain_id: u64,
    pub contract_address: Address,
    /// Hex keys forming the local wallet. Empty means no wallet is available.
    pub private_keys: Vec<String>,
    /// Every chain the wallet may switch to, including `chain_id`.
    pub networks: BTreeMap<u64, String>,
    pub wallet_preauthorized: bool,
    pub tx_policy: TxPolicy,
    pub client_policy: TxPolicyConfig,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("rpc_url", &self.rpc_url)
            .field("chain_id", &self.chain_id)
            .field("contract_address", &self.contract_address)
            .field("private_keys", &format_args!("<{} keys>", self.private_keys.len()))
            .field("networks", &self.networks)
            .field("wallet_preauthorized", &self.wallet_preauthorized)
            .field("tx_policy", &self.tx_policy)
            .field("client_policy", &self.client_policy)
            .finish()
    }
}

impl Config {
    pub async fn load(secrets: &dyn SecretStore) -> ConfigResult<Arc<Self>> {
        let rpc_url = require("GREENDISH_RPC_URL")?;
        let chain_id = parse_or("GREENDISH_CHAIN_ID", DEFAULT_CHAIN_ID)?;

        let contract_raw = require("GREENDISH_CONTRACT_ADDRESS")?;
        let contract_address: Address = contract_raw
            .trim()
            .parse()
            .map_err(|e| ConfigError::invalid("GREENDISH_CONTRACT_ADDRESS", format!("{contract_raw}: {e}")))?;

        let private_keys = match secrets.get_secret_list(PRIVATE_KEYS_VAR).await {
            Ok(keys) => keys,
            Err(SecretError::NotFound(_)) => {
                debug!("{PRIVATE_KEYS_VAR} not set, running without a wallet");
                vec![]
            }
            Err(source) => return Err(ConfigError::Secret { source }),
        };

        let mut networks = match std::env::var("GREENDISH_NETWORKS") {
            Ok(raw) => parse_networks(&raw)?,
            Err(_) => BTreeMap::new(),
        };
        networks.insert(chain_id, rpc_url.clone());

        let wallet_preauthorized = flag("GREENDISH_WALLET_PREAUTHORIZED", false)?;

        let defaults = TxPolicy::default();
        let gas_limit_multiplier_bps = parse_or("GREENDISH_GAS_MULTIPLIER_BPS", defaults.gas_limit_multiplier_bps)?;
        if gas_limit_multiplier_bps < 10_000 {
            return Err(ConfigError::invalid(
                "GREENDISH_GAS_MULTIPLIER_BPS",
                format!("{gas_limit_multiplier_bps} would shrink the estimate"),
            ));
        }
        let confirm_timeout_secs = parse_or(
            "GREENDISH_CONFIRM_TIMEOUT_SECS",
            defaults.confirmation_timeout.as_secs(),
        )?;
        let registration_deposit = ether_or("GREENDISH_REGISTRATION_DEPOSIT", "10")?;
        let registration_gas_margin = ether_or("GREENDISH_REGISTRATION_GAS_MARGIN", "0.1")?;

        let tx_policy = TxPolicy {
            gas_limit_multiplier_bps,
            confirmation_timeout: Duration::from_secs(confirm_timeout_secs),
            registration_deposit,
            registration_gas_margin,
            ..defaults
        };

        let client_policy = TxPolicyConfig {
            max_fee_per_gas_wei: optional("GREENDISH_MAX_FEE_PER_GAS_WEI")?,
            max_priority_fee_per_gas_wei: optional("GREENDISH_MAX_PRIORITY_FEE_PER_GAS_WEI")?,
            receipt_poll_interval_ms: parse_or(
                "GREENDISH_RECEIPT_POLL_MS",
                TxPolicyConfig::default().receipt_poll_interval_ms,
            )?,
        };

        debug!(
            "Loaded config for chain {chain_id}, contract {contract_address}, {} wallet keys",
            private_keys.len()
        );

        Ok(Arc::new(Config {
            rpc_url,
            chain_id,
            contract_address,
            private_keys,
            networks,
            wallet_preauthorized,
            tx_policy,
            client_policy,
        }))
    }
}

/// Parses `chainId=url` pairs separated by commas.
pub fn parse_networks(raw: &str) -> ConfigResult<BTreeMap<u64, String>> {
    let mut networks = BTreeMap::new();
    for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let (chain, url) = entry
            .split_once('=')
            .ok_or_else(|| ConfigError::invalid("GREENDISH_NETWORKS", format!("expected chainId=url, got {entry}")))?;
        let chain_id: u64 = chain
            .trim()
            .parse()
            .map_err(|_| ConfigError::invalid("GREENDISH_NETWORKS", format!("bad chain id {chain:?}")))?;
        let url = url.trim();
        if url.is_empty() {
            return Err(ConfigError::invalid(
                "GREENDISH_NETWORKS",
                format!("chain {chain_id} has no url"),
            ));
        }
        networks.insert(chain_id, url.to_string());
    }
    Ok(networks)
}

fn ether_or(var: &'static str, default: &str) -> ConfigResult<alloy::primitives::U256> {
    let raw = std::env::var(var)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string());
    parse_ether(&raw).map_err(|e| ConfigError::invalid(var, e.to_string()))
}

fn optional(var: &'static str) -> ConfigResult<Option<u128>> {
    match std::env::var(var) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::invalid(var, format!("{raw:?}"))),
        _ => Ok(None),
    }
}
