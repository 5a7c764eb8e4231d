use std::collections::BTreeMap;
use std::sync::Arc;

use alloy::primitives::Address;
use greendish_client::{EvmClient, GreenDishClient, RpcConfig, TxPolicyConfig};
use greendish_core::contract::{ContractClientFactory, ContractError, GreenDishContract};
use log::debug;

use crate::backend::greendish_backend::GreenDishBackendImpl;
use crate::contract::adapter::GreenDishContractAdapter;
use crate::wallet::keystore::Keystore;

/// Builds alloy-backed contract clients from the local keystore.
pub struct AlloyContractFactory {
    keystore: Arc<Keystore>,
    networks: BTreeMap<u64, String>,
    contract_address: Address,
    policy: TxPolicyConfig,
}

impl AlloyContractFactory {
    pub fn new(
        keystore: Arc<Keystore>,
        networks: BTreeMap<u64, String>,
        contract_address: Address,
        policy: TxPolicyConfig,
    ) -> Self {
        Self {
            keystore,
            networks,
            contract_address,
            policy,
        }
    }
}

impl ContractClientFactory for AlloyContractFactory {
    fn build(&self, signer: Address, chain_id: u64) -> Result<Arc<dyn GreenDishContract>, ContractError> {
        let key = self
            .keystore
            .signer(signer)
            .map_err(|e| ContractError::Rpc(e.to_string()))?;
        let rpc_url = self
            .networks
            .get(&chain_id)
            .ok_or_else(|| ContractError::Rpc(format!("no rpc endpoint configured for chain {chain_id}")))?;

        debug!("Building contract client for {signer} on chain {chain_id} via {rpc_url}");
        let rpc = RpcConfig {
            rpc_url: rpc_url.clone(),
            chain_id,
        };
        let client = EvmClient::new(rpc, key, self.policy.clone()).map_err(|e| ContractError::Rpc(e.to_string()))?;
        let backend = GreenDishBackendImpl::new(GreenDishClient::new(self.contract_address, client));

        let contract: Arc<dyn GreenDishContract> = Arc::new(GreenDishContractAdapter::new(Arc::new(backend)));
        Ok(contract)
    }
}
