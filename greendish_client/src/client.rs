// Core EVM client: signer-bound provider, fees and receipt tracking

use crate::{config::*, errors::EvmError, types::*};
use alloy::{
    network::EthereumWallet,
    providers::{DynProvider, Provider, ProviderBuilder},
};
use log::debug;

#[derive(Clone)]
pub struct EvmClient {
    pub provider: DynProvider,
    pub from: Address,
    pub chain_id: u64,
    pub policy: TxPolicyConfig,
    pub wallet: EthereumWallet,
}

impl EvmClient {
    pub fn new(rpc: RpcConfig, signer: PrivateKeySigner, policy: TxPolicyConfig) -> Result<Self, EvmError> {
        let from = signer.address();
        let wallet = EthereumWallet::from(signer);
        let url = rpc
            .rpc_url
            .parse()
            .map_err(|e| EvmError::Other(format!("invalid rpc url {}: {e}", rpc.rpc_url)))?;
        let provider = ProviderBuilder::new().wallet(wallet.clone()).connect_http(url);

        Ok(Self {
            provider: provider.erased(),
            from,
            chain_id: rpc.chain_id,
            policy,
            wallet,
        })
    }

    pub async fn native_balance(&self, account: Address) -> Result<U256, EvmError> {
        Ok(self.provider.get_balance(account).await?)
    }

    /// Current EIP-1559 fee caps, with any configured overrides applied.
    pub async fn fees(&self) -> Result<Eip1559Fees, EvmError> {
        if let (Some(max_fee_per_gas), Some(max_priority_fee_per_gas)) =
            (self.policy.max_fee_per_gas_wei, self.policy.max_priority_fee_per_gas_wei)
        {
            return Ok(Eip1559Fees {
                max_fee_per_gas,
                max_priority_fee_per_gas,
            });
        }

        let estimate = self.provider.estimate_eip1559_fees().await?;
        Ok(Eip1559Fees {
            max_fee_per_gas: self.policy.max_fee_per_gas_wei.unwrap_or(estimate.max_fee_per_gas),
            max_priority_fee_per_gas: self
                .policy
                .max_priority_fee_per_gas_wei
                .unwrap_or(estimate.max_priority_fee_per_gas),
        })
    }

    pub async fn tx_status(&self, tx_hash: B256) -> Result<TxStatus, EvmError> {
        let receipt = self.provider.get_transaction_receipt(tx_hash).await?;
        Ok(match receipt {
            Some(receipt) => TxStatus::Mined {
                success: receipt.status(),
                block_number: receipt.block_number,
                gas_used: receipt.gas_used,
            },
            None => TxStatus::Pending,
        })
    }

    /// Polls until the transaction is mined. Unbounded; callers apply their own timeout.
    pub async fn wait_for_receipt(&self, tx_hash: B256) -> Result<TxStatus, EvmError> {
        let interval = self.policy.receipt_poll_interval();
        loop {
            match self.tx_status(tx_hash).await? {
                TxStatus::Pending => {
                    debug!("No receipt for {tx_hash} yet, polling again in {interval:?}");
                    tokio::time::sleep(interval).await;
                }
                mined => return Ok(mined),
            }
        }
    }
}
