// Configuration structures for the GreenDish client

use std::time::Duration;

#[derive(Debug, Clone)]
pub struct RpcConfig {
    pub rpc_url: String,
    pub chain_id: u64,
}

#[derive(Debug, Clone)]
pub struct TxPolicyConfig {
    // Max fee per gas in wei (None = fetch from network)
    pub max_fee_per_gas_wei: Option<u128>,
    // Max priority fee per gas in wei (None = fetch from network)
    pub max_priority_fee_per_gas_wei: Option<u128>,
    // Interval between receipt polls
    pub receipt_poll_interval_ms: u64,
}

impl TxPolicyConfig {
    pub fn receipt_poll_interval(&self) -> Duration {
        Duration::from_millis(self.receipt_poll_interval_ms.max(1))
    }
}

impl Default for TxPolicyConfig {
    fn default() -> Self {
        Self {
            max_fee_per_gas_wei: None,
            max_priority_fee_per_gas_wei: None,
            receipt_poll_interval_ms: 1_000,
        }
    }
}
