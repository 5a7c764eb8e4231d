// Common types and re-exports

pub use alloy::{
    network::Ethereum,
    primitives::{Address, B256, U256},
    providers::Provider as _,
    rpc::types::TransactionReceipt,
    signers::local::PrivateKeySigner,
};

/// Where a submitted transaction stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxStatus {
    Pending,
    Mined {
        success: bool,
        block_number: Option<u64>,
        gas_used: u64,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Eip1559Fees {
    pub max_fee_per_gas: u128,
    pub max_priority_fee_per_gas: u128,
}
