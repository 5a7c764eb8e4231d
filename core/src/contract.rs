use std::fmt;
use std::sync::Arc;

use alloy::primitives::{Address, B256, U256};
use async_trait::async_trait;

use crate::model::{Dish, DishRating, PurchaseRecord, RestaurantInfo, SupplySource, TransactionRating};

/// Failure reported by the contract port, already sorted into the cases callers act on.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ContractError {
    #[error("request rejected in the wallet")]
    Rejected,
    #[error("insufficient funds: {0}")]
    InsufficientFunds(String),
    #[error("execution reverted: {reason}")]
    Reverted { reason: String },
    #[error("rpc error: {0}")]
    Rpc(String),
    #[error("failed to decode contract response: {0}")]
    Decode(String),
}

/// State-changing operations a session can submit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    PurchaseDish,
    RateDish,
    RegisterRestaurant,
    RegisterDish,
    UpdateDish,
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ActionKind::PurchaseDish => "purchase",
            ActionKind::RateDish => "rating",
            ActionKind::RegisterRestaurant => "restaurant registration",
            ActionKind::RegisterDish => "dish registration",
            ActionKind::UpdateDish => "dish update",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContractCall {
    PurchaseDish {
        dish_id: u64,
    },
    RateDish {
        dish_id: u64,
        score: u8,
        comment: String,
    },
    RegisterRestaurant {
        supply_source: SupplySource,
        supply_details: String,
    },
    RegisterDish {
        name: String,
        main_component: String,
        carbon_credits: u64,
        price_wei: U256,
    },
    UpdateDish {
        dish_id: u64,
        price_wei: U256,
        is_active: bool,
    },
}

impl ContractCall {
    pub fn kind(&self) -> ActionKind {
        match self {
            ContractCall::PurchaseDish { .. } => ActionKind::PurchaseDish,
            ContractCall::RateDish { .. } => ActionKind::RateDish,
            ContractCall::RegisterRestaurant { .. } => ActionKind::RegisterRestaurant,
            ContractCall::RegisterDish { .. } => ActionKind::RegisterDish,
            ContractCall::UpdateDish { .. } => ActionKind::UpdateDish,
        }
    }

    /// Contract method name, used in logs.
    pub fn method(&self) -> &'static str {
        match self {
            ContractCall::PurchaseDish { .. } => "purchaseDishWithEth",
            ContractCall::RateDish { .. } => "rateDish",
            ContractCall::RegisterRestaurant { .. } => "registerRestaurant",
            ContractCall::RegisterDish { .. } => "registerDish",
            ContractCall::UpdateDish { .. } => "updateDish",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeSnapshot {
    pub max_fee_per_gas: u128,
    pub max_priority_fee_per_gas: u128,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TxOptions {
    pub value: U256,
    pub gas_limit: u64,
    /// When `None` the signer prices the transaction itself.
    pub fees: Option<FeeSnapshot>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiptStatus {
    Pending,
    Confirmed { block_number: Option<u64>, gas_used: u64 },
    Reverted { block_number: Option<u64> },
}

/// The deployed GreenDish contract as seen by one signer.
///
/// Caller-scoped reads (`token_balance`, `carbon_credits`, `user_transactions`)
/// resolve against [`GreenDishContract::signer`].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GreenDishContract: Send + Sync {
    fn signer(&self) -> Address;

    async fn is_verified_restaurant(&self, restaurant: Address) -> Result<bool, ContractError>;
    async fn restaurant_info(&self, restaurant: Address) -> Result<RestaurantInfo, ContractError>;
    async fn restaurant_deposit(&self) -> Result<U256, ContractError>;

    async fn dish_ids(&self) -> Result<Vec<u64>, ContractError>;
    async fn restaurant_dish_ids(&self, restaurant: Address) -> Result<Vec<u64>, ContractError>;
    async fn dish_details(&self, dish_id: u64) -> Result<Dish, ContractError>;
    async fn dish_rating(&self, dish_id: u64) -> Result<DishRating, ContractError>;

    async fn token_balance(&self) -> Result<U256, ContractError>;
    async fn carbon_credits(&self) -> Result<u64, ContractError>;
    async fn user_transaction_count(&self, user: Address) -> Result<u64, ContractError>;
    async fn user_transactions(&self, offset: u64, limit: u64) -> Result<Vec<PurchaseRecord>, ContractError>;
    async fn transaction_rating(&self, user: Address, index: u64) -> Result<TransactionRating, ContractError>;

    async fn native_balance(&self, account: Address) -> Result<U256, ContractError>;

    async fn estimate_gas(&self, call: &ContractCall, value: U256) -> Result<u64, ContractError>;
    async fn fee_snapshot(&self) -> Result<FeeSnapshot, ContractError>;
    async fn send(&self, call: &ContractCall, options: TxOptions) -> Result<B256, ContractError>;
    async fn receipt_status(&self, tx_hash: B256) -> Result<ReceiptStatus, ContractError>;
    /// Resolves once the transaction has a receipt. Callers bound the wait.
    async fn wait_for_receipt(&self, tx_hash: B256) -> Result<ReceiptStatus, ContractError>;
}

/// Builds a contract client bound to the given signer.
#[cfg_attr(test, mockall::automock)]
pub trait ContractClientFactory: Send + Sync {
    fn build(&self, signer: Address, chain_id: u64) -> Result<Arc<dyn GreenDishContract>, ContractError>;
}
