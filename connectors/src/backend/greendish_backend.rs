use alloy::primitives::{Address, B256, U256};
use async_trait::async_trait;
use greendish_client::{
    DishRatingData, EvmError, GreenDishClient, GreenDishWrite, WriteParams,
    greendish::{DishDetails, Purchase, Rating, RestaurantDetails},
    types::{Eip1559Fees, TxStatus},
};

/// Raw contract surface for one signer, in chain-level types.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GreenDishBackend: Send + Sync {
    fn signer(&self) -> Address;

    async fn verified_restaurant(&self, restaurant: Address) -> Result<bool, EvmError>;
    async fn restaurant_info(&self, restaurant: Address) -> Result<RestaurantDetails, EvmError>;
    async fn restaurant_deposit(&self) -> Result<U256, EvmError>;

    async fn dishes(&self) -> Result<Vec<U256>, EvmError>;
    async fn restaurant_dishes(&self, restaurant: Address) -> Result<Vec<U256>, EvmError>;
    async fn dish_details(&self, dish_id: U256) -> Result<DishDetails, EvmError>;
    async fn dish_rating(&self, dish_id: U256) -> Result<DishRatingData, EvmError>;

    // Scoped to the signing account.
    async fn customer_token_balance(&self) -> Result<U256, EvmError>;
    async fn customer_carbon_credits(&self) -> Result<U256, EvmError>;
    async fn user_transactions(&self, offset: U256, limit: U256) -> Result<Vec<Purchase>, EvmError>;

    async fn user_transaction_count(&self, user: Address) -> Result<U256, EvmError>;
    async fn transaction_rating(&self, user: Address, index: U256) -> Result<Rating, EvmError>;

    async fn native_balance(&self, account: Address) -> Result<U256, EvmError>;
    async fn estimate_gas(&self, write: &GreenDishWrite, value: U256) -> Result<u64, EvmError>;
    async fn fees(&self) -> Result<Eip1559Fees, EvmError>;
    async fn send(&self, write: &GreenDishWrite, params: WriteParams) -> Result<B256, EvmError>;
    async fn tx_status(&self, tx_hash: B256) -> Result<TxStatus, EvmError>;
    async fn wait_for_receipt(&self, tx_hash: B256) -> Result<TxStatus, EvmError>;
}

pub struct GreenDishBackendImpl {
    pub client: GreenDishClient,
}

impl GreenDishBackendImpl {
    pub fn new(client: GreenDishClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl GreenDishBackend for GreenDishBackendImpl {
    fn signer(&self) -> Address {
        self.client.signer()
    }

    async fn verified_restaurant(&self, restaurant: Address) -> Result<bool, EvmError> {
        self.client.verified_restaurant(restaurant).await
    }

    async fn restaurant_info(&self, restaurant: Address) -> Result<RestaurantDetails, EvmError> {
        self.client.restaurant_info(restaurant).await
    }

    async fn restaurant_deposit(&self) -> Result<U256, EvmError> {
        self.client.restaurant_deposit().await
    }

    async fn dishes(&self) -> Result<Vec<U256>, EvmError> {
        self.client.dishes().await
    }

    async fn restaurant_dishes(&self, restaurant: Address) -> Result<Vec<U256>, EvmError> {
        self.client.restaurant_dishes(restaurant).await
    }

    async fn dish_details(&self, dish_id: U256) -> Result<DishDetails, EvmError> {
        self.client.dish_details(dish_id).await
    }

    async fn dish_rating(&self, dish_id: U256) -> Result<DishRatingData, EvmError> {
        self.client.dish_rating(dish_id).await
    }

    async fn customer_token_balance(&self) -> Result<U256, EvmError> {
        self.client.customer_token_balance().await
    }

    async fn customer_carbon_credits(&self) -> Result<U256, EvmError> {
        self.client.customer_carbon_credits().await
    }

    async fn user_transactions(&self, offset: U256, limit: U256) -> Result<Vec<Purchase>, EvmError> {
        self.client.user_transactions(offset, limit).await
    }

    async fn user_transaction_count(&self, user: Address) -> Result<U256, EvmError> {
        self.client.user_transaction_count(user).await
    }

    async fn transaction_rating(&self, user: Address, index: U256) -> Result<Rating, EvmError> {
        self.client.transaction_rating(user, index).await
    }

    async fn native_balance(&self, account: Address) -> Result<U256, EvmError> {
        self.client.client.native_balance(account).await
    }

    async fn estimate_gas(&self, write: &GreenDishWrite, value: U256) -> Result<u64, EvmError> {
        self.client.estimate_gas(write, value).await
    }

    async fn fees(&self) -> Result<Eip1559Fees, EvmError> {
        self.client.client.fees().await
    }

    async fn send(&self, write: &GreenDishWrite, params: WriteParams) -> Result<B256, EvmError> {
        self.client.send(write, params).await
    }

    async fn tx_status(&self, tx_hash: B256) -> Result<TxStatus, EvmError> {
        self.client.client.tx_status(tx_hash).await
    }

    async fn wait_for_receipt(&self, tx_hash: B256) -> Result<TxStatus, EvmError> {
        self.client.client.wait_for_receipt(tx_hash).await
    }
}
