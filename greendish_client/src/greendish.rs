// GreenDish marketplace contract bindings

use crate::{client::EvmClient, errors::EvmError, types::*};
use alloy::{contract::CallBuilder, providers::DynProvider, sol};

sol! {
    #[sol(rpc)]
    contract IGreenDish {
        struct DishDetails {
            string name;
            string mainComponent;
            uint256 carbonCredits;
            uint256 price;
            address restaurant;
            bool isActive;
            bool isVerified;
        }

        struct RestaurantDetails {
            uint8 supplySource;
            string supplyDetails;
            bool isRegistered;
        }

        struct Purchase {
            uint256 dishId;
            uint256 timestamp;
            uint256 carbonCredits;
            uint256 price;
            bool rated;
            bool ratingRewarded;
            bool purchaseRewarded;
        }

        struct Rating {
            uint256 score;
            string comment;
            uint256 timestamp;
        }

        function restaurantDeposit() external view returns (uint256);
        function verifiedRestaurants(address restaurant) external view returns (bool);
        function getRestaurantInfo(address restaurant) external view returns (RestaurantDetails memory);

        function getDishes() external view returns (uint256[] memory);
        function restaurantDishes(address restaurant) external view returns (uint256[] memory);
        function getDishDetails(uint256 dishId) external view returns (DishDetails memory);
        function getDishRating(uint256 dishId) external view returns (uint256 averageRating, uint256 totalRatings, uint256 ratingWithDecimal);

        function getCustomerTokenBalance() external view returns (uint256);
        function getCustomerCarbonCredits() external view returns (uint256);
        function userTransactionCount(address user) external view returns (uint256);
        function getUserTransactions(uint256 offset, uint256 limit) external view returns (Purchase[] memory);
        function getTransactionRating(address user, uint256 index) external view returns (Rating memory);

        function purchaseDishWithEth(uint256 dishId) external payable;
        function rateDish(uint256 dishId, uint256 score, string comment) external;
        function registerRestaurant(uint8 supplySource, string supplyDetails) external payable;
        function registerDish(string name, string mainComponent, uint256 carbonCredits, uint256 price) external;
        function updateDish(uint256 dishId, uint256 price, bool isActive) external;
    }
}

pub use IGreenDish::{DishDetails, Purchase, Rating, RestaurantDetails};

/// Aggregate rating as returned by `getDishRating`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DishRatingData {
    pub average: U256,
    pub count: U256,
    pub average_with_decimal: U256,
}

/// A state-changing contract call, before gas and fees are attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GreenDishWrite {
    PurchaseDish {
        dish_id: U256,
    },
    RateDish {
        dish_id: U256,
        score: U256,
        comment: String,
    },
    RegisterRestaurant {
        supply_source: u8,
        supply_details: String,
    },
    RegisterDish {
        name: String,
        main_component: String,
        carbon_credits: U256,
        price: U256,
    },
    UpdateDish {
        dish_id: U256,
        price: U256,
        is_active: bool,
    },
}

/// Gas and value to attach to a write.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteParams {
    pub value: U256,
    pub gas_limit: Option<u64>,
    pub fees: Option<Eip1559Fees>,
}

#[derive(Clone)]
pub struct GreenDishClient {
    pub address: Address,
    pub client: EvmClient,
}

impl GreenDishClient {
    pub fn new(address: Address, client: EvmClient) -> Self {
        Self { address, client }
    }

    pub fn signer(&self) -> Address {
        self.client.from
    }

    fn contract(&self) -> IGreenDish::IGreenDishInstance<DynProvider> {
        IGreenDish::new(self.address, self.client.provider.clone())
    }

    pub async fn restaurant_deposit(&self) -> Result<U256, EvmError> {
        Ok(self.contract().restaurantDeposit().call().await?)
    }

    pub async fn verified_restaurant(&self, restaurant: Address) -> Result<bool, EvmError> {
        Ok(self.contract().verifiedRestaurants(restaurant).call().await?)
    }

    pub async fn restaurant_info(&self, restaurant: Address) -> Result<RestaurantDetails, EvmError> {
        Ok(self.contract().getRestaurantInfo(restaurant).call().await?)
    }

    pub async fn dishes(&self) -> Result<Vec<U256>, EvmError> {
        Ok(self.contract().getDishes().call().await?)
    }

    pub async fn restaurant_dishes(&self, restaurant: Address) -> Result<Vec<U256>, EvmError> {
        Ok(self.contract().restaurantDishes(restaurant).call().await?)
    }

    pub async fn dish_details(&self, dish_id: U256) -> Result<DishDetails, EvmError> {
        Ok(self.contract().getDishDetails(dish_id).call().await?)
    }

    pub async fn dish_rating(&self, dish_id: U256) -> Result<DishRatingData, EvmError> {
        let rating = self.contract().getDishRating(dish_id).call().await?;
        Ok(DishRatingData {
            average: rating.averageRating,
            count: rating.totalRatings,
            average_with_decimal: rating.ratingWithDecimal,
        })
    }

    /// Token balance of the signing account.
    pub async fn customer_token_balance(&self) -> Result<U256, EvmError> {
        Ok(self.contract().getCustomerTokenBalance().from(self.signer()).call().await?)
    }

    /// Carbon credits of the signing account.
    pub async fn customer_carbon_credits(&self) -> Result<U256, EvmError> {
        Ok(self
            .contract()
            .getCustomerCarbonCredits()
            .from(self.signer())
            .call()
            .await?)
    }

    pub async fn user_transaction_count(&self, user: Address) -> Result<U256, EvmError> {
        Ok(self.contract().userTransactionCount(user).call().await?)
    }

    /// Purchase history page of the signing account.
    pub async fn user_transactions(&self, offset: U256, limit: U256) -> Result<Vec<Purchase>, EvmError> {
        Ok(self
            .contract()
            .getUserTransactions(offset, limit)
            .from(self.signer())
            .call()
            .await?)
    }

    pub async fn transaction_rating(&self, user: Address, index: U256) -> Result<Rating, EvmError> {
        Ok(self.contract().getTransactionRating(user, index).call().await?)
    }

    pub async fn estimate_gas(&self, write: &GreenDishWrite, value: U256) -> Result<u64, EvmError> {
        let params = WriteParams {
            value,
            ..WriteParams::default()
        };
        Ok(self.call_builder(write, params).estimate_gas().await?)
    }

    /// Signs and broadcasts `write`, returning as soon as the node accepts it.
    pub async fn send(&self, write: &GreenDishWrite, params: WriteParams) -> Result<B256, EvmError> {
        let pending = self.call_builder(write, params).send().await?;
        Ok(*pending.tx_hash())
    }

    fn call_builder(&self, write: &GreenDishWrite, params: WriteParams) -> CallBuilder<DynProvider, ()> {
        let contract = self.contract();
        let calldata = match write {
            GreenDishWrite::PurchaseDish { dish_id } => contract.purchaseDishWithEth(*dish_id).calldata().clone(),
            GreenDishWrite::RateDish {
                dish_id,
                score,
                comment,
            } => contract.rateDish(*dish_id, *score, comment.clone()).calldata().clone(),
            GreenDishWrite::RegisterRestaurant {
                supply_source,
                supply_details,
            } => contract
                .registerRestaurant(*supply_source, supply_details.clone())
                .calldata()
                .clone(),
            GreenDishWrite::RegisterDish {
                name,
                main_component,
                carbon_credits,
                price,
            } => contract
                .registerDish(name.clone(), main_component.clone(), *carbon_credits, *price)
                .calldata()
                .clone(),
            GreenDishWrite::UpdateDish {
                dish_id,
                price,
                is_active,
            } => contract.updateDish(*dish_id, *price, *is_active).calldata().clone(),
        };

        let mut builder = CallBuilder::new_raw(self.client.provider.clone(), calldata)
            .to(self.address)
            .from(self.signer())
            .value(params.value);
        if let Some(gas_limit) = params.gas_limit {
            builder = builder.gas(gas_limit);
        }
        if let Some(fees) = params.fees {
            builder = builder
                .max_fee_per_gas(fees.max_fee_per_gas)
                .max_priority_fee_per_gas(fees.max_priority_fee_per_gas);
        }
        builder
    }
}
