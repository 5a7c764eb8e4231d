use std::sync::Arc;

use alloy::primitives::{Address, B256, U256};
use async_trait::async_trait;
use greendish_client::{EvmError, GreenDishWrite, WriteParams, types::Eip1559Fees, types::TxStatus};
use greendish_core::contract::{
    ContractCall, ContractError, FeeSnapshot, GreenDishContract, ReceiptStatus, TxOptions,
};
use greendish_core::model::{Dish, DishRating, PurchaseRecord, RestaurantInfo, SupplySource, TransactionRating};

use crate::backend::greendish_backend::GreenDishBackend;

/// Adapts the chain-level backend to the core contract port.
pub struct GreenDishContractAdapter<B: GreenDishBackend> {
    pub backend: Arc<B>,
}

impl<B: GreenDishBackend> GreenDishContractAdapter<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self { backend }
    }
}

fn contract_error(err: EvmError) -> ContractError {
    match err {
        EvmError::Rejected => ContractError::Rejected,
        EvmError::InsufficientFunds(message) => ContractError::InsufficientFunds(message),
        EvmError::Revert(reason) => ContractError::Reverted { reason },
        EvmError::Decode(message) => ContractError::Decode(message),
        EvmError::Rpc(message) | EvmError::Other(message) => ContractError::Rpc(message),
    }
}

fn narrow<T: TryFrom<U256>>(value: U256, field: &str) -> Result<T, ContractError> {
    T::try_from(value).map_err(|_| ContractError::Decode(format!("{field} out of range: {value}")))
}

fn write_for(call: &ContractCall) -> GreenDishWrite {
    match call {
        ContractCall::PurchaseDish { dish_id } => GreenDishWrite::PurchaseDish {
            dish_id: U256::from(*dish_id),
        },
        ContractCall::RateDish {
            dish_id,
            score,
            comment,
        } => GreenDishWrite::RateDish {
            dish_id: U256::from(*dish_id),
            score: U256::from(*score),
            comment: comment.clone(),
        },
        ContractCall::RegisterRestaurant {
            supply_source,
            supply_details,
        } => GreenDishWrite::RegisterRestaurant {
            supply_source: supply_source.as_u8(),
            supply_details: supply_details.clone(),
        },
        ContractCall::RegisterDish {
            name,
            main_component,
            carbon_credits,
            price_wei,
        } => GreenDishWrite::RegisterDish {
            name: name.clone(),
            main_component: main_component.clone(),
            carbon_credits: U256::from(*carbon_credits),
            price: *price_wei,
        },
        ContractCall::UpdateDish {
            dish_id,
            price_wei,
            is_active,
        } => GreenDishWrite::UpdateDish {
            dish_id: U256::from(*dish_id),
            price: *price_wei,
            is_active: *is_active,
        },
    }
}

fn receipt_status(status: TxStatus) -> ReceiptStatus {
    match status {
        TxStatus::Pending => ReceiptStatus::Pending,
        TxStatus::Mined {
            success: true,
            block_number,
            gas_used,
        } => ReceiptStatus::Confirmed { block_number, gas_used },
        TxStatus::Mined {
            success: false,
            block_number,
            ..
        } => ReceiptStatus::Reverted { block_number },
    }
}

#[async_trait]
impl<B: GreenDishBackend + 'static> GreenDishContract for GreenDishContractAdapter<B> {
    fn signer(&self) -> Address {
        self.backend.signer()
    }

    async fn is_verified_restaurant(&self, restaurant: Address) -> Result<bool, ContractError> {
        self.backend.verified_restaurant(restaurant).await.map_err(contract_error)
    }

    async fn restaurant_info(&self, restaurant: Address) -> Result<RestaurantInfo, ContractError> {
        let info = self.backend.restaurant_info(restaurant).await.map_err(contract_error)?;
        let supply_source = SupplySource::from_u8(info.supplySource)
            .ok_or_else(|| ContractError::Decode(format!("unknown supply source {}", info.supplySource)))?;

        Ok(RestaurantInfo {
            supply_source,
            supply_details: info.supplyDetails,
            is_registered: info.isRegistered,
        })
    }

    async fn restaurant_deposit(&self) -> Result<U256, ContractError> {
        self.backend.restaurant_deposit().await.map_err(contract_error)
    }

    async fn dish_ids(&self) -> Result<Vec<u64>, ContractError> {
        let ids = self.backend.dishes().await.map_err(contract_error)?;
        ids.into_iter().map(|id| narrow(id, "dish id")).collect()
    }

    async fn restaurant_dish_ids(&self, restaurant: Address) -> Result<Vec<u64>, ContractError> {
        let ids = self
            .backend
            .restaurant_dishes(restaurant)
            .await
            .map_err(contract_error)?;
        ids.into_iter().map(|id| narrow(id, "dish id")).collect()
    }

    async fn dish_details(&self, dish_id: u64) -> Result<Dish, ContractError> {
        let details = self
            .backend
            .dish_details(U256::from(dish_id))
            .await
            .map_err(contract_error)?;

        Ok(Dish {
            id: dish_id,
            name: details.name,
            main_component: details.mainComponent,
            carbon_credits: narrow(details.carbonCredits, "carbon credits")?,
            price_wei: details.price,
            restaurant: details.restaurant,
            is_active: details.isActive,
            is_verified: details.isVerified,
        })
    }

    async fn dish_rating(&self, dish_id: u64) -> Result<DishRating, ContractError> {
        let rating = self
            .backend
            .dish_rating(U256::from(dish_id))
            .await
            .map_err(contract_error)?;

        Ok(DishRating {
            average: narrow(rating.average, "average rating")?,
            count: narrow(rating.count, "rating count")?,
            average_with_decimal: narrow(rating.average_with_decimal, "precise rating")?,
        })
    }

    async fn token_balance(&self) -> Result<U256, ContractError> {
        self.backend.customer_token_balance().await.map_err(contract_error)
    }

    async fn carbon_credits(&self) -> Result<u64, ContractError> {
        let credits = self.backend.customer_carbon_credits().await.map_err(contract_error)?;
        narrow(credits, "carbon credits")
    }

    async fn user_transaction_count(&self, user: Address) -> Result<u64, ContractError> {
        let count = self.backend.user_transaction_count(user).await.map_err(contract_error)?;
        narrow(count, "transaction count")
    }

    async fn user_transactions(&self, offset: u64, limit: u64) -> Result<Vec<PurchaseRecord>, ContractError> {
        let purchases = self
            .backend
            .user_transactions(U256::from(offset), U256::from(limit))
            .await
            .map_err(contract_error)?;

        purchases
            .into_iter()
            .map(|p| {
                Ok(PurchaseRecord {
                    dish_id: narrow(p.dishId, "dish id")?,
                    timestamp: narrow(p.timestamp, "timestamp")?,
                    carbon_credits: narrow(p.carbonCredits, "carbon credits")?,
                    price_wei: p.price,
                    rated: p.rated,
                    rating_rewarded: p.ratingRewarded,
                    purchase_rewarded: p.purchaseRewarded,
                })
            })
            .collect()
    }

    async fn transaction_rating(&self, user: Address, index: u64) -> Result<TransactionRating, ContractError> {
        let rating = self
            .backend
            .transaction_rating(user, U256::from(index))
            .await
            .map_err(contract_error)?;

        Ok(TransactionRating {
            score: narrow(rating.score, "score")?,
            comment: rating.comment,
            timestamp: narrow(rating.timestamp, "timestamp")?,
        })
    }

    async fn native_balance(&self, account: Address) -> Result<U256, ContractError> {
        self.backend.native_balance(account).await.map_err(contract_error)
    }

    async fn estimate_gas(&self, call: &ContractCall, value: U256) -> Result<u64, ContractError> {
        self.backend
            .estimate_gas(&write_for(call), value)
            .await
            .map_err(contract_error)
    }

    async fn fee_snapshot(&self) -> Result<FeeSnapshot, ContractError> {
        let fees = self.backend.fees().await.map_err(contract_error)?;
        Ok(FeeSnapshot {
            max_fee_per_gas: fees.max_fee_per_gas,
            max_priority_fee_per_gas: fees.max_priority_fee_per_gas,
        })
    }

    async fn send(&self, call: &ContractCall, options: TxOptions) -> Result<B256, ContractError> {
        let params = WriteParams {
            value: options.value,
            gas_limit: Some(options.gas_limit),
            fees: options.fees.map(|fees| Eip1559Fees {
                max_fee_per_gas: fees.max_fee_per_gas,
                max_priority_fee_per_gas: fees.max_priority_fee_per_gas,
            }),
        };
        self.backend.send(&write_for(call), params).await.map_err(contract_error)
    }

    async fn receipt_status(&self, tx_hash: B256) -> Result<ReceiptStatus, ContractError> {
        let status = self.backend.tx_status(tx_hash).await.map_err(contract_error)?;
        Ok(receipt_status(status))
    }

    async fn wait_for_receipt(&self, tx_hash: B256) -> Result<ReceiptStatus, ContractError> {
        let status = self.backend.wait_for_receipt(tx_hash).await.map_err(contract_error)?;
        Ok(receipt_status(status))
    }
}
