//! In-memory contract and wallet used by the crate's tests.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex};

use alloy::primitives::{Address, B256, U256};
use async_trait::async_trait;

use crate::contract::{
    ContractCall, ContractClientFactory, ContractError, FeeSnapshot, GreenDishContract, ReceiptStatus, TxOptions,
};
use crate::model::{Dish, DishRating, PurchaseRecord, RestaurantInfo, TransactionRating};
use crate::wallet::{InjectedProvider, ProviderError, ProviderEvent, ProviderEventHub, Subscription};

pub const ETH: u128 = 1_000_000_000_000_000_000;

pub fn eth(whole: u128) -> U256 {
    U256::from(whole * ETH)
}

pub fn account(n: u8) -> Address {
    Address::repeat_byte(n)
}

#[derive(Default)]
pub struct Ledger {
    pub dishes: BTreeMap<u64, Dish>,
    pub ratings: HashMap<u64, Vec<u8>>,
    pub restaurants: HashMap<Address, RestaurantInfo>,
    pub balances: HashMap<Address, U256>,
    pub purchases: HashMap<Address, Vec<PurchaseRecord>>,
    pub transaction_ratings: HashMap<(Address, u64), TransactionRating>,
    pub credits: HashMap<Address, u64>,
    pub failing_dishes: HashSet<u64>,
    pub estimate_fails: bool,
    pub stall_receipts: bool,
    pub sent: Vec<(ContractCall, TxOptions)>,
    pub clock: u64,
}

impl Ledger {
    pub fn add_dish(&mut self, name: &str, restaurant: Address, credits: u64, price: U256, active: bool) -> u64 {
        let id = self.dishes.len() as u64 + 1;
        self.dishes.insert(
            id,
            Dish {
                id,
                name: name.to_string(),
                main_component: "beans".to_string(),
                carbon_credits: credits,
                price_wei: price,
                restaurant,
                is_active: active,
                is_verified: true,
            },
        );
        id
    }

    fn apply(&mut self, signer: Address, call: &ContractCall, value: U256) -> Result<(), ContractError> {
        self.clock += 1;
        match call {
            ContractCall::PurchaseDish { dish_id } => {
                let dish = self
                    .dishes
                    .get(dish_id)
                    .filter(|d| d.is_active)
                    .cloned()
                    .ok_or_else(|| ContractError::Reverted {
                        reason: "Dish not available".into(),
                    })?;
                let balance = self.balances.entry(signer).or_default();
                *balance = balance.saturating_sub(value);
                *self.credits.entry(signer).or_default() += dish.carbon_credits;
                self.purchases.entry(signer).or_default().push(PurchaseRecord {
                    dish_id: dish.id,
                    timestamp: self.clock,
                    carbon_credits: dish.carbon_credits,
                    price_wei: dish.price_wei,
                    rated: false,
                    rating_rewarded: false,
                    purchase_rewarded: true,
                });
            }
            ContractCall::RateDish {
                dish_id,
                score,
                comment,
            } => {
                self.ratings.entry(*dish_id).or_default().push(*score);
                let clock = self.clock;
                let purchases = self.purchases.entry(signer).or_default();
                if let Some((index, record)) = purchases
                    .iter_mut()
                    .enumerate()
                    .find(|(_, r)| r.dish_id == *dish_id && !r.rated)
                {
                    record.rated = true;
                    record.rating_rewarded = true;
                    self.transaction_ratings.insert(
                        (signer, index as u64),
                        TransactionRating {
                            score: *score,
                            comment: comment.clone(),
                            timestamp: clock,
                        },
                    );
                }
            }
            ContractCall::RegisterRestaurant {
                supply_source,
                supply_details,
            } => {
                self.restaurants.insert(
                    signer,
                    RestaurantInfo {
                        supply_source: *supply_source,
                        supply_details: supply_details.clone(),
                        is_registered: true,
                    },
                );
            }
            ContractCall::RegisterDish {
                name,
                main_component,
                carbon_credits,
                price_wei,
            } => {
                let id = self.add_dish(name, signer, *carbon_credits, *price_wei, true);
                if let Some(dish) = self.dishes.get_mut(&id) {
                    dish.main_component = main_component.clone();
                }
            }
            ContractCall::UpdateDish {
                dish_id,
                price_wei,
                is_active,
            } => {
                let dish = self
                    .dishes
                    .get_mut(dish_id)
                    .filter(|d| d.restaurant == signer)
                    .ok_or_else(|| ContractError::Reverted {
                        reason: "Not dish owner".into(),
                    })?;
                dish.price_wei = *price_wei;
                dish.is_active = *is_active;
            }
        }
        Ok(())
    }
}

/// Contract client over a shared [`Ledger`], scoped to one signer.
pub struct FakeGreenDish {
    pub ledger: Arc<Mutex<Ledger>>,
    pub signer: Address,
}

impl FakeGreenDish {
    fn ledger(&self) -> std::sync::MutexGuard<'_, Ledger> {
        self.ledger.lock().expect("ledger poisoned")
    }
}

#[async_trait]
impl GreenDishContract for FakeGreenDish {
    fn signer(&self) -> Address {
        self.signer
    }

    async fn is_verified_restaurant(&self, restaurant: Address) -> Result<bool, ContractError> {
        Ok(self.ledger().restaurants.contains_key(&restaurant))
    }

    async fn restaurant_info(&self, restaurant: Address) -> Result<RestaurantInfo, ContractError> {
        self.ledger()
            .restaurants
            .get(&restaurant)
            .cloned()
            .ok_or_else(|| ContractError::Reverted {
                reason: "Restaurant not registered".into(),
            })
    }

    async fn restaurant_deposit(&self) -> Result<U256, ContractError> {
        Ok(eth(10))
    }

    async fn dish_ids(&self) -> Result<Vec<u64>, ContractError> {
        Ok(self.ledger().dishes.keys().copied().collect())
    }

    async fn restaurant_dish_ids(&self, restaurant: Address) -> Result<Vec<u64>, ContractError> {
        Ok(self
            .ledger()
            .dishes
            .values()
            .filter(|d| d.restaurant == restaurant)
            .map(|d| d.id)
            .collect())
    }

    async fn dish_details(&self, dish_id: u64) -> Result<Dish, ContractError> {
        let ledger = self.ledger();
        if ledger.failing_dishes.contains(&dish_id) {
            return Err(ContractError::Rpc(format!("dish {dish_id} lookup failed")));
        }
        ledger.dishes.get(&dish_id).cloned().ok_or_else(|| ContractError::Reverted {
            reason: "Dish does not exist".into(),
        })
    }

    async fn dish_rating(&self, dish_id: u64) -> Result<DishRating, ContractError> {
        let ledger = self.ledger();
        let scores = ledger.ratings.get(&dish_id).cloned().unwrap_or_default();
        let count = scores.len() as u64;
        let sum: u64 = scores.iter().map(|s| *s as u64).sum();
        Ok(DishRating {
            average: if count == 0 { 0 } else { sum / count },
            count,
            average_with_decimal: if count == 0 { 0 } else { sum * 100 / count },
        })
    }

    async fn token_balance(&self) -> Result<U256, ContractError> {
        let credits = self.ledger().credits.get(&self.signer).copied().unwrap_or_default();
        Ok(U256::from(credits) * U256::from(ETH))
    }

    async fn carbon_credits(&self) -> Result<u64, ContractError> {
        Ok(self.ledger().credits.get(&self.signer).copied().unwrap_or_default())
    }

    async fn user_transaction_count(&self, user: Address) -> Result<u64, ContractError> {
        Ok(self.ledger().purchases.get(&user).map(|p| p.len() as u64).unwrap_or_default())
    }

    async fn user_transactions(&self, offset: u64, limit: u64) -> Result<Vec<PurchaseRecord>, ContractError> {
        Ok(self
            .ledger()
            .purchases
            .get(&self.signer)
            .map(|p| p.iter().skip(offset as usize).take(limit as usize).cloned().collect())
            .unwrap_or_default())
    }

    async fn transaction_rating(&self, user: Address, index: u64) -> Result<TransactionRating, ContractError> {
        self.ledger()
            .transaction_ratings
            .get(&(user, index))
            .cloned()
            .ok_or_else(|| ContractError::Reverted {
                reason: "Transaction not rated".into(),
            })
    }

    async fn native_balance(&self, account: Address) -> Result<U256, ContractError> {
        Ok(self.ledger().balances.get(&account).copied().unwrap_or_default())
    }

    async fn estimate_gas(&self, _call: &ContractCall, _value: U256) -> Result<u64, ContractError> {
        if self.ledger().estimate_fails {
            return Err(ContractError::Rpc("estimation unavailable".into()));
        }
        Ok(100_000)
    }

    async fn fee_snapshot(&self) -> Result<FeeSnapshot, ContractError> {
        Ok(FeeSnapshot {
            max_fee_per_gas: 2_000_000_000,
            max_priority_fee_per_gas: 1_000_000_000,
        })
    }

    async fn send(&self, call: &ContractCall, options: TxOptions) -> Result<B256, ContractError> {
        let mut ledger = self.ledger();
        ledger.apply(self.signer, call, options.value)?;
        ledger.sent.push((call.clone(), options));
        Ok(B256::with_last_byte(ledger.sent.len() as u8))
    }

    async fn receipt_status(&self, tx_hash: B256) -> Result<ReceiptStatus, ContractError> {
        let sent = self.ledger().sent.len();
        if (tx_hash.0[31] as usize) <= sent && tx_hash != B256::ZERO {
            Ok(ReceiptStatus::Confirmed {
                block_number: Some(tx_hash.0[31] as u64),
                gas_used: 21_000,
            })
        } else {
            Ok(ReceiptStatus::Pending)
        }
    }

    async fn wait_for_receipt(&self, tx_hash: B256) -> Result<ReceiptStatus, ContractError> {
        let stalled = self.ledger().stall_receipts;
        if stalled {
            std::future::pending::<()>().await;
        }
        self.receipt_status(tx_hash).await
    }
}

/// Factory handing out [`FakeGreenDish`] clients over one ledger, recording each build.
#[derive(Default)]
pub struct FakeFactory {
    pub ledger: Arc<Mutex<Ledger>>,
    pub built: Mutex<Vec<Address>>,
    pub failing_signers: HashSet<Address>,
}

impl FakeFactory {
    pub fn new(ledger: Arc<Mutex<Ledger>>) -> Self {
        Self {
            ledger,
            ..Self::default()
        }
    }

    pub fn builds(&self) -> Vec<Address> {
        self.built.lock().expect("built poisoned").clone()
    }
}

impl ContractClientFactory for FakeFactory {
    fn build(&self, signer: Address, _chain_id: u64) -> Result<Arc<dyn GreenDishContract>, ContractError> {
        self.built.lock().expect("built poisoned").push(signer);
        if self.failing_signers.contains(&signer) {
            return Err(ContractError::Rpc("signer unavailable".into()));
        }
        Ok(Arc::new(FakeGreenDish {
            ledger: self.ledger.clone(),
            signer,
        }))
    }
}

/// Wallet provider whose accounts and chain are driven by the test.
pub struct FakeWallet {
    pub hub: ProviderEventHub,
    pub accounts: Mutex<Vec<Address>>,
    pub authorized: Mutex<bool>,
    pub chain_id: Mutex<u64>,
    pub reject_requests: bool,
}

impl FakeWallet {
    pub fn new(accounts: Vec<Address>) -> Self {
        Self {
            hub: ProviderEventHub::new(),
            accounts: Mutex::new(accounts),
            authorized: Mutex::new(false),
            chain_id: Mutex::new(31337),
            reject_requests: false,
        }
    }

    pub fn authorized(self) -> Self {
        *self.authorized.lock().expect("poisoned") = true;
        self
    }

    pub fn set_accounts(&self, accounts: Vec<Address>) {
        *self.accounts.lock().expect("poisoned") = accounts.clone();
        self.hub.emit(ProviderEvent::AccountsChanged(accounts));
    }

    pub fn change_chain(&self, chain_id: u64) {
        *self.chain_id.lock().expect("poisoned") = chain_id;
        self.hub.emit(ProviderEvent::ChainChanged(chain_id));
    }
}

#[async_trait]
impl InjectedProvider for FakeWallet {
    async fn request_accounts(&self) -> Result<Vec<Address>, ProviderError> {
        if self.reject_requests {
            return Err(ProviderError::UserRejected);
        }
        *self.authorized.lock().expect("poisoned") = true;
        Ok(self.accounts.lock().expect("poisoned").clone())
    }

    async fn accounts(&self) -> Result<Vec<Address>, ProviderError> {
        if *self.authorized.lock().expect("poisoned") {
            Ok(self.accounts.lock().expect("poisoned").clone())
        } else {
            Ok(Vec::new())
        }
    }

    async fn chain_id(&self) -> Result<u64, ProviderError> {
        Ok(*self.chain_id.lock().expect("poisoned"))
    }

    async fn switch_chain(&self, chain_id: u64) -> Result<(), ProviderError> {
        if chain_id == 0 {
            return Err(ProviderError::UnrecognizedChain(chain_id));
        }
        self.change_chain(chain_id);
        Ok(())
    }

    async fn request_permissions(&self) -> Result<Vec<Address>, ProviderError> {
        self.request_accounts().await
    }

    fn subscribe(&self) -> Subscription {
        self.hub.subscribe()
    }
}
