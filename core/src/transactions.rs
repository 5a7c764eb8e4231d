use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use alloy::primitives::{Address, B256, U256};
use log::{info, warn};
use tracing::instrument;

use crate::amount::{format_ether, parse_ether};
use crate::contract::{ActionKind, ContractCall, GreenDishContract, ReceiptStatus, TxOptions};
use crate::error::{TxError, TxResult};
use crate::model::{Dish, SupplySource};
use crate::session::Session;

pub const MIN_RATING: u8 = 1;
pub const MAX_RATING: u8 = 5;
pub const MIN_CARBON_CREDITS: u64 = 1;
pub const MAX_CARBON_CREDITS: u64 = 100;

const ONE_ETHER: u128 = 1_000_000_000_000_000_000;

/// Gas and confirmation policy applied to every submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxPolicy {
    /// Applied to the gas limit, in basis points (12000 = x1.2).
    pub gas_limit_multiplier_bps: u64,
    pub fallback_gas_limit: u64,
    pub registration_fallback_gas_limit: u64,
    pub dish_registration_fallback_gas_limit: u64,
    pub dish_update_fallback_gas_limit: u64,
    pub confirmation_timeout: Duration,
    pub registration_deposit: U256,
    /// Headroom above the deposit reserved for gas.
    pub registration_gas_margin: U256,
}

impl Default for TxPolicy {
    fn default() -> Self {
        Self {
            gas_limit_multiplier_bps: 12_000,
            fallback_gas_limit: 1_000_000,
            registration_fallback_gas_limit: 3_000_000,
            dish_registration_fallback_gas_limit: 1_500_000,
            dish_update_fallback_gas_limit: 750_000,
            confirmation_timeout: Duration::from_secs(120),
            registration_deposit: U256::from(10 * ONE_ETHER),
            registration_gas_margin: U256::from(ONE_ETHER / 10),
        }
    }
}

impl TxPolicy {
    pub fn fallback_gas_for(&self, action: ActionKind) -> u64 {
        match action {
            ActionKind::RegisterRestaurant => self.registration_fallback_gas_limit,
            ActionKind::RegisterDish => self.dish_registration_fallback_gas_limit,
            ActionKind::UpdateDish => self.dish_update_fallback_gas_limit,
            ActionKind::PurchaseDish | ActionKind::RateDish => self.fallback_gas_limit,
        }
    }

    pub fn buffered(&self, gas: u64) -> u64 {
        let scaled = gas as u128 * self.gas_limit_multiplier_bps as u128 / 10_000;
        u64::try_from(scaled).unwrap_or(u64::MAX)
    }

    /// Balance needed to register paying `deposit`.
    pub fn registration_threshold(&self, deposit: U256) -> U256 {
        deposit.saturating_add(self.registration_gas_margin)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GasSource {
    Estimated(u64),
    Fallback(u64),
}

impl GasSource {
    pub fn raw_limit(self) -> u64 {
        match self {
            GasSource::Estimated(gas) | GasSource::Fallback(gas) => gas,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxOutcome {
    pub tx_hash: B256,
    pub action: ActionKind,
    pub gas_source: GasSource,
    /// Limit actually submitted, after the multiplier.
    pub gas_limit: u64,
    pub block_number: Option<u64>,
    pub gas_used: u64,
}

/// Drives state-changing calls through estimate, submit and bounded confirmation.
#[derive(Clone)]
pub struct TransactionOrchestrator {
    client: Arc<dyn GreenDishContract>,
    account: Address,
    is_restaurant: bool,
    policy: TxPolicy,
    in_flight: Arc<Mutex<HashSet<ActionKind>>>,
}

impl TransactionOrchestrator {
    pub fn new(client: Arc<dyn GreenDishContract>, is_restaurant: bool, policy: TxPolicy) -> Self {
        Self {
            account: client.signer(),
            client,
            is_restaurant,
            policy,
            in_flight: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    pub fn for_session(session: &Session, policy: TxPolicy) -> Self {
        Self::new(session.client(), session.is_restaurant(), policy)
    }

    pub fn policy(&self) -> &TxPolicy {
        &self.policy
    }

    pub fn is_pending(&self, action: ActionKind) -> bool {
        self.in_flight.lock().map(|set| set.contains(&action)).unwrap_or(false)
    }

    #[instrument(name = "tx.purchase_dish", skip_all, fields(dish_id = dish.id), err)]
    pub async fn purchase_dish(&self, dish: &Dish) -> TxResult<TxOutcome> {
        if !dish.is_active {
            return Err(TxError::invalid(format!("dish #{} is not available", dish.id)));
        }

        match self.client.native_balance(self.account).await {
            Ok(balance) if balance < dish.price_wei => {
                return Err(TxError::InsufficientFunds {
                    message: format!(
                        "dish costs {} ETH, balance is {} ETH",
                        format_ether(dish.price_wei),
                        format_ether(balance)
                    ),
                });
            }
            Ok(_) => {}
            Err(err) => warn!("Balance check skipped for purchase of dish {}: {err}", dish.id),
        }

        self.submit(ContractCall::PurchaseDish { dish_id: dish.id }, dish.price_wei)
            .await
    }

    #[instrument(name = "tx.rate_dish", skip(self, comment), err)]
    pub async fn rate_dish(&self, dish_id: u64, score: u8, comment: &str) -> TxResult<TxOutcome> {
        if !(MIN_RATING..=MAX_RATING).contains(&score) {
            return Err(TxError::invalid(format!(
                "rating must be between {MIN_RATING} and {MAX_RATING}, got {score}"
            )));
        }

        let call = ContractCall::RateDish {
            dish_id,
            score,
            comment: comment.trim().to_string(),
        };
        self.submit(call, U256::ZERO).await
    }

    /// Registers the connected account as a restaurant, paying the deposit.
    ///
    /// `deposit` overrides the policy deposit, typically with the amount the
    /// contract currently asks for. The same amount is checked against the
    /// balance and sent. Refused locally when the balance cannot cover
    /// deposit plus gas margin.
    #[instrument(name = "tx.register_restaurant", skip(self, supply_details), err)]
    pub async fn register_restaurant(
        &self,
        supply_source: SupplySource,
        supply_details: &str,
        deposit: Option<U256>,
    ) -> TxResult<TxOutcome> {
        let supply_details = supply_details.trim();
        if supply_details.is_empty() {
            return Err(TxError::invalid("supply details must not be empty"));
        }
        if self.is_restaurant {
            return Err(TxError::invalid("account is already a registered restaurant"));
        }

        let deposit = deposit.unwrap_or(self.policy.registration_deposit);
        let required = self.policy.registration_threshold(deposit);
        match self.client.native_balance(self.account).await {
            Ok(available) if available < required => {
                return Err(TxError::InsufficientBalance { required, available });
            }
            Ok(_) => {}
            Err(err) => warn!("Balance check skipped for registration: {err}"),
        }

        let call = ContractCall::RegisterRestaurant {
            supply_source,
            supply_details: supply_details.to_string(),
        };
        self.submit(call, deposit).await
    }

    #[instrument(name = "tx.register_dish", skip(self), err)]
    pub async fn register_dish(
        &self,
        name: &str,
        main_component: &str,
        carbon_credits: u64,
        price: &str,
    ) -> TxResult<TxOutcome> {
        self.require_restaurant()?;
        let (name, main_component) = (name.trim(), main_component.trim());
        if name.is_empty() || main_component.is_empty() {
            return Err(TxError::invalid("dish name and main component are required"));
        }
        if !(MIN_CARBON_CREDITS..=MAX_CARBON_CREDITS).contains(&carbon_credits) {
            return Err(TxError::invalid(format!(
                "carbon credits must be between {MIN_CARBON_CREDITS} and {MAX_CARBON_CREDITS}, got {carbon_credits}"
            )));
        }
        let price_wei = parse_ether(price)?;

        let call = ContractCall::RegisterDish {
            name: name.to_string(),
            main_component: main_component.to_string(),
            carbon_credits,
            price_wei,
        };
        self.submit(call, U256::ZERO).await
    }

    #[instrument(name = "tx.update_dish", skip(self), err)]
    pub async fn update_dish(&self, dish_id: u64, price: &str, is_active: bool) -> TxResult<TxOutcome> {
        self.require_restaurant()?;
        let price_wei = parse_ether(price)?;

        let call = ContractCall::UpdateDish {
            dish_id,
            price_wei,
            is_active,
        };
        self.submit(call, U256::ZERO).await
    }

    /// Looks up a previously submitted transaction, e.g. after a confirmation timeout.
    pub async fn transaction_status(&self, tx_hash: B256) -> TxResult<ReceiptStatus> {
        Ok(self.client.receipt_status(tx_hash).await?)
    }

    /// Runs one call through the full flow. At most one call per action kind
    /// is in flight at a time.
    #[instrument(name = "tx.submit", skip_all, fields(method = call.method()), err)]
    pub async fn submit(&self, call: ContractCall, value: U256) -> TxResult<TxOutcome> {
        let _guard = InFlightGuard::claim(&self.in_flight, call.kind())?;

        let gas_source = match self.client.estimate_gas(&call, value).await {
            Ok(gas) => GasSource::Estimated(gas),
            Err(err) => {
                let fallback = self.policy.fallback_gas_for(call.kind());
                warn!("Gas estimation for {} failed, using fallback {fallback}: {err}", call.method());
                GasSource::Fallback(fallback)
            }
        };
        let gas_limit = self.policy.buffered(gas_source.raw_limit());

        let fees = if call.kind() == ActionKind::RegisterRestaurant {
            match self.client.fee_snapshot().await {
                Ok(fees) => Some(fees),
                Err(err) => {
                    warn!("Fee data unavailable, leaving pricing to the signer: {err}");
                    None
                }
            }
        } else {
            None
        };

        let options = TxOptions { value, gas_limit, fees };
        let tx_hash = self.client.send(&call, options).await?;
        info!("{} submitted: {tx_hash} (gas limit {gas_limit})", call.method());

        let timeout = self.policy.confirmation_timeout;
        let status = match tokio::time::timeout(timeout, self.client.wait_for_receipt(tx_hash)).await {
            Ok(status) => status?,
            Err(_) => {
                warn!("No receipt for {tx_hash} after {}s", timeout.as_secs());
                return Err(TxError::ConfirmationTimeout {
                    tx_hash,
                    waited_secs: timeout.as_secs(),
                });
            }
        };

        match status {
            ReceiptStatus::Confirmed { block_number, gas_used } => {
                info!("{} confirmed in block {block_number:?}", call.method());
                Ok(TxOutcome {
                    tx_hash,
                    action: call.kind(),
                    gas_source,
                    gas_limit,
                    block_number,
                    gas_used,
                })
            }
            ReceiptStatus::Reverted { block_number } => Err(TxError::ContractReverted {
                reason: format!("transaction {tx_hash} reverted in block {block_number:?}"),
            }),
            ReceiptStatus::Pending => Err(TxError::ConfirmationTimeout {
                tx_hash,
                waited_secs: timeout.as_secs(),
            }),
        }
    }

    fn require_restaurant(&self) -> TxResult<()> {
        if self.is_restaurant {
            Ok(())
        } else {
            Err(TxError::invalid("only verified restaurants can manage dishes"))
        }
    }
}

struct InFlightGuard {
    action: ActionKind,
    in_flight: Arc<Mutex<HashSet<ActionKind>>>,
}

impl InFlightGuard {
    fn claim(in_flight: &Arc<Mutex<HashSet<ActionKind>>>, action: ActionKind) -> TxResult<Self> {
        let mut set = in_flight
            .lock()
            .map_err(|_| TxError::Unknown {
                message: "in-flight registry poisoned".to_string(),
            })?;
        if !set.insert(action) {
            return Err(TxError::AlreadyPending { action });
        }
        Ok(Self {
            action,
            in_flight: in_flight.clone(),
        })
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        if let Ok(mut set) = self.in_flight.lock() {
            set.remove(&self.action);
        }
    }
}
