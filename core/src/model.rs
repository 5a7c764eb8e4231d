use std::fmt;
use std::str::FromStr;

use alloy::primitives::{Address, U256};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::amount::format_ether;

/// Where a restaurant sources its ingredients. Stored on-chain as its ordinal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SupplySource {
    LocalProducer,
    ImportedProducer,
    GreenProducer,
    Other,
}

impl SupplySource {
    pub const ALL: [SupplySource; 4] = [
        SupplySource::LocalProducer,
        SupplySource::ImportedProducer,
        SupplySource::GreenProducer,
        SupplySource::Other,
    ];

    pub fn as_u8(self) -> u8 {
        match self {
            SupplySource::LocalProducer => 0,
            SupplySource::ImportedProducer => 1,
            SupplySource::GreenProducer => 2,
            SupplySource::Other => 3,
        }
    }

    pub fn from_u8(value: u8) -> Option<Self> {
        Self::ALL.get(value as usize).copied()
    }

    pub fn display_name(self) -> &'static str {
        match self {
            SupplySource::LocalProducer => "Local Producer",
            SupplySource::ImportedProducer => "Imported Producer",
            SupplySource::GreenProducer => "Green Producer",
            SupplySource::Other => "Other",
        }
    }
}

impl fmt::Display for SupplySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for SupplySource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace(['-', '_', ' '], "");
        match normalized.as_str() {
            "0" | "local" | "localproducer" => Ok(SupplySource::LocalProducer),
            "1" | "imported" | "importedproducer" => Ok(SupplySource::ImportedProducer),
            "2" | "green" | "greenproducer" => Ok(SupplySource::GreenProducer),
            "3" | "other" => Ok(SupplySource::Other),
            _ => Err(format!("unknown supply source: {s}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dish {
    pub id: u64,
    pub name: String,
    pub main_component: String,
    pub carbon_credits: u64,
    pub price_wei: U256,
    pub restaurant: Address,
    pub is_active: bool,
    pub is_verified: bool,
}

impl Dish {
    pub fn price_display(&self) -> String {
        format_ether(self.price_wei)
    }
}

/// Aggregate rating as reported by the contract.
///
/// `average` is the integer mean. `average_with_decimal` is the contract's
/// higher-precision mean (two implied decimals).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DishRating {
    pub average: u64,
    pub count: u64,
    pub average_with_decimal: u64,
}

impl DishRating {
    pub fn precise_average(&self) -> f64 {
        self.average_with_decimal as f64 / 100.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestaurantInfo {
    pub supply_source: SupplySource,
    pub supply_details: String,
    pub is_registered: bool,
}

impl RestaurantInfo {
    pub const DETAILS_UNAVAILABLE: &'static str = "details unavailable";

    /// Shown in place of the real record when it cannot be read.
    pub fn unavailable() -> Self {
        Self {
            supply_source: SupplySource::LocalProducer,
            supply_details: Self::DETAILS_UNAVAILABLE.to_string(),
            is_registered: true,
        }
    }
}

/// A raw purchase entry from the caller's on-chain history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseRecord {
    pub dish_id: u64,
    pub timestamp: u64,
    pub carbon_credits: u64,
    pub price_wei: U256,
    pub rated: bool,
    pub rating_rewarded: bool,
    pub purchase_rewarded: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRating {
    pub score: u8,
    pub comment: String,
    pub timestamp: u64,
}

/// Outcome of a secondary lookup inside an aggregated read.
///
/// A failed lookup degrades to a placeholder instead of failing the whole view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemResult<T> {
    Fetched(T),
    Degraded { placeholder: T, reason: String },
}

impl<T> ItemResult<T> {
    pub fn value(&self) -> &T {
        match self {
            ItemResult::Fetched(value) => value,
            ItemResult::Degraded { placeholder, .. } => placeholder,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, ItemResult::Degraded { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserTransaction {
    /// Position in the user's history, usable with `getTransactionRating`.
    pub index: u64,
    pub record: PurchaseRecord,
    pub dish_name: ItemResult<String>,
    pub rating: ItemResult<Option<TransactionRating>>,
}

impl UserTransaction {
    pub fn fallback_dish_name(dish_id: u64) -> String {
        format!("Dish #{dish_id}")
    }

    pub fn purchased_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(i64::try_from(self.record.timestamp).ok()?, 0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    pub account: Address,
    pub carbon_credits: u64,
    pub token_balance: U256,
    pub transaction_count: u64,
    pub transactions: Vec<UserTransaction>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestaurantDashboard {
    pub restaurant: Address,
    pub info: ItemResult<RestaurantInfo>,
    pub dishes: ItemResult<Vec<Dish>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DishAnalytics {
    pub dish_id: u64,
    pub name: String,
    pub carbon_credits: u64,
    pub average_rating: f64,
    pub total_ratings: u64,
    /// Purchases are not indexed on-chain; approximated as twice the rating count.
    pub estimated_purchases: u64,
    pub carbon_credits_generated: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RestaurantAnalytics {
    pub restaurant: Address,
    pub dishes: Vec<DishAnalytics>,
    pub total_purchases: u64,
    pub total_carbon_impact: u64,
}

impl RestaurantAnalytics {
    pub fn overall_rating(&self) -> f64 {
        let rated: Vec<&DishAnalytics> = self.dishes.iter().filter(|d| d.total_ratings > 0).collect();
        if rated.is_empty() {
            return 0.0;
        }
        rated.iter().map(|d| d.average_rating).sum::<f64>() / rated.len() as f64
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DishOrder {
    #[default]
    Listed,
    HighestCredits,
    LowestCredits,
    HighestPrice,
    LowestPrice,
}

impl FromStr for DishOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" | "listed" => Ok(DishOrder::Listed),
            "highest-credits" => Ok(DishOrder::HighestCredits),
            "lowest-credits" => Ok(DishOrder::LowestCredits),
            "highest-price" => Ok(DishOrder::HighestPrice),
            "lowest-price" => Ok(DishOrder::LowestPrice),
            other => Err(format!("unknown dish order: {other}")),
        }
    }
}

/// `0x1234...abcd` form used wherever an account is shown to a person.
pub fn truncate_address(address: &Address) -> String {
    let full = address.to_string();
    format!("{}...{}", &full[..6], &full[full.len() - 4..])
}
