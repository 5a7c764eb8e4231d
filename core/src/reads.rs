use std::sync::Arc;

use alloy::primitives::{Address, U256};
use futures::future::join_all;
use log::warn;
use tracing::instrument;

use crate::contract::GreenDishContract;
use crate::error::{ReadError, ReadResult};
use crate::model::{
    Dish, DishAnalytics, DishOrder, DishRating, ItemResult, PurchaseRecord, RestaurantAnalytics, RestaurantDashboard,
    RestaurantInfo, UserProfile, UserTransaction,
};

pub const DEFAULT_HISTORY_OFFSET: u64 = 0;
pub const DEFAULT_HISTORY_LIMIT: u64 = 100;

/// Assembles views out of several contract reads.
///
/// A failing top-level query fails the view. A failing per-item lookup only
/// degrades or drops that item.
#[derive(Clone)]
pub struct ReadAggregator {
    client: Arc<dyn GreenDishContract>,
}

impl ReadAggregator {
    pub fn new(client: Arc<dyn GreenDishContract>) -> Self {
        Self { client }
    }

    /// Active dishes across all restaurants, in on-chain order.
    #[instrument(name = "reads.list_dishes", skip_all, err)]
    pub async fn list_dishes(&self) -> ReadResult<Vec<Dish>> {
        let ids = self.client.dish_ids().await.map_err(ReadError::failed("getDishes"))?;
        let dishes = self.fetch_dishes(&ids).await;
        Ok(dishes.into_iter().filter(|d| d.is_active).collect())
    }

    /// Every dish of `restaurant`, including inactive ones.
    #[instrument(name = "reads.list_restaurant_dishes", skip(self), err)]
    pub async fn list_restaurant_dishes(&self, restaurant: Address) -> ReadResult<Vec<Dish>> {
        let ids = self
            .client
            .restaurant_dish_ids(restaurant)
            .await
            .map_err(ReadError::failed("restaurantDishes"))?;
        Ok(self.fetch_dishes(&ids).await)
    }

    pub async fn dish(&self, dish_id: u64) -> ReadResult<Dish> {
        self.client
            .dish_details(dish_id)
            .await
            .map_err(ReadError::failed("getDishDetails"))
    }

    pub async fn dish_rating(&self, dish_id: u64) -> ReadResult<DishRating> {
        self.client
            .dish_rating(dish_id)
            .await
            .map_err(ReadError::failed("getDishRating"))
    }

    pub async fn registration_deposit(&self) -> ReadResult<U256> {
        self.client
            .restaurant_deposit()
            .await
            .map_err(ReadError::failed("restaurantDeposit"))
    }

    /// The signer's purchase history page, each entry enriched with its dish
    /// name and, when rated, its rating.
    ///
    /// The contract only serves the caller's own history, so there is no way
    /// to ask for another account's page.
    #[instrument(name = "reads.list_user_transactions", skip(self), err)]
    pub async fn list_user_transactions(&self, offset: u64, limit: u64) -> ReadResult<Vec<UserTransaction>> {
        let user = self.client.signer();
        let records = self
            .client
            .user_transactions(offset, limit)
            .await
            .map_err(ReadError::failed("getUserTransactions"))?;

        let enriched = records
            .into_iter()
            .enumerate()
            .map(|(i, record)| self.enrich_transaction(user, offset + i as u64, record));
        Ok(join_all(enriched).await)
    }

    /// Number of purchases the signer has made.
    pub async fn transaction_count(&self) -> ReadResult<u64> {
        self.client
            .user_transaction_count(self.client.signer())
            .await
            .map_err(ReadError::failed("userTransactionCount"))
    }

    /// Credits, token balance and one history page of the signer.
    #[instrument(name = "reads.user_profile", skip(self), err)]
    pub async fn user_profile(&self, offset: u64, limit: u64) -> ReadResult<UserProfile> {
        let user = self.client.signer();
        let (carbon_credits, token_balance, transaction_count) = futures::try_join!(
            async {
                self.client
                    .carbon_credits()
                    .await
                    .map_err(ReadError::failed("getCustomerCarbonCredits"))
            },
            async {
                self.client
                    .token_balance()
                    .await
                    .map_err(ReadError::failed("getCustomerTokenBalance"))
            },
            self.transaction_count(),
        )?;

        let transactions = if transaction_count > 0 {
            self.list_user_transactions(offset, limit).await?
        } else {
            Vec::new()
        };

        Ok(UserProfile {
            account: user,
            carbon_credits,
            token_balance,
            transaction_count,
            transactions,
        })
    }

    #[instrument(name = "reads.restaurant_dashboard", skip(self), err)]
    pub async fn restaurant_dashboard(&self, restaurant: Address) -> ReadResult<RestaurantDashboard> {
        let verified = self
            .client
            .is_verified_restaurant(restaurant)
            .await
            .map_err(ReadError::failed("verifiedRestaurants"))?;
        if !verified {
            return Err(ReadError::NotVerified { restaurant });
        }

        let (info, dishes) = futures::join!(
            self.client.restaurant_info(restaurant),
            self.list_restaurant_dishes(restaurant)
        );

        let info = match info {
            Ok(info) => ItemResult::Fetched(info),
            Err(err) => {
                warn!("Restaurant info unavailable for {restaurant}: {err}");
                ItemResult::Degraded {
                    placeholder: RestaurantInfo::unavailable(),
                    reason: err.to_string(),
                }
            }
        };
        let dishes = match dishes {
            Ok(dishes) => ItemResult::Fetched(dishes),
            Err(err) => {
                warn!("Dish list unavailable for {restaurant}: {err}");
                ItemResult::Degraded {
                    placeholder: Vec::new(),
                    reason: err.to_string(),
                }
            }
        };

        Ok(RestaurantDashboard {
            restaurant,
            info,
            dishes,
        })
    }

    #[instrument(name = "reads.restaurant_analytics", skip(self), err)]
    pub async fn restaurant_analytics(&self, restaurant: Address) -> ReadResult<RestaurantAnalytics> {
        let ids = self
            .client
            .restaurant_dish_ids(restaurant)
            .await
            .map_err(ReadError::failed("restaurantDishes"))?;

        let lookups = ids.iter().map(|id| async move {
            let (details, rating) = futures::join!(self.client.dish_details(*id), self.client.dish_rating(*id));
            match (details, rating) {
                (Ok(dish), Ok(rating)) => Some(dish_analytics(&dish, &rating)),
                (Err(err), _) | (_, Err(err)) => {
                    warn!("Skipping dish {id} in analytics: {err}");
                    None
                }
            }
        });
        let dishes: Vec<DishAnalytics> = join_all(lookups).await.into_iter().flatten().collect();

        Ok(RestaurantAnalytics {
            restaurant,
            total_purchases: dishes.iter().map(|d| d.estimated_purchases).sum(),
            total_carbon_impact: dishes.iter().map(|d| d.carbon_credits_generated).sum(),
            dishes,
        })
    }

    async fn fetch_dishes(&self, ids: &[u64]) -> Vec<Dish> {
        let lookups = ids.iter().map(|id| self.client.dish_details(*id));
        join_all(lookups)
            .await
            .into_iter()
            .zip(ids)
            .filter_map(|(result, id)| match result {
                Ok(dish) => Some(dish),
                Err(err) => {
                    warn!("Dropping dish {id} from listing: {err}");
                    None
                }
            })
            .collect()
    }

    async fn enrich_transaction(&self, user: Address, index: u64, record: PurchaseRecord) -> UserTransaction {
        let dish_name = async {
            match self.client.dish_details(record.dish_id).await {
                Ok(dish) => ItemResult::Fetched(dish.name),
                Err(err) => {
                    warn!("Dish name unavailable for transaction {index}: {err}");
                    ItemResult::Degraded {
                        placeholder: UserTransaction::fallback_dish_name(record.dish_id),
                        reason: err.to_string(),
                    }
                }
            }
        };
        let rating = async {
            if !record.rated {
                return ItemResult::Fetched(None);
            }
            match self.client.transaction_rating(user, index).await {
                Ok(rating) => ItemResult::Fetched(Some(rating)),
                Err(err) => {
                    warn!("Rating unavailable for transaction {index}: {err}");
                    ItemResult::Degraded {
                        placeholder: None,
                        reason: err.to_string(),
                    }
                }
            }
        };

        let (dish_name, rating) = futures::join!(dish_name, rating);
        UserTransaction {
            index,
            record,
            dish_name,
            rating,
        }
    }
}

fn dish_analytics(dish: &Dish, rating: &DishRating) -> DishAnalytics {
    let estimated_purchases = rating.count * 2;
    DishAnalytics {
        dish_id: dish.id,
        name: dish.name.clone(),
        carbon_credits: dish.carbon_credits,
        average_rating: rating.average as f64,
        total_ratings: rating.count,
        estimated_purchases,
        carbon_credits_generated: dish.carbon_credits * estimated_purchases,
    }
}

/// Offset of the last history page of `limit` entries, so the newest
/// purchase is always on it.
pub fn last_page_offset(transaction_count: u64, limit: u64) -> u64 {
    transaction_count.saturating_sub(limit)
}

/// Stable sort, so dishes with equal keys keep their listed order.
pub fn sort_dishes(dishes: &mut [Dish], order: DishOrder) {
    match order {
        DishOrder::Listed => {}
        DishOrder::HighestCredits => dishes.sort_by(|a, b| b.carbon_credits.cmp(&a.carbon_credits)),
        DishOrder::LowestCredits => dishes.sort_by_key(|d| d.carbon_credits),
        DishOrder::HighestPrice => dishes.sort_by(|a, b| b.price_wei.cmp(&a.price_wei)),
        DishOrder::LowestPrice => dishes.sort_by_key(|d| d.price_wei),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use mockall::predicate::eq;

    use super::*;
    use crate::contract::{ActionKind, ContractCall, ContractError, MockGreenDishContract};
    use crate::model::{SupplySource, TransactionRating};
    use crate::testing::{FakeGreenDish, Ledger, account, eth};
    use crate::transactions::{TransactionOrchestrator, TxPolicy};

    fn dish(id: u64, active: bool) -> Dish {
        Dish {
            id,
            name: format!("dish-{id}"),
            main_component: "lentils".into(),
            carbon_credits: id * 10,
            price_wei: U256::from(id),
            restaurant: account(7),
            is_active: active,
            is_verified: true,
        }
    }

    fn aggregator(client: MockGreenDishContract) -> ReadAggregator {
        ReadAggregator::new(Arc::new(client))
    }

    #[tokio::test]
    async fn list_dishes_fetches_each_id_once_and_keeps_active_only() {
        // given
        let mut client = MockGreenDishContract::new();
        client.expect_dish_ids().times(1).returning(|| Ok(vec![1, 2, 3]));
        client
            .expect_dish_details()
            .times(3)
            .returning(|id| Ok(dish(id, id != 2)));

        // when
        let dishes = aggregator(client).list_dishes().await.unwrap();

        // then
        let ids: Vec<u64> = dishes.iter().map(|d| d.id).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[tokio::test]
    async fn list_dishes_drops_failed_lookups() {
        let mut client = MockGreenDishContract::new();
        client.expect_dish_ids().returning(|| Ok(vec![1, 2, 3]));
        client.expect_dish_details().returning(|id| {
            if id == 2 {
                Err(ContractError::Rpc("timeout".into()))
            } else {
                Ok(dish(id, true))
            }
        });

        let dishes = aggregator(client).list_dishes().await.unwrap();

        assert_eq!(dishes.iter().map(|d| d.id).collect::<Vec<_>>(), vec![1, 3]);
    }

    #[tokio::test]
    async fn list_dishes_fails_when_id_list_fails() {
        let mut client = MockGreenDishContract::new();
        client
            .expect_dish_ids()
            .returning(|| Err(ContractError::Rpc("unreachable".into())));
        client.expect_dish_details().times(0);

        let err = aggregator(client).list_dishes().await.unwrap_err();

        assert!(matches!(err, ReadError::Failed { operation: "getDishes", .. }));
    }

    #[tokio::test]
    async fn single_dish_lookup_surfaces_failure() {
        let mut client = MockGreenDishContract::new();
        client
            .expect_dish_details()
            .with(eq(9))
            .returning(|_| Err(ContractError::Reverted { reason: "Dish does not exist".into() }));

        let err = aggregator(client).dish(9).await.unwrap_err();

        assert!(matches!(err, ReadError::Failed { operation: "getDishDetails", .. }));
    }

    #[tokio::test]
    async fn empty_marketplace_is_not_an_error() {
        let mut client = MockGreenDishContract::new();
        client.expect_dish_ids().returning(|| Ok(vec![]));

        assert!(aggregator(client).list_dishes().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn restaurant_listing_includes_inactive_dishes() {
        let mut client = MockGreenDishContract::new();
        client
            .expect_restaurant_dish_ids()
            .with(eq(account(7)))
            .returning(|_| Ok(vec![4, 5]));
        client.expect_dish_details().returning(|id| Ok(dish(id, id == 4)));

        let dishes = aggregator(client).list_restaurant_dishes(account(7)).await.unwrap();

        assert_eq!(dishes.len(), 2);
        assert!(!dishes[1].is_active);
    }

    #[tokio::test]
    async fn transactions_degrade_names_and_skip_unrated_lookups() {
        // given
        let user = account(1);
        let mut client = MockGreenDishContract::new();
        client.expect_signer().return_const(user);
        client.expect_user_transactions().with(eq(0), eq(100)).returning(|_, _| {
            Ok(vec![
                PurchaseRecord {
                    dish_id: 4,
                    timestamp: 1_700_000_000,
                    carbon_credits: 40,
                    price_wei: U256::from(4u64),
                    rated: true,
                    rating_rewarded: true,
                    purchase_rewarded: true,
                },
                PurchaseRecord {
                    dish_id: 9,
                    timestamp: 1_700_000_100,
                    carbon_credits: 90,
                    price_wei: U256::from(9u64),
                    rated: false,
                    rating_rewarded: false,
                    purchase_rewarded: true,
                },
            ])
        });
        client.expect_dish_details().returning(|id| {
            if id == 9 {
                Err(ContractError::Rpc("gone".into()))
            } else {
                Ok(dish(id, true))
            }
        });
        client
            .expect_transaction_rating()
            .with(eq(user), eq(0))
            .times(1)
            .returning(|_, _| {
                Ok(TransactionRating {
                    score: 5,
                    comment: "great".into(),
                    timestamp: 1_700_000_050,
                })
            });

        // when
        let txs = aggregator(client)
            .list_user_transactions(DEFAULT_HISTORY_OFFSET, DEFAULT_HISTORY_LIMIT)
            .await
            .unwrap();

        // then
        assert_eq!(txs.len(), 2);
        assert_eq!(txs[0].dish_name, ItemResult::Fetched("dish-4".to_string()));
        assert_eq!(txs[0].rating.value().as_ref().map(|r| r.score), Some(5));
        assert!(txs[1].dish_name.is_degraded());
        assert_eq!(txs[1].dish_name.value(), "Dish #9");
        assert_eq!(txs[1].rating, ItemResult::Fetched(None));
        assert_eq!(txs[1].index, 1);
    }

    #[tokio::test]
    async fn profile_skips_history_when_count_is_zero() {
        let mut client = MockGreenDishContract::new();
        client.expect_signer().return_const(account(1));
        client.expect_carbon_credits().returning(|| Ok(0));
        client.expect_token_balance().returning(|| Ok(U256::ZERO));
        client.expect_user_transaction_count().returning(|_| Ok(0));
        client.expect_user_transactions().times(0);

        let profile = aggregator(client).user_profile(0, 100).await.unwrap();

        assert_eq!(profile.transaction_count, 0);
        assert!(profile.transactions.is_empty());
    }

    #[tokio::test]
    async fn profile_fails_when_a_top_level_read_fails() {
        let mut client = MockGreenDishContract::new();
        client.expect_signer().return_const(account(1));
        client.expect_carbon_credits().returning(|| Ok(3));
        client
            .expect_token_balance()
            .returning(|| Err(ContractError::Rpc("down".into())));
        client.expect_user_transaction_count().returning(|_| Ok(1));

        let err = aggregator(client).user_profile(0, 100).await.unwrap_err();

        assert!(matches!(
            err,
            ReadError::Failed {
                operation: "getCustomerTokenBalance",
                ..
            }
        ));
    }

    #[tokio::test]
    async fn profile_and_history_belong_to_the_signer() {
        // given
        let ledger = Arc::new(Mutex::new(Ledger::default()));
        {
            let mut ledger = ledger.lock().unwrap();
            let curry = ledger.add_dish("Curry", account(7), 15, eth(1), true);
            let soup = ledger.add_dish("Soup", account(7), 5, eth(1), true);
            let record = |dish_id, carbon_credits| PurchaseRecord {
                dish_id,
                timestamp: 1_700_000_000,
                carbon_credits,
                price_wei: eth(1),
                rated: false,
                rating_rewarded: false,
                purchase_rewarded: true,
            };
            ledger.purchases.insert(account(1), vec![record(curry, 15)]);
            ledger.purchases.insert(account(2), vec![record(soup, 5), record(soup, 5)]);
            ledger.credits.insert(account(1), 15);
            ledger.credits.insert(account(2), 10);
        }
        let reads = ReadAggregator::new(Arc::new(FakeGreenDish {
            ledger,
            signer: account(2),
        }));

        // when
        let profile = reads.user_profile(0, 100).await.unwrap();

        // then
        assert_eq!(profile.account, account(2));
        assert_eq!(profile.transaction_count, 2);
        assert_eq!(profile.carbon_credits, 10);
        assert_eq!(profile.transactions.len(), 2);
        assert!(profile.transactions.iter().all(|tx| tx.dish_name.value() == "Soup"));
    }

    #[tokio::test]
    async fn dashboard_requires_verified_restaurant() {
        let mut client = MockGreenDishContract::new();
        client.expect_is_verified_restaurant().returning(|_| Ok(false));
        client.expect_restaurant_info().times(0);

        let err = aggregator(client).restaurant_dashboard(account(2)).await.unwrap_err();

        assert!(matches!(err, ReadError::NotVerified { restaurant } if restaurant == account(2)));
    }

    #[tokio::test]
    async fn dashboard_degrades_missing_info_to_defaults() {
        let mut client = MockGreenDishContract::new();
        client.expect_is_verified_restaurant().returning(|_| Ok(true));
        client
            .expect_restaurant_info()
            .returning(|_| Err(ContractError::Decode("bad struct".into())));
        client.expect_restaurant_dish_ids().returning(|_| Ok(vec![1]));
        client.expect_dish_details().returning(|id| Ok(dish(id, true)));

        let dashboard = aggregator(client).restaurant_dashboard(account(2)).await.unwrap();

        assert!(dashboard.info.is_degraded());
        assert_eq!(dashboard.info.value().supply_source, SupplySource::LocalProducer);
        assert_eq!(dashboard.info.value().supply_details, "details unavailable");
        assert_eq!(dashboard.dishes.value().len(), 1);
    }

    #[tokio::test]
    async fn analytics_estimates_purchases_from_ratings() {
        // given
        let restaurant = account(7);
        let mut ledger = Ledger::default();
        let soup = ledger.add_dish("Soup", restaurant, 10, eth(1), true);
        let salad = ledger.add_dish("Salad", restaurant, 4, eth(1), false);
        ledger.add_dish("Elsewhere", account(8), 99, eth(1), true);
        ledger.ratings.insert(soup, vec![5, 4, 3]);
        let client = FakeGreenDish {
            ledger: Arc::new(Mutex::new(ledger)),
            signer: restaurant,
        };

        // when
        let analytics = ReadAggregator::new(Arc::new(client))
            .restaurant_analytics(restaurant)
            .await
            .unwrap();

        // then
        assert_eq!(analytics.dishes.len(), 2);
        let soup_stats = analytics.dishes.iter().find(|d| d.dish_id == soup).unwrap();
        assert_eq!(soup_stats.total_ratings, 3);
        assert_eq!(soup_stats.estimated_purchases, 6);
        assert_eq!(soup_stats.carbon_credits_generated, 60);
        assert_eq!(soup_stats.average_rating, 4.0);
        let salad_stats = analytics.dishes.iter().find(|d| d.dish_id == salad).unwrap();
        assert_eq!(salad_stats.estimated_purchases, 0);
        assert_eq!(analytics.total_purchases, 6);
        assert_eq!(analytics.total_carbon_impact, 60);
    }

    #[tokio::test]
    async fn rating_reflects_new_votes() {
        let ledger = Arc::new(Mutex::new(Ledger::default()));
        let dish_id = ledger.lock().unwrap().add_dish("Stew", account(7), 5, eth(1), true);
        ledger.lock().unwrap().ratings.insert(dish_id, vec![4, 4]);
        let client = Arc::new(FakeGreenDish {
            ledger: ledger.clone(),
            signer: account(1),
        });
        let reads = ReadAggregator::new(client.clone());
        let tx = TransactionOrchestrator::new(client, false, TxPolicy::default());
        let before = reads.dish_rating(dish_id).await.unwrap();

        let outcome = tx.rate_dish(dish_id, 1, "  too salty ").await.unwrap();
        let after = reads.dish_rating(dish_id).await.unwrap();

        assert_eq!(outcome.action, ActionKind::RateDish);
        assert_eq!(before.count, 2);
        assert_eq!(after.count, 3);
        assert_eq!(after.average, 3);
        let (call, _) = ledger.lock().unwrap().sent.last().cloned().unwrap();
        assert_eq!(
            call,
            ContractCall::RateDish {
                dish_id,
                score: 1,
                comment: "too salty".into(),
            }
        );
    }

    #[test]
    fn last_page_holds_the_newest_purchases() {
        assert_eq!(last_page_offset(0, 10), 0);
        assert_eq!(last_page_offset(7, 10), 0);
        assert_eq!(last_page_offset(10, 10), 0);
        assert_eq!(last_page_offset(25, 10), 15);
    }

    #[tokio::test]
    async fn last_page_shows_a_purchase_beyond_the_first_page() {
        // given
        let buyer = account(1);
        let ledger = Arc::new(Mutex::new(Ledger::default()));
        let (soup, curry) = {
            let mut ledger = ledger.lock().unwrap();
            ledger.balances.insert(buyer, eth(100));
            let soup = ledger.add_dish("Soup", account(7), 5, eth(1), true);
            let curry = ledger.add_dish("Curry", account(7), 15, eth(1), true);
            (soup, curry)
        };
        let client = Arc::new(FakeGreenDish {
            ledger: ledger.clone(),
            signer: buyer,
        });
        let reads = ReadAggregator::new(client.clone());
        let tx = TransactionOrchestrator::new(client, false, TxPolicy::default());
        for _ in 0..12 {
            tx.purchase_dish(&reads.dish(soup).await.unwrap()).await.unwrap();
        }
        tx.purchase_dish(&reads.dish(curry).await.unwrap()).await.unwrap();

        // when
        let count = reads.transaction_count().await.unwrap();
        let profile = reads.user_profile(last_page_offset(count, 10), 10).await.unwrap();

        // then
        assert_eq!(count, 13);
        assert_eq!(profile.transactions.len(), 10);
        assert_eq!(profile.transactions[0].index, 3);
        let newest = profile.transactions.last().unwrap();
        assert_eq!(newest.index, 12);
        assert_eq!(newest.dish_name.value(), "Curry");
    }

    #[test]
    fn sorting_is_stable_and_directional() {
        let mut dishes = vec![dish(1, true), dish(3, true), dish(2, true)];
        dishes[2].carbon_credits = 30;

        sort_dishes(&mut dishes, DishOrder::HighestCredits);
        assert_eq!(dishes.iter().map(|d| d.id).collect::<Vec<_>>(), vec![3, 2, 1]);

        sort_dishes(&mut dishes, DishOrder::LowestPrice);
        assert_eq!(dishes.iter().map(|d| d.id).collect::<Vec<_>>(), vec![1, 2, 3]);

        sort_dishes(&mut dishes, DishOrder::HighestPrice);
        assert_eq!(dishes.iter().map(|d| d.id).collect::<Vec<_>>(), vec![3, 2, 1]);
    }

    mod fuzz {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn prop_listings_look_up_each_id_exactly_once(active in proptest::collection::vec(any::<bool>(), 0..40)) {
                let n = active.len();
                let ids: Vec<u64> = (1..=n as u64).collect();
                let active_count = active.iter().filter(|a| **a).count();

                let marketplace = {
                    let ids = ids.clone();
                    let active = active.clone();
                    let mut client = MockGreenDishContract::new();
                    client.expect_dish_ids().times(1).returning(move || Ok(ids.clone()));
                    client
                        .expect_dish_details()
                        .times(n)
                        .returning(move |id| Ok(dish(id, active[(id - 1) as usize])));
                    aggregator(client)
                };
                let owner_view = {
                    let ids = ids.clone();
                    let active = active.clone();
                    let mut client = MockGreenDishContract::new();
                    client
                        .expect_restaurant_dish_ids()
                        .times(1)
                        .returning(move |_| Ok(ids.clone()));
                    client
                        .expect_dish_details()
                        .times(n)
                        .returning(move |id| Ok(dish(id, active[(id - 1) as usize])));
                    aggregator(client)
                };

                // Run both listings under a synchronous runtime to keep proptest happy
                let rt = tokio::runtime::Runtime::new().unwrap();
                let (listed, owned) = rt.block_on(async {
                    (
                        marketplace.list_dishes().await.unwrap(),
                        owner_view.list_restaurant_dishes(account(7)).await.unwrap(),
                    )
                });

                prop_assert_eq!(listed.len(), active_count);
                prop_assert!(listed.iter().all(|d| d.is_active));
                prop_assert_eq!(owned.iter().map(|d| d.id).collect::<Vec<_>>(), ids);

                // mock expectations are verified on drop
                drop(marketplace);
                drop(owner_view);
            }
        }
    }
}
