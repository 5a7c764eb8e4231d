use greendish_core::model::DishOrder;
use greendish_core::reads::{DEFAULT_HISTORY_LIMIT, last_page_offset, sort_dishes};

use crate::context::AppContext;
use crate::error::{CliError, CliResult};
use crate::output::{print_dishes, print_json, print_outcome, stars};

pub async fn list(ctx: &AppContext, order: DishOrder, mine: bool, json: bool) -> CliResult<()> {
    let reads = ctx.reads()?;
    let mut dishes = if mine {
        let session = ctx.active()?;
        if !session.is_restaurant() {
            return Err(CliError::usage("--mine is only available to registered restaurants"));
        }
        reads.list_restaurant_dishes(session.address()).await?
    } else {
        reads.list_dishes().await?
    };
    sort_dishes(&mut dishes, order);

    if json {
        print_json(&dishes);
    } else {
        print_dishes(&dishes);
    }
    Ok(())
}

pub async fn rating(ctx: &AppContext, dish_id: u64) -> CliResult<()> {
    let rating = ctx.reads()?.dish_rating(dish_id).await?;
    println!("Dish #{dish_id}: {}", stars(&rating));
    Ok(())
}

pub async fn purchase(ctx: &AppContext, dish_id: u64) -> CliResult<()> {
    let reads = ctx.reads()?;
    let dish = reads.dish(dish_id).await?;
    println!("Buying {} for {} ETH...", dish.name, dish.price_display());

    let outcome = ctx.transactions()?.purchase_dish(&dish).await?;
    print_outcome(&outcome);

    let count = reads.transaction_count().await?;
    super::profile::show(ctx, last_page_offset(count, DEFAULT_HISTORY_LIMIT), DEFAULT_HISTORY_LIMIT).await
}

pub async fn rate(ctx: &AppContext, dish_id: u64, score: u8, comment: &str) -> CliResult<()> {
    let outcome = ctx.transactions()?.rate_dish(dish_id, score, comment).await?;
    print_outcome(&outcome);

    rating(ctx, dish_id).await
}
