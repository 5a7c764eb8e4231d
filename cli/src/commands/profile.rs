use greendish_core::model::UserTransaction;

use crate::context::AppContext;
use crate::error::CliResult;
use crate::output::{count, degraded, ether, row, table};

pub async fn show(ctx: &AppContext, offset: u64, limit: u64) -> CliResult<()> {
    let profile = ctx.reads()?.user_profile(offset, limit).await?;

    println!("\n=== Profile {} ===", profile.account);
    println!("Carbon credits: {}", count(profile.carbon_credits));
    println!("Loyalty tokens: {}", ether(profile.token_balance));
    println!("Purchases:      {}\n", count(profile.transaction_count));

    if profile.transactions.is_empty() {
        println!("No purchases yet.");
        return Ok(());
    }

    let mut history = table(&["#", "Dish", "Date", "Price (ETH)", "Credits", "Rating"]);
    for tx in &profile.transactions {
        history.add_row(row(vec![
            tx.index.to_string(),
            degraded(&tx.dish_name, String::clone),
            purchased_at(tx),
            greendish_core::amount::format_ether(tx.record.price_wei),
            count(tx.record.carbon_credits),
            degraded(&tx.rating, |rating| match rating {
                Some(rating) if rating.comment.is_empty() => format!("{}/5", rating.score),
                Some(rating) => format!("{}/5 \"{}\"", rating.score, rating.comment),
                None => "-".to_string(),
            }),
        ]));
    }
    history.printstd();
    Ok(())
}

fn purchased_at(tx: &UserTransaction) -> String {
    tx.purchased_at()
        .map(|at| at.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string())
}
