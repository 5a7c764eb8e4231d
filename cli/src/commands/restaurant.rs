use greendish_core::model::SupplySource;

use crate::context::AppContext;
use crate::error::CliResult;
use crate::output::{count, degraded, ether, print_dishes, print_json, print_outcome, row, table};

pub async fn register(ctx: &mut AppContext, supply_source: SupplySource, supply_details: &str) -> CliResult<()> {
    let deposit = ctx.reads()?.registration_deposit().await?;
    println!("Registering as {supply_source} restaurant (deposit {})...", ether(deposit));

    let outcome = ctx
        .transactions()?
        .register_restaurant(supply_source, supply_details, Some(deposit))
        .await?;
    print_outcome(&outcome);

    ctx.session.refresh_role().await?;
    dashboard(ctx).await
}

pub async fn dashboard(ctx: &AppContext) -> CliResult<()> {
    let restaurant = ctx.active()?.address();
    let dashboard = ctx.reads()?.restaurant_dashboard(restaurant).await?;

    println!("\n=== Restaurant {} ===", dashboard.restaurant);
    println!(
        "Supply source:  {}",
        degraded(&dashboard.info, |info| info.supply_source.to_string())
    );
    println!(
        "Supply details: {}\n",
        degraded(&dashboard.info, |info| info.supply_details.clone())
    );

    if dashboard.dishes.is_degraded() {
        println!("Dish list unavailable right now.");
    } else {
        print_dishes(dashboard.dishes.value());
    }
    Ok(())
}

pub async fn analytics(ctx: &AppContext, json: bool) -> CliResult<()> {
    let restaurant = ctx.active()?.address();
    let analytics = ctx.reads()?.restaurant_analytics(restaurant).await?;

    if json {
        print_json(&analytics);
        return Ok(());
    }

    let mut per_dish = table(&["ID", "Dish", "Rating", "Ratings", "Est. purchases", "Credits generated"]);
    for dish in &analytics.dishes {
        per_dish.add_row(row(vec![
            dish.dish_id.to_string(),
            dish.name.clone(),
            format!("{:.2}", dish.average_rating),
            count(dish.total_ratings),
            count(dish.estimated_purchases),
            count(dish.carbon_credits_generated),
        ]));
    }

    println!("\n=== Analytics {} ===", analytics.restaurant);
    per_dish.printstd();
    println!("\nOverall rating:      {:.2}", analytics.overall_rating());
    println!("Estimated purchases: {}", count(analytics.total_purchases));
    println!("Carbon impact:       {} credits", count(analytics.total_carbon_impact));
    Ok(())
}

pub async fn add_dish(
    ctx: &AppContext,
    name: &str,
    main_component: &str,
    carbon_credits: u64,
    price: &str,
) -> CliResult<()> {
    let outcome = ctx
        .transactions()?
        .register_dish(name, main_component, carbon_credits, price)
        .await?;
    print_outcome(&outcome);

    dashboard(ctx).await
}

pub async fn update_dish(ctx: &AppContext, dish_id: u64, price: &str, active: bool) -> CliResult<()> {
    let outcome = ctx.transactions()?.update_dish(dish_id, price, active).await?;
    print_outcome(&outcome);

    dashboard(ctx).await
}
