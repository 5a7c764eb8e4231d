use greendish_core::amount::format_ether;
use greendish_core::model::{Dish, DishRating, ItemResult, truncate_address};
use greendish_core::transactions::{GasSource, TxOutcome};
use num_format::{Locale, ToFormattedString};
use prettytable::{Cell, Row, Table, format};
use serde::Serialize;

pub fn table(titles: &[&str]) -> Table {
    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_NO_LINESEP_WITH_TITLE);
    table.set_titles(Row::new(titles.iter().map(|t| Cell::new(t)).collect()));
    table
}

pub fn row(cells: Vec<String>) -> Row {
    Row::new(cells.iter().map(|c| Cell::new(c)).collect())
}

pub fn count(n: u64) -> String {
    n.to_formatted_string(&Locale::en)
}

pub fn stars(rating: &DishRating) -> String {
    if rating.count == 0 {
        return "no ratings".to_string();
    }
    format!("{:.2} ({} ratings)", rating.precise_average(), count(rating.count))
}

/// Value with a marker when it is a placeholder for a failed lookup.
pub fn degraded<T>(item: &ItemResult<T>, render: impl Fn(&T) -> String) -> String {
    match item {
        ItemResult::Fetched(value) => render(value),
        ItemResult::Degraded { placeholder, .. } => format!("{} (unavailable)", render(placeholder)),
    }
}

pub fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{json}"),
        Err(err) => eprintln!("Could not render json: {err}"),
    }
}

pub fn print_dishes(dishes: &[Dish]) {
    if dishes.is_empty() {
        println!("No dishes listed.");
        return;
    }

    let mut table = table(&["ID", "Name", "Main component", "Credits", "Price (ETH)", "Restaurant", "Active"]);
    for dish in dishes {
        table.add_row(row(vec![
            dish.id.to_string(),
            dish.name.clone(),
            dish.main_component.clone(),
            count(dish.carbon_credits),
            dish.price_display(),
            truncate_address(&dish.restaurant),
            if dish.is_active { "yes" } else { "no" }.to_string(),
        ]));
    }
    table.printstd();
}

pub fn print_outcome(outcome: &TxOutcome) {
    println!("\n{} confirmed", capitalize(&outcome.action.to_string()));
    println!("  tx hash:   {}", outcome.tx_hash);
    if let Some(block) = outcome.block_number {
        println!("  block:     {}", count(block));
    }
    let source = match outcome.gas_source {
        GasSource::Estimated(_) => "estimated",
        GasSource::Fallback(_) => "fallback",
    };
    println!("  gas limit: {} ({source})", count(outcome.gas_limit));
    println!("  gas used:  {}", count(outcome.gas_used));
}

pub fn ether(wei: alloy::primitives::U256) -> String {
    format!("{} ETH", format_ether(wei))
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
