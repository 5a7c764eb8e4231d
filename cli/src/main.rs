mod commands;
mod config;
mod context;
mod error;
mod output;

use alloy::primitives::{Address, B256};
use clap::{ArgAction, Parser, Subcommand};
use greendish_commons::env::load_env;
use greendish_commons::error::format_with_code;
use greendish_commons::telemetry::init_telemetry_from_env;
use greendish_core::model::{DishOrder, SupplySource};
use greendish_core::reads::{DEFAULT_HISTORY_LIMIT, DEFAULT_HISTORY_OFFSET};

use crate::context::AppContext;
use crate::error::{CliError, CliResult};

#[derive(Parser)]
#[command(name = "greendish")]
#[command(about = "GreenDish marketplace client: browse dishes, purchase and rate, manage a restaurant.")]
struct Cli {
    /// Ask the wallet for account access when it has not granted it yet.
    #[arg(long, global = true)]
    connect: bool,

    /// Act as this wallet account instead of the default one.
    #[arg(long, global = true)]
    account: Option<Address>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Shows the connected account, chain and role.
    Session,

    /// Lists dishes on the marketplace.
    Dishes {
        /// all, highest-credits, lowest-credits, highest-price or lowest-price
        #[arg(long, default_value = "all")]
        sort: DishOrder,
        /// Only the connected restaurant's own dishes, including inactive ones.
        #[arg(long)]
        mine: bool,
        #[arg(long)]
        json: bool,
    },

    /// Shows the aggregate rating of a dish.
    Rating { dish_id: u64 },

    /// Shows carbon credits, loyalty tokens and purchase history.
    Profile {
        #[arg(long, default_value_t = DEFAULT_HISTORY_OFFSET)]
        offset: u64,
        #[arg(long, default_value_t = DEFAULT_HISTORY_LIMIT)]
        limit: u64,
    },

    /// Buys a dish, paying its listed price.
    Purchase { dish_id: u64 },

    /// Rates a purchased dish from 1 to 5.
    Rate {
        dish_id: u64,
        score: u8,
        #[arg(default_value = "")]
        comment: String,
    },

    /// Restaurant registration and views.
    Restaurant {
        #[command(subcommand)]
        subcommand: RestaurantCommands,
    },

    /// Restaurant dish management.
    Dish {
        #[command(subcommand)]
        subcommand: DishCommands,
    },

    /// Looks up the receipt of a submitted transaction.
    TxStatus { tx_hash: B256 },

    /// Asks the wallet to switch networks, then reloads the session.
    SwitchChain { chain_id: u64 },

    /// Asks the wallet to re-grant account access, then reloads the session.
    ResetPermissions,
}

#[derive(Subcommand)]
enum RestaurantCommands {
    /// Registers the connected account as a restaurant, paying the deposit.
    Register {
        /// local, imported, green or other
        supply_source: SupplySource,
        supply_details: String,
    },

    /// Shows supply information and the restaurant's dishes.
    Dashboard,

    /// Shows per-dish ratings, estimated purchases and carbon impact.
    Analytics {
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum DishCommands {
    /// Lists a new dish.
    Add {
        name: String,
        main_component: String,
        /// Carbon credits awarded per purchase, 1 to 100.
        carbon_credits: u64,
        /// Price in ETH, e.g. 0.05
        price: String,
    },

    /// Changes a dish's price or availability.
    Update {
        dish_id: u64,
        /// Price in ETH, e.g. 0.05
        price: String,
        #[arg(long, action = ArgAction::Set, default_value_t = true)]
        active: bool,
    },
}

#[tokio::main]
async fn main() {
    load_env();
    let cli = Cli::parse();

    let telemetry_guard = match init_telemetry_from_env(None) {
        Ok(guard) => guard,
        Err(err) => {
            eprintln!("Failed to initialize telemetry: {err}");
            return;
        }
    };

    let exit_code = match run(cli).await {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("Error: {}", format_with_code(&err));
            if let CliError::Tx(tx) = &err
                && let Some(tx_hash) = tx.tx_hash()
            {
                eprintln!("The transaction may still confirm. Check it with: greendish tx-status {tx_hash}");
            }
            1
        }
    };

    // flush exporters before exiting
    drop(telemetry_guard);
    std::process::exit(exit_code);
}

async fn run(cli: Cli) -> CliResult<()> {
    let mut ctx = AppContext::init(cli.connect).await?;
    if let Some(account) = cli.account {
        commands::session::use_account(&mut ctx, account).await?;
    }

    match cli.command {
        Commands::Session => commands::session::show(&ctx).await,
        Commands::Dishes { sort, mine, json } => commands::dishes::list(&ctx, sort, mine, json).await,
        Commands::Rating { dish_id } => commands::dishes::rating(&ctx, dish_id).await,
        Commands::Profile { offset, limit } => commands::profile::show(&ctx, offset, limit).await,
        Commands::Purchase { dish_id } => commands::dishes::purchase(&ctx, dish_id).await,
        Commands::Rate {
            dish_id,
            score,
            comment,
        } => commands::dishes::rate(&ctx, dish_id, score, &comment).await,
        Commands::Restaurant { subcommand } => match subcommand {
            RestaurantCommands::Register {
                supply_source,
                supply_details,
            } => commands::restaurant::register(&mut ctx, supply_source, &supply_details).await,
            RestaurantCommands::Dashboard => commands::restaurant::dashboard(&ctx).await,
            RestaurantCommands::Analytics { json } => commands::restaurant::analytics(&ctx, json).await,
        },
        Commands::Dish { subcommand } => match subcommand {
            DishCommands::Add {
                name,
                main_component,
                carbon_credits,
                price,
            } => commands::restaurant::add_dish(&ctx, &name, &main_component, carbon_credits, &price).await,
            DishCommands::Update { dish_id, price, active } => {
                commands::restaurant::update_dish(&ctx, dish_id, &price, active).await
            }
        },
        Commands::TxStatus { tx_hash } => commands::tx::status(&ctx, tx_hash).await,
        Commands::SwitchChain { chain_id } => commands::session::switch_chain(&mut ctx, chain_id).await,
        Commands::ResetPermissions => commands::session::reset_permissions(&mut ctx).await,
    }
}
