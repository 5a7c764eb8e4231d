use alloy::primitives::Address;
use greendish_core::model::truncate_address;
use greendish_core::session::SessionChange;
use log::warn;

use crate::context::AppContext;
use crate::error::{CliError, CliResult};
use crate::output::ether;

pub async fn show(ctx: &AppContext) -> CliResult<()> {
    if !ctx.session.has_provider() {
        println!("No wallet available. Set GREENDISH_PRIVATE_KEYS to enable one.");
        return Ok(());
    }

    let Some(session) = ctx.session.session() else {
        println!("Wallet not connected. Re-run with --connect.");
        return Ok(());
    };

    println!("Account:  {} ({})", session.address(), truncate_address(&session.address()));
    println!("Chain:    {}", session.chain_id());
    println!("Role:     {}", if session.is_restaurant() { "restaurant" } else { "customer" });

    match session.client().native_balance(session.address()).await {
        Ok(balance) => println!("Balance:  {}", ether(balance)),
        Err(err) => warn!("Could not read balance for {}: {err}", session.address()),
    }
    Ok(())
}

/// Selects `account` in the local wallet and applies the resulting notification.
pub async fn use_account(ctx: &mut AppContext, account: Address) -> CliResult<()> {
    let wallet = ctx
        .wallet
        .clone()
        .ok_or_else(|| CliError::usage("--account needs a configured wallet"))?;
    wallet.select_account(account)?;

    for change in ctx.session.process_events().await {
        report(&change);
    }
    Ok(())
}

pub async fn switch_chain(ctx: &mut AppContext, chain_id: u64) -> CliResult<()> {
    let change = ctx.session.switch_chain(chain_id).await?;
    report(&change);
    show(ctx).await
}

pub async fn reset_permissions(ctx: &mut AppContext) -> CliResult<()> {
    let change = ctx.session.reset_permissions().await?;
    report(&change);
    show(ctx).await
}

fn report(change: &SessionChange) {
    match change {
        SessionChange::Unchanged => {}
        SessionChange::AccountSwitched { from, to } => {
            println!("Switched account {} -> {}", truncate_address(from), truncate_address(to))
        }
        SessionChange::Disconnected => println!("Wallet disconnected."),
        SessionChange::Reloaded { chain_id: Some(chain_id) } => println!("Session reloaded on chain {chain_id}."),
        SessionChange::Reloaded { chain_id: None } => println!("Session reloaded; wallet not connected."),
    }
}
