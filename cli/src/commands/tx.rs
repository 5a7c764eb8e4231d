use alloy::primitives::B256;
use greendish_core::contract::ReceiptStatus;

use crate::context::AppContext;
use crate::error::CliResult;
use crate::output::count;

pub async fn status(ctx: &AppContext, tx_hash: B256) -> CliResult<()> {
    let status = ctx.transactions()?.transaction_status(tx_hash).await?;

    match status {
        ReceiptStatus::Pending => println!("{tx_hash}: pending (no receipt yet)"),
        ReceiptStatus::Confirmed { block_number, gas_used } => {
            let block = block_number.map(count).unwrap_or_else(|| "?".to_string());
            println!("{tx_hash}: confirmed in block {block}, gas used {}", count(gas_used));
        }
        ReceiptStatus::Reverted { block_number } => {
            let block = block_number.map(count).unwrap_or_else(|| "?".to_string());
            println!("{tx_hash}: reverted in block {block}");
        }
    }
    Ok(())
}
