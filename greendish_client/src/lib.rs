//! # GreenDish Client
//!
//! Typed alloy bindings for the GreenDish marketplace contract.
//!
//! ## Features
//! - Signer-bound EVM client with EIP-1559 fee lookup and receipt polling
//! - Contract reads (dishes, ratings, purchase history, restaurant records)
//! - Writes with explicit gas limit and fee caps, returning on broadcast
//! - Node and wallet failures sorted into rejection, funds, revert and rpc errors
//!
//! ## Usage
//!
//! ```no_run
//! use greendish_client::*;
//! use alloy::primitives::U256;
//! use alloy::signers::local::PrivateKeySigner;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), EvmError> {
//!     let rpc = RpcConfig {
//!         rpc_url: "http://127.0.0.1:8545".into(),
//!         chain_id: 31337,
//!     };
//!     let signer = PrivateKeySigner::random();
//!     let client = EvmClient::new(rpc, signer, TxPolicyConfig::default())?;
//!
//!     let greendish = GreenDishClient::new("0x5FbDB2315678afecb367f032d93F642f64180aa3".parse()?, client);
//!     for id in greendish.dishes().await? {
//!         let dish = greendish.dish_details(id).await?;
//!         println!("{} costs {} wei", dish.name, dish.price);
//!     }
//!
//!     let write = GreenDishWrite::PurchaseDish { dish_id: U256::from(1) };
//!     let gas = greendish.estimate_gas(&write, U256::from(10u64.pow(16))).await?;
//!     let tx_hash = greendish
//!         .send(&write, WriteParams { value: U256::from(10u64.pow(16)), gas_limit: Some(gas), fees: None })
//!         .await?;
//!     let status = greendish.client.wait_for_receipt(tx_hash).await?;
//!     println!("{status:?}");
//!
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod errors;
pub mod greendish;
pub mod types;

pub use client::EvmClient;
pub use config::{RpcConfig, TxPolicyConfig};
pub use errors::EvmError;
pub use greendish::{DishRatingData, GreenDishClient, GreenDishWrite, WriteParams};
pub use types::*;
