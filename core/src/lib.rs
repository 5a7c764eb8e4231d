//! Session and contract-interaction orchestration for the GreenDish marketplace.
//!
//! The crate owns no chain logic of its own. It talks to two ports:
//! [`wallet::InjectedProvider`] (account access and provider notifications) and
//! [`contract::GreenDishContract`] (the deployed marketplace contract), and
//! builds the session lifecycle, read aggregation and transaction submission on top.

pub mod amount;
pub mod contract;
pub mod error;
pub mod model;
pub mod reads;
pub mod session;
pub mod transactions;
pub mod wallet;

#[cfg(test)]
pub(crate) mod testing;
