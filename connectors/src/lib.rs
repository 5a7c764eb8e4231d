//! Concrete adapters behind the `greendish-core` ports: a local keystore
//! wallet provider and the alloy-backed GreenDish contract client.

pub mod backend;
pub mod contract;
pub mod error;
pub mod wallet;
