pub mod adapter;
pub mod factory;

pub use adapter::GreenDishContractAdapter;
pub use factory::AlloyContractFactory;
