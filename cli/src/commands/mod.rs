pub mod dishes;
pub mod profile;
pub mod restaurant;
pub mod session;
pub mod tx;
