pub mod keystore;
pub mod local_wallet;

pub use keystore::Keystore;
pub use local_wallet::LocalWallet;
