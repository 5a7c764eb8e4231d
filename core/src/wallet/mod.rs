//! Port to the injected wallet provider (EIP-1193 style).

mod events;

pub use events::{ProviderEventHub, Subscription};

use alloy::primitives::Address;
use async_trait::async_trait;

/// Notifications pushed by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderEvent {
    AccountsChanged(Vec<Address>),
    ChainChanged(u64),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProviderError {
    #[error("user rejected the request")]
    UserRejected,
    #[error("chain {0} has not been added to the wallet")]
    UnrecognizedChain(u64),
    #[error("wallet request failed: {0}")]
    Request(String),
}

impl ProviderError {
    /// EIP-1193 / EIP-3326 numeric code.
    pub fn rpc_code(&self) -> i64 {
        match self {
            ProviderError::UserRejected => 4001,
            ProviderError::UnrecognizedChain(_) => 4902,
            ProviderError::Request(_) => -32603,
        }
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait InjectedProvider: Send + Sync {
    /// `eth_requestAccounts`: may prompt the user.
    async fn request_accounts(&self) -> Result<Vec<Address>, ProviderError>;
    /// `eth_accounts`: already-authorized accounts, never prompts.
    async fn accounts(&self) -> Result<Vec<Address>, ProviderError>;
    async fn chain_id(&self) -> Result<u64, ProviderError>;
    /// `wallet_switchEthereumChain`
    async fn switch_chain(&self, chain_id: u64) -> Result<(), ProviderError>;
    /// `wallet_requestPermissions` for `eth_accounts`, returns the re-authorized accounts.
    async fn request_permissions(&self) -> Result<Vec<Address>, ProviderError>;

    fn subscribe(&self) -> Subscription;
}
