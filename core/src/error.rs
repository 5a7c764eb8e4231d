use alloy::primitives::{Address, B256, U256};
use greendish_commons::error::{CodedError, ErrorCode, format_with_code};
use thiserror::Error;

use crate::amount::{AmountError, format_ether};
use crate::contract::{ActionKind, ContractError};
use crate::wallet::ProviderError;

pub type SessionResult<T> = Result<T, SessionError>;
pub type ReadResult<T> = Result<T, ReadError>;
pub type TxResult<T> = Result<T, TxError>;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("no wallet provider available, install a wallet extension")]
    ProviderMissing,
    #[error("the wallet returned no accounts")]
    NoAccounts,
    #[error("no wallet session is connected")]
    NotConnected,
    #[error("wallet provider error")]
    Provider {
        #[source]
        source: ProviderError,
    },
    #[error("failed to build contract client for {account}")]
    ClientBuild {
        account: Address,
        #[source]
        source: ContractError,
    },
}

impl SessionError {
    pub fn provider(source: ProviderError) -> Self {
        SessionError::Provider { source }
    }

    pub fn is_user_rejection(&self) -> bool {
        matches!(
            self,
            SessionError::Provider {
                source: ProviderError::UserRejected
            }
        )
    }
}

impl CodedError for SessionError {
    fn code(&self) -> ErrorCode {
        match self {
            SessionError::ProviderMissing => ErrorCode::SessionProviderMissing,
            SessionError::NoAccounts => ErrorCode::SessionNoAccounts,
            SessionError::NotConnected => ErrorCode::SessionNotConnected,
            SessionError::Provider { .. } => ErrorCode::SessionProvider,
            SessionError::ClientBuild { .. } => ErrorCode::SessionClientBuild,
        }
    }
}

impl From<SessionError> for String {
    fn from(value: SessionError) -> Self {
        format_with_code(&value)
    }
}

#[derive(Debug, Error)]
pub enum ReadError {
    #[error("{operation} failed: {source}")]
    Failed {
        operation: &'static str,
        #[source]
        source: ContractError,
    },
    #[error("{restaurant} is not a verified restaurant")]
    NotVerified { restaurant: Address },
}

impl ReadError {
    pub fn failed(operation: &'static str) -> impl FnOnce(ContractError) -> ReadError {
        move |source| ReadError::Failed { operation, source }
    }
}

impl CodedError for ReadError {
    fn code(&self) -> ErrorCode {
        match self {
            ReadError::Failed { .. } => ErrorCode::ReadFailure,
            ReadError::NotVerified { .. } => ErrorCode::ReadNotVerified,
        }
    }

    fn retriable(&self) -> bool {
        matches!(self, ReadError::Failed { .. })
    }
}

impl From<ReadError> for String {
    fn from(value: ReadError) -> Self {
        format_with_code(&value)
    }
}

/// Terminal failure of a transaction flow.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TxError {
    #[error("transaction was rejected in the wallet")]
    UserRejected,
    #[error("insufficient funds for this transaction: {message}")]
    InsufficientFunds { message: String },
    #[error(
        "insufficient balance: need at least {} ETH, have {} ETH",
        format_ether(*required),
        format_ether(*available)
    )]
    InsufficientBalance { required: U256, available: U256 },
    #[error("contract reverted: {reason}")]
    ContractReverted { reason: String },
    #[error("no receipt for {tx_hash} after {waited_secs}s, the transaction may still be mined")]
    ConfirmationTimeout { tx_hash: B256, waited_secs: u64 },
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("a {action} is already in progress")]
    AlreadyPending { action: ActionKind },
    #[error("transaction failed: {message}")]
    Unknown { message: String },
}

impl TxError {
    pub fn invalid(message: impl Into<String>) -> Self {
        TxError::InvalidInput { message: message.into() }
    }

    /// True when the transaction may still land on-chain.
    pub fn is_ambiguous(&self) -> bool {
        matches!(self, TxError::ConfirmationTimeout { .. })
    }

    pub fn tx_hash(&self) -> Option<B256> {
        match self {
            TxError::ConfirmationTimeout { tx_hash, .. } => Some(*tx_hash),
            _ => None,
        }
    }
}

impl From<ContractError> for TxError {
    fn from(value: ContractError) -> Self {
        match value {
            ContractError::Rejected => TxError::UserRejected,
            ContractError::InsufficientFunds(message) => TxError::InsufficientFunds { message },
            ContractError::Reverted { reason } => TxError::ContractReverted { reason },
            ContractError::Rpc(message) | ContractError::Decode(message) => TxError::Unknown { message },
        }
    }
}

impl From<AmountError> for TxError {
    fn from(value: AmountError) -> Self {
        TxError::invalid(value.to_string())
    }
}

impl CodedError for TxError {
    fn code(&self) -> ErrorCode {
        match self {
            TxError::UserRejected => ErrorCode::TxUserRejected,
            TxError::InsufficientFunds { .. } => ErrorCode::TxInsufficientFunds,
            TxError::InsufficientBalance { .. } => ErrorCode::TxInsufficientBalance,
            TxError::ContractReverted { .. } => ErrorCode::TxReverted,
            TxError::ConfirmationTimeout { .. } => ErrorCode::TxConfirmationTimeout,
            TxError::InvalidInput { .. } => ErrorCode::TxInvalidInput,
            TxError::AlreadyPending { .. } => ErrorCode::TxAlreadyPending,
            TxError::Unknown { .. } => ErrorCode::TxUnknown,
        }
    }

    fn retriable(&self) -> bool {
        matches!(self, TxError::Unknown { .. })
    }
}

impl From<TxError> for String {
    fn from(value: TxError) -> Self {
        format_with_code(&value)
    }
}
