// Error types for GreenDish contract operations

use alloy::sol_types::decode_revert_reason;
use alloy::transports::{RpcError, TransportErrorKind};

/// EIP-1193 "user rejected request".
pub const USER_REJECTED_CODE: i64 = 4001;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum EvmError {
    #[error("rpc: {0}")]
    Rpc(String),

    #[error("rejected by signer")]
    Rejected,

    #[error("insufficient funds: {0}")]
    InsufficientFunds(String),

    #[error("revert: {0}")]
    Revert(String),

    #[error("decode: {0}")]
    Decode(String),

    #[error("other: {0}")]
    Other(String),
}

impl EvmError {
    /// Sorts a node or wallet failure into the cases callers act on.
    pub fn classify(code: Option<i64>, message: &str) -> Self {
        let lower = message.to_ascii_lowercase();

        if code == Some(USER_REJECTED_CODE)
            || lower.contains("user denied")
            || lower.contains("user rejected")
            || lower.contains("action_rejected")
        {
            return EvmError::Rejected;
        }
        if lower.contains("insufficient funds") {
            return EvmError::InsufficientFunds(message.to_string());
        }
        if let Some(reason) = revert_reason(message) {
            return EvmError::Revert(reason);
        }
        EvmError::Rpc(message.to_string())
    }
}

fn revert_reason(message: &str) -> Option<String> {
    // hardhat: "reverted with reason string 'Dish not active'"
    const HARDHAT: &str = "reverted with reason string '";
    if let Some(start) = message.find(HARDHAT) {
        let rest = &message[start + HARDHAT.len()..];
        let reason = rest.split('\'').next().unwrap_or_default();
        return Some(reason.to_string());
    }

    // geth/anvil: "execution reverted: Dish not active"
    const GETH: &str = "execution reverted";
    let start = message.find(GETH)?;
    let reason = message[start + GETH.len()..].trim_start_matches(':').trim();
    if reason.is_empty() {
        Some(GETH.to_string())
    } else {
        Some(reason.to_string())
    }
}

impl From<RpcError<TransportErrorKind>> for EvmError {
    fn from(e: RpcError<TransportErrorKind>) -> Self {
        match e.as_error_resp() {
            Some(payload) => EvmError::classify(Some(payload.code), &payload.message),
            None => EvmError::classify(None, &e.to_string()),
        }
    }
}

impl From<alloy::contract::Error> for EvmError {
    fn from(e: alloy::contract::Error) -> Self {
        if let Some(reason) = e.as_revert_data().and_then(|data| decode_revert_reason(&data)) {
            return EvmError::Revert(reason);
        }
        match e {
            alloy::contract::Error::TransportError(rpc) => rpc.into(),
            alloy::contract::Error::AbiError(err) => EvmError::Decode(err.to_string()),
            other => EvmError::classify(None, &other.to_string()),
        }
    }
}

impl From<alloy::hex::FromHexError> for EvmError {
    fn from(e: alloy::hex::FromHexError) -> Self {
        EvmError::Other(e.to_string())
    }
}
