use greendish_commons::error::{CodedError, ErrorCode, ExternalError, format_with_code};
use thiserror::Error;

pub type ConnectorResult<T> = Result<T, ConnectorError>;

#[derive(Debug, Error)]
pub enum ConnectorError {
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("no rpc endpoint configured for chain {chain_id}")]
    UnknownChain { chain_id: u64 },
    #[error("no signing key for account {account}")]
    UnknownAccount { account: String },
    #[error("backend error: {source}")]
    Backend {
        #[source]
        source: ExternalError,
    },
}

impl ConnectorError {
    pub fn backend<E>(err: E) -> Self
    where
        E: Into<ExternalError>,
    {
        ConnectorError::Backend { source: err.into() }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        ConnectorError::InvalidInput {
            message: message.into(),
        }
    }
}

impl From<ConnectorError> for ExternalError {
    fn from(value: ConnectorError) -> Self {
        ExternalError(value.to_string())
    }
}

impl From<ConnectorError> for String {
    fn from(value: ConnectorError) -> Self {
        format_with_code(&value)
    }
}

impl CodedError for ConnectorError {
    fn code(&self) -> ErrorCode {
        match self {
            ConnectorError::InvalidInput { .. } | ConnectorError::UnknownChain { .. } | ConnectorError::UnknownAccount { .. } => {
                ErrorCode::ConnectorInvalidInput
            }
            ConnectorError::Backend { .. } => ErrorCode::ConnectorBackend,
        }
    }
}
