use greendish_commons::error::{CodedError, ErrorCode};
use greendish_connectors::error::ConnectorError;
use greendish_core::error::{ReadError, SessionError, TxError};
use thiserror::Error;

use crate::config::ConfigError;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Connector(#[from] ConnectorError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Read(#[from] ReadError),
    #[error(transparent)]
    Tx(#[from] TxError),
    #[error("{message}")]
    Usage { message: String },
}

impl CliError {
    pub fn usage(message: impl Into<String>) -> Self {
        CliError::Usage {
            message: message.into(),
        }
    }
}

impl CodedError for CliError {
    fn code(&self) -> ErrorCode {
        match self {
            CliError::Config(err) => err.code(),
            CliError::Connector(err) => err.code(),
            CliError::Session(err) => err.code(),
            CliError::Read(err) => err.code(),
            CliError::Tx(err) => err.code(),
            CliError::Usage { .. } => ErrorCode::ConfigInvalidValue,
        }
    }

    fn retriable(&self) -> bool {
        match self {
            CliError::Read(err) => err.retriable(),
            CliError::Tx(err) => err.retriable(),
            _ => false,
        }
    }
}
