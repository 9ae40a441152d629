//! Error taxonomy shared by the broker and the HTTP gateway

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BrokerError {
    #[error("bad arguments: {0}")]
    BadArguments(String),
    #[error("not found")]
    NotFound,
    #[error("timed out waiting for queue capacity")]
    Timeout,
    #[error("internal error: {0}")]
    Internal(String),
}

pub type BrokerResult<T> = std::result::Result<T, BrokerError>;
