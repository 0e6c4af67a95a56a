//! Exchange error types.

/// Errors that can occur during exchange operations.
#[derive(Debug, thiserror::Error)]
pub enum BrokerError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("trade error: {0}")]
    Trade(String),

    #[error("invalid symbol: {0}")]
    InvalidSymbol(String),

    #[error("authentication error: {0}")]
    Auth(String),

    #[error("rate limit exceeded")]
    RateLimit,

    #[error("parse error: {0}")]
    Parse(String),

    #[error("{0}")]
    Other(String),
}
