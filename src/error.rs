//! Exchange client error types

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExchangeError {
    #[error("Network error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("API error {code}: {message}")]
    Api { code: String, message: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Credentials error: {0}")]
    Credentials(String),
}

impl From<serde_json::Error> for ExchangeError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err.to_string())
    }
}

impl From<rust_decimal::Error> for ExchangeError {
    fn from(err: rust_decimal::Error) -> Self {
        Self::Parse(err.to_string())
    }
}

pub type ExchangeResult<T> = Result<T, ExchangeError>;
