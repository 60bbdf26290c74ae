// src/error.rs
use thiserror::Error;

/// Failures talking to the exchange. These never reach the decision loop:
/// the `ExchangeClient` impls log them and hand back a zero/empty value.
#[derive(Debug, Error)]
pub enum ExchangeError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Rejection reported by the exchange (`{"code": .., "msg": ..}` body).
    #[error("exchange rejected request (HTTP {status}, code {code}): {message}")]
    Api {
        status: u16,
        code: i64,
        message: String,
    },

    #[error("unexpected HTTP status {status}: {body}")]
    Http { status: u16, body: String },

    #[error("failed to decode response: {0}")]
    Decode(String),

    #[error("failed to sign request: {0}")]
    Signing(String),

    #[error("asset {0} not found in account")]
    MissingAsset(String),
}

impl ExchangeError {
    /// Transient failures worth another attempt. Rejections are final.
    pub fn is_retryable(&self) -> bool {
        match self {
            ExchangeError::Network(_) => true,
            ExchangeError::Api { status, .. } | ExchangeError::Http { status, .. } => {
                *status >= 500 || *status == 429 || *status == 418
            }
            ExchangeError::Decode(_)
            | ExchangeError::Signing(_)
            | ExchangeError::MissingAsset(_) => false,
        }
    }
}

/// Start-up configuration problems. Fatal: the agent refuses to start.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load settings: {0}")]
    Load(#[from] config::ConfigError),

    #[error("{0} is missing or empty")]
    MissingCredential(&'static str),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}
