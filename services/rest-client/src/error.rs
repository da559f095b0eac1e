use client_core::signing::SigningError;
use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

/// Error body the exchange returns alongside a non-success status
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ExchangeErrorBody {
    pub code: i64,
    pub msg: String,
}

/// Central error type for the REST client
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("HTTP {status}: {}", describe_body(.body))]
    Status {
        status: StatusCode,
        body: Option<ExchangeErrorBody>,
    },

    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Signing error: {0}")]
    Signing(#[from] SigningError),

    #[error("Missing credentials: {0}")]
    MissingCredentials(&'static str),

    #[error("Configuration error: {0}")]
    Config(String),
}

fn describe_body(body: &Option<ExchangeErrorBody>) -> String {
    match body {
        Some(b) => format!("code {} ({})", b.code, b.msg),
        None => "no error body".to_string(),
    }
}

impl ClientError {
    /// Build a status error, keeping the exchange body when it parses.
    pub fn from_status(status: StatusCode, text: &str) -> Self {
        ClientError::Status {
            status,
            body: serde_json::from_str(text).ok(),
        }
    }

    /// Exchange error code, when the exchange sent one
    pub fn exchange_code(&self) -> Option<i64> {
        match self {
            ClientError::Status { body: Some(b), .. } => Some(b.code),
            _ => None,
        }
    }
}
