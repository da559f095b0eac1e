//! Error types for wire-level values
//!
//! Error taxonomy using thiserror

use thiserror::Error;

/// Raised when a value received from (or destined for) the exchange is malformed
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TypeError {
    #[error("Invalid price: {0}")]
    InvalidPrice(String),

    #[error("Invalid quantity: {0}")]
    InvalidQuantity(String),

    #[error("Invalid side: {0}")]
    InvalidSide(String),

    #[error("Timestamp out of range: {0}")]
    InvalidTimestamp(i64),
}
