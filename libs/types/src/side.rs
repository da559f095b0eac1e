//! Trade side

use crate::errors::TypeError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Side of an order or fill, from the account holder's point of view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// Get the opposite side
    pub fn opposite(&self) -> Self {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }

    /// Map the exchange's `isBuyer` flag onto a side
    pub fn from_is_buyer(is_buyer: bool) -> Self {
        if is_buyer {
            Side::Buy
        } else {
            Side::Sell
        }
    }

    /// +1 for buys, -1 for sells
    pub fn sign(&self) -> i32 {
        match self {
            Side::Buy => 1,
            Side::Sell => -1,
        }
    }
}

impl TryFrom<&str> for Side {
    type Error = TypeError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.to_ascii_uppercase().as_str() {
            "BUY" => Ok(Side::Buy),
            "SELL" => Ok(Side::Sell),
            other => Err(TypeError::InvalidSide(other.to_string())),
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => write!(f, "BUY"),
            Side::Sell => write!(f, "SELL"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opposite() {
        assert_eq!(Side::Buy.opposite(), Side::Sell);
        assert_eq!(Side::Sell.opposite(), Side::Buy);
    }

    #[test]
    fn test_from_is_buyer() {
        assert_eq!(Side::from_is_buyer(true), Side::Buy);
        assert_eq!(Side::from_is_buyer(false), Side::Sell);
    }

    #[test]
    fn test_parse_case_insensitive() {
        assert_eq!(Side::try_from("buy").unwrap(), Side::Buy);
        assert_eq!(Side::try_from("SELL").unwrap(), Side::Sell);
        assert!(Side::try_from("hold").is_err());
    }

    #[test]
    fn test_serde_uppercase() {
        assert_eq!(serde_json::to_string(&Side::Buy).unwrap(), "\"BUY\"");
        let side: Side = serde_json::from_str("\"SELL\"").unwrap();
        assert_eq!(side, Side::Sell);
    }
}
