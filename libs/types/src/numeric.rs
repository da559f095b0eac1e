//! Fixed-point decimal types for prices and quantities
//!
//! Uses rust_decimal for exact arithmetic. The exchange sends every price and
//! quantity as a decimal string ("0.10000000"), so both types deserialize from
//! strings as well as JSON numbers and serialize back to strings.

use crate::errors::TypeError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};
use std::str::FromStr;

/// A strictly positive price in quote currency
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(Decimal);

impl Price {
    /// Create a price, rejecting zero and negative values
    pub fn new(value: Decimal) -> Result<Self, TypeError> {
        if value <= Decimal::ZERO {
            return Err(TypeError::InvalidPrice(value.to_string()));
        }
        Ok(Self(value))
    }

    pub fn from_u64(value: u64) -> Self {
        Self(Decimal::from(value))
    }

    /// Parse a price from its exchange string form
    pub fn from_str(value: &str) -> Result<Self, TypeError> {
        let parsed = Decimal::from_str(value.trim())
            .map_err(|_| TypeError::InvalidPrice(value.to_string()))?;
        Self::new(parsed)
    }

    pub fn as_decimal(&self) -> Decimal {
        self.0
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A non-negative base-asset quantity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Quantity(Decimal);

impl Quantity {
    /// Create a quantity, rejecting negative values
    pub fn new(value: Decimal) -> Result<Self, TypeError> {
        if value < Decimal::ZERO {
            return Err(TypeError::InvalidQuantity(value.to_string()));
        }
        Ok(Self(value))
    }

    pub fn zero() -> Self {
        Self(Decimal::ZERO)
    }

    pub fn from_u64(value: u64) -> Self {
        Self(Decimal::from(value))
    }

    /// Parse a quantity from its exchange string form
    pub fn from_str(value: &str) -> Result<Self, TypeError> {
        let parsed = Decimal::from_str(value.trim())
            .map_err(|_| TypeError::InvalidQuantity(value.to_string()))?;
        Self::new(parsed)
    }

    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

impl Add for Quantity {
    type Output = Quantity;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

/// Saturates at zero; a quantity never goes negative
impl Sub for Quantity {
    type Output = Quantity;

    fn sub(self, rhs: Self) -> Self::Output {
        Self((self.0 - rhs.0).max(Decimal::ZERO))
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
