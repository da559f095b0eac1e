//! Aggregated order lots
//!
//! A lot is the per-order aggregate of one or more fills: the last fill price,
//! the summed quantity and the side. Lots are the input of cost-basis
//! reconciliation.

use crate::numeric::{Price, Quantity};
use crate::side::Side;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lot {
    pub price: Price,
    pub quantity: Quantity,
    pub side: Side,
    /// Unix millis; only used to establish arrival order
    pub timestamp: i64,
}

impl Lot {
    pub fn new(side: Side, price: Price, quantity: Quantity, timestamp: i64) -> Self {
        Self {
            price,
            quantity,
            side,
            timestamp,
        }
    }

    pub fn buy(price: Price, quantity: Quantity, timestamp: i64) -> Self {
        Self::new(Side::Buy, price, quantity, timestamp)
    }

    pub fn sell(price: Price, quantity: Quantity, timestamp: i64) -> Self {
        Self::new(Side::Sell, price, quantity, timestamp)
    }

    /// Quote value of the lot (price × quantity)
    pub fn notional(&self) -> rust_decimal::Decimal {
        self.price.as_decimal() * self.quantity.as_decimal()
    }
}
