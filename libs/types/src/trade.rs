//! Trade records as returned by the exchange REST API
//!
//! `AccountTrade` is one fill of one of the account's own orders
//! (authenticated `myTrades`); `PublicTrade` is a print from the public tape
//! (`trades` / `historicalTrades`). Field names follow the exchange's camelCase.

use crate::errors::TypeError;
use crate::numeric::{Price, Quantity};
use crate::side::Side;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

fn millis_to_datetime(millis: i64) -> Result<DateTime<Utc>, TypeError> {
    DateTime::from_timestamp_millis(millis).ok_or(TypeError::InvalidTimestamp(millis))
}

/// A fill belonging to the authenticated account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountTrade {
    #[serde(default)]
    pub symbol: String,
    pub id: u64,
    pub order_id: u64,
    pub price: Price,
    pub qty: Quantity,
    pub quote_qty: Decimal,
    #[serde(default)]
    pub commission: Decimal,
    #[serde(default)]
    pub commission_asset: String,
    /// Unix millis
    pub time: i64,
    pub is_buyer: bool,
    #[serde(default)]
    pub is_maker: bool,
    #[serde(default)]
    pub is_best_match: bool,
}

impl AccountTrade {
    pub fn side(&self) -> Side {
        Side::from_is_buyer(self.is_buyer)
    }

    pub fn executed_at(&self) -> Result<DateTime<Utc>, TypeError> {
        millis_to_datetime(self.time)
    }

    /// Calculate trade value (price × quantity)
    pub fn trade_value(&self) -> Decimal {
        self.qty.as_decimal() * self.price.as_decimal()
    }
}

/// A trade from the public tape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicTrade {
    pub id: u64,
    pub price: Price,
    pub qty: Quantity,
    #[serde(default)]
    pub quote_qty: Decimal,
    /// Unix millis
    pub time: i64,
    #[serde(default)]
    pub is_buyer_maker: bool,
    #[serde(default)]
    pub is_best_match: bool,
}

impl PublicTrade {
    pub fn executed_at(&self) -> Result<DateTime<Utc>, TypeError> {
        millis_to_datetime(self.time)
    }

    /// Aggressor side: a buyer-maker print was initiated by a seller
    pub fn taker_side(&self) -> Side {
        if self.is_buyer_maker {
            Side::Sell
        } else {
            Side::Buy
        }
    }
}
