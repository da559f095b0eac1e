//! Position valuation — mark-to-market of individual fills
//!
//! Values each of the account's fills against a single mark price and tracks
//! the running net position in base units.

use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use types::side::Side;
use types::trade::AccountTrade;

/// Internal precision for ratios.
const INTERNAL_DP: u32 = 18;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FillValuation {
    pub order_id: u64,
    pub trade_id: u64,
    pub time: i64,
    pub side: Side,
    /// qty × fill price
    pub cost: Decimal,
    /// qty × mark price
    pub value: Decimal,
    /// value − cost
    pub delta: Decimal,
    /// delta / quote quantity; `None` when the quote quantity is zero
    pub delta_rate: Option<Decimal>,
    pub delta_pct: Option<Decimal>,
    /// +qty for buys, −qty for sells
    pub relative_qty: Decimal,
    /// Cumulative sum of `relative_qty` up to and including this fill
    pub net_position: Decimal,
}

/// Value fills in input order against `mark_price`.
pub fn value_fills(fills: &[AccountTrade], mark_price: Decimal) -> Vec<FillValuation> {
    let mut net_position = Decimal::ZERO;
    fills
        .iter()
        .map(|fill| {
            let qty = fill.qty.as_decimal();
            let cost = qty * fill.price.as_decimal();
            let value = qty * mark_price;
            let delta = value - cost;
            let delta_rate = if fill.quote_qty.is_zero() {
                None
            } else {
                delta
                    .checked_div(fill.quote_qty)
                    .map(|r| r.round_dp_with_strategy(INTERNAL_DP, RoundingStrategy::MidpointAwayFromZero))
            };
            let relative_qty = qty * Decimal::from(fill.side().sign());
            net_position += relative_qty;

            FillValuation {
                order_id: fill.order_id,
                trade_id: fill.id,
                time: fill.time,
                side: fill.side(),
                cost,
                value,
                delta,
                delta_rate,
                delta_pct: delta_rate.map(|r| r * Decimal::ONE_HUNDRED),
                relative_qty,
                net_position,
            }
        })
        .collect()
}

/// Totals across a valuation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValuationSummary {
    pub fill_count: usize,
    pub net_position: Decimal,
    pub total_cost: Decimal,
    pub total_value: Decimal,
    pub total_delta: Decimal,
}

pub fn summarize(valuations: &[FillValuation]) -> ValuationSummary {
    let mut summary = ValuationSummary {
        fill_count: valuations.len(),
        net_position: Decimal::ZERO,
        total_cost: Decimal::ZERO,
        total_value: Decimal::ZERO,
        total_delta: Decimal::ZERO,
    };
    for v in valuations {
        summary.total_cost += v.cost;
        summary.total_value += v.value;
        summary.total_delta += v.delta;
    }
    summary.net_position = valuations.last().map(|v| v.net_position).unwrap_or_default();
    summary
}
