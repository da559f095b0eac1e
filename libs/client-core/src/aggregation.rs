//! Fill aggregation
//!
//! Collapses the account's individual fills into one record per order and
//! splits the result into time-sorted buy and sell lots, the input contract of
//! [`crate::reconcile`].
//!
//! Per order: time, price, commission asset and side come from the last fill
//! (input order); quantity and commission are summed.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use types::lot::Lot;
use types::numeric::{Price, Quantity};
use types::side::Side;
use types::trade::AccountTrade;

/// One order's fills, aggregated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderFill {
    pub order_id: u64,
    /// Unix millis of the last fill
    pub time: i64,
    /// Price of the last fill
    pub price: Price,
    pub quantity: Quantity,
    pub commission: Decimal,
    pub commission_asset: String,
    pub side: Side,
    pub fill_count: usize,
}

impl OrderFill {
    fn from_first(fill: &AccountTrade) -> Self {
        Self {
            order_id: fill.order_id,
            time: fill.time,
            price: fill.price,
            quantity: fill.qty,
            commission: fill.commission,
            commission_asset: fill.commission_asset.clone(),
            side: fill.side(),
            fill_count: 1,
        }
    }

    fn absorb(&mut self, fill: &AccountTrade) {
        self.time = fill.time;
        self.price = fill.price;
        self.quantity = self.quantity + fill.qty;
        self.commission += fill.commission;
        self.commission_asset = fill.commission_asset.clone();
        self.side = fill.side();
        self.fill_count += 1;
    }

    pub fn to_lot(&self) -> Lot {
        Lot::new(self.side, self.price, self.quantity, self.time)
    }
}

/// Group fills by order id. Output is ordered by ascending order id.
pub fn aggregate_fills(fills: &[AccountTrade]) -> Vec<OrderFill> {
    let mut orders: BTreeMap<u64, OrderFill> = BTreeMap::new();
    for fill in fills {
        orders
            .entry(fill.order_id)
            .and_modify(|order| order.absorb(fill))
            .or_insert_with(|| OrderFill::from_first(fill));
    }
    orders.into_values().collect()
}

/// Partition aggregated orders into buy and sell lots, each sorted by time.
///
/// The sort is stable, so orders sharing a timestamp keep order-id order.
pub fn split_lots(orders: &[OrderFill]) -> (Vec<Lot>, Vec<Lot>) {
    let (mut buys, mut sells): (Vec<Lot>, Vec<Lot>) = orders
        .iter()
        .map(OrderFill::to_lot)
        .partition(|lot| lot.side == Side::Buy);

    buys.sort_by_key(|lot| lot.timestamp);
    sells.sort_by_key(|lot| lot.timestamp);
    (buys, sells)
}
