//! Lot Reconciler — Cost-basis geometry from buy and sell lots
//!
//! Walks time-ordered buy and sell lots as two queues and lays them out along
//! a cumulative-quantity axis:
//! - every buy lot becomes a *buy region* `[buy_consumed, +qty)` at its price
//! - every visited sell lot becomes a *sell region* `[sell_consumed, +qty)`
//! - each matched slice becomes an *overlap region* spanning buy price → sell
//!   price, whose signed area is the realized spread for that quantity
//!
//! A sell lot that extends past the quantity bought so far is only partially
//! matched; the remainder ("spill") is carried to the next sell step after the
//! buy side has advanced.
//!
//! The walk is an explicit state machine: [`Reconciler::phase`] derives the
//! next transition from [`ReconciliationState`] and [`Reconciler::step`]
//! performs exactly one.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use types::lot::Lot;
use types::side::Side;

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegionKind {
    Buy,
    Sell,
    Overlap,
}

/// Axis-aligned rectangle on the (cumulative quantity, price) plane.
///
/// `height` of an overlap region is `sell_price - buy_price` and is negative
/// for a loss.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub kind: RegionKind,
    pub x0: Decimal,
    pub width: Decimal,
    pub y0: Decimal,
    pub height: Decimal,
}

impl Region {
    fn buy(x0: Decimal, lot: &Lot) -> Self {
        Self {
            kind: RegionKind::Buy,
            x0,
            width: lot.quantity.as_decimal(),
            y0: Decimal::ZERO,
            height: lot.price.as_decimal(),
        }
    }

    fn sell(x0: Decimal, lot: &Lot) -> Self {
        Self {
            kind: RegionKind::Sell,
            x0,
            width: lot.quantity.as_decimal(),
            y0: Decimal::ZERO,
            height: lot.price.as_decimal(),
        }
    }

    fn overlap(x0: Decimal, width: Decimal, buy_price: Decimal, sell_price: Decimal) -> Self {
        Self {
            kind: RegionKind::Overlap,
            x0,
            width,
            y0: buy_price,
            height: sell_price - buy_price,
        }
    }

    /// Right edge on the quantity axis
    pub fn x1(&self) -> Decimal {
        self.x0 + self.width
    }

    /// Signed area; for overlap regions this is the realized spread
    pub fn area(&self) -> Decimal {
        self.width * self.height
    }
}

// ---------------------------------------------------------------------------
// State machine
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Open the next buy window
    AdvancingBuy,
    /// Match the current sell lot against the open buy window
    AdvancingSell,
    Done,
}

/// Mutable cursor state of one reconciliation run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconciliationState {
    pub buy_cursor: usize,
    pub sell_cursor: usize,
    pub buy_consumed_qty: Decimal,
    pub sell_consumed_qty: Decimal,
    /// Positive while the current sell lot still has quantity left to place
    pub spill: Decimal,
    /// Price of the buy lot that last extended the window
    pub window_price: Decimal,
}

/// Two-queue walk over one immutable pair of lot sequences.
#[derive(Debug, Clone)]
pub struct Reconciler<'a> {
    buys: &'a [Lot],
    sells: &'a [Lot],
    state: ReconciliationState,
}

impl<'a> Reconciler<'a> {
    /// Validate inputs and start a fresh run.
    ///
    /// Both sequences must hold lots of the matching side, sorted by
    /// timestamp, with positive prices and non-negative quantities.
    pub fn new(buys: &'a [Lot], sells: &'a [Lot]) -> Result<Self, ReconcileError> {
        validate_lots(buys, Side::Buy)?;
        validate_lots(sells, Side::Sell)?;
        Ok(Self {
            buys,
            sells,
            state: ReconciliationState::default(),
        })
    }

    pub fn state(&self) -> &ReconciliationState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        let s = &self.state;
        let buys_left = s.buy_cursor < self.buys.len();
        let sells_left = s.sell_cursor < self.sells.len();
        let window_open = s.sell_consumed_qty < s.buy_consumed_qty;

        if buys_left && (!window_open || !sells_left) {
            Phase::AdvancingBuy
        } else if sells_left && window_open {
            Phase::AdvancingSell
        } else {
            Phase::Done
        }
    }

    /// Perform one transition and return the regions it emits.
    ///
    /// A buy step emits one region; a sell step emits an overlap region,
    /// preceded by a sell region on the lot's first visit. Returns an empty
    /// vector once done.
    pub fn step(&mut self) -> Vec<Region> {
        match self.phase() {
            Phase::AdvancingBuy => vec![self.advance_buy()],
            Phase::AdvancingSell => self.advance_sell(),
            Phase::Done => Vec::new(),
        }
    }

    /// Drive the machine to completion.
    pub fn run(mut self) -> Vec<Region> {
        let mut regions = Vec::with_capacity(self.buys.len() + 2 * self.sells.len());
        while self.phase() != Phase::Done {
            regions.extend(self.step());
        }
        regions
    }

    fn advance_buy(&mut self) -> Region {
        let lot = self.buys[self.state.buy_cursor];
        let region = Region::buy(self.state.buy_consumed_qty, &lot);

        self.state.window_price = lot.price.as_decimal();
        self.state.buy_consumed_qty += lot.quantity.as_decimal();
        self.state.buy_cursor += 1;
        region
    }

    fn advance_sell(&mut self) -> Vec<Region> {
        let lot = self.sells[self.state.sell_cursor];
        let s = &mut self.state;
        let mut regions = Vec::with_capacity(2);

        let first_visit = s.spill <= Decimal::ZERO;
        let sell_qty = if first_visit {
            lot.quantity.as_decimal()
        } else {
            s.spill
        };

        if first_visit {
            regions.push(Region::sell(s.sell_consumed_qty, &lot));
        }

        let open = s.buy_consumed_qty - s.sell_consumed_qty;
        let matched = sell_qty.min(open);
        regions.push(Region::overlap(
            s.sell_consumed_qty,
            matched,
            s.window_price,
            lot.price.as_decimal(),
        ));

        s.spill = s.sell_consumed_qty + sell_qty - s.buy_consumed_qty;
        if s.spill > Decimal::ZERO {
            s.sell_consumed_qty = s.buy_consumed_qty;
        } else {
            s.sell_consumed_qty += sell_qty;
            s.sell_cursor += 1;
        }

        regions
    }
}

/// Reconcile pre-aggregated, time-sorted buy and sell lots into regions.
pub fn reconcile(buys: &[Lot], sells: &[Lot]) -> Result<Vec<Region>, ReconcileError> {
    Ok(Reconciler::new(buys, sells)?.run())
}

fn validate_lots(lots: &[Lot], side: Side) -> Result<(), ReconcileError> {
    let mut previous: Option<i64> = None;
    let mut total = Decimal::ZERO;
    for (index, lot) in lots.iter().enumerate() {
        if lot.side != side {
            return Err(ReconcileError::InvalidArgument(format!(
                "{side} lot {index} has side {}",
                lot.side
            )));
        }
        if lot.price.as_decimal() <= Decimal::ZERO {
            return Err(ReconcileError::InvalidArgument(format!(
                "{side} lot {index} has non-positive price {}",
                lot.price
            )));
        }
        if lot.quantity.as_decimal() < Decimal::ZERO {
            return Err(ReconcileError::InvalidArgument(format!(
                "{side} lot {index} has negative quantity {}",
                lot.quantity
            )));
        }
        if previous.is_some_and(|ts| lot.timestamp < ts) {
            return Err(ReconcileError::InvalidArgument(format!(
                "{side} lot {index} is out of timestamp order"
            )));
        }
        previous = Some(lot.timestamp);
        // Running sums in `step` stay below this total
        total = total.checked_add(lot.quantity.as_decimal()).ok_or_else(|| {
            ReconcileError::InvalidArgument(format!(
                "{side} quantities overflow at lot {index}"
            ))
        })?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReconcileError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
