//! Trade-series resampling
//!
//! Buckets public trades into fixed, epoch-aligned intervals. Buckets with no
//! trades are omitted rather than backfilled, so several series can be
//! inner-joined on bucket start with [`align_series`].

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use types::trade::PublicTrade;

/// Floor a unix-millis timestamp to its bucket boundary.
pub fn align_to_boundary(timestamp_millis: i64, interval_millis: i64) -> i64 {
    timestamp_millis.div_euclid(interval_millis) * interval_millis
}

fn check_interval(interval_millis: i64) -> Result<(), ResampleError> {
    if interval_millis <= 0 {
        return Err(ResampleError::InvalidArgument(format!(
            "interval must be positive, got {interval_millis}ms"
        )));
    }
    Ok(())
}

/// Last traded price per bucket, keyed by bucket start.
///
/// "Last" is by trade time, ties broken by trade id.
pub fn resample_last(
    trades: &[PublicTrade],
    interval_millis: i64,
) -> Result<BTreeMap<i64, Decimal>, ResampleError> {
    check_interval(interval_millis)?;

    let mut last: BTreeMap<i64, (i64, u64, Decimal)> = BTreeMap::new();
    for trade in trades {
        let bucket = align_to_boundary(trade.time, interval_millis);
        let key = (trade.time, trade.id);
        last.entry(bucket)
            .and_modify(|slot| {
                if key >= (slot.0, slot.1) {
                    *slot = (trade.time, trade.id, trade.price.as_decimal());
                }
            })
            .or_insert((trade.time, trade.id, trade.price.as_decimal()));
    }

    Ok(last.into_iter().map(|(bucket, (_, _, price))| (bucket, price)).collect())
}

/// One OHLCV bar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bar {
    pub open_time: i64,
    pub close_time: i64,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Decimal,
    pub trade_count: u64,
}

impl Bar {
    fn new(open_time: i64, interval_millis: i64, price: Decimal, volume: Decimal) -> Self {
        Self {
            open_time,
            close_time: open_time + interval_millis - 1,
            open: price,
            high: price,
            low: price,
            close: price,
            volume,
            trade_count: 1,
        }
    }

    fn update(&mut self, price: Decimal, volume: Decimal) {
        if price > self.high {
            self.high = price;
        }
        if price < self.low {
            self.low = price;
        }
        self.close = price;
        self.volume += volume;
        self.trade_count += 1;
    }

    /// Validate bar integrity (OHLCV invariants).
    pub fn is_valid(&self) -> bool {
        self.high >= self.open
            && self.high >= self.close
            && self.high >= self.low
            && self.low <= self.open
            && self.low <= self.close
            && self.volume >= Decimal::ZERO
            && self.close_time > self.open_time
    }

    /// Green when the bar closed above its open.
    pub fn is_up(&self) -> bool {
        self.close > self.open
    }
}

/// OHLCV bars in chronological order, one per non-empty bucket.
pub fn resample_ohlc(
    trades: &[PublicTrade],
    interval_millis: i64,
) -> Result<Vec<Bar>, ResampleError> {
    check_interval(interval_millis)?;

    let mut ordered: Vec<&PublicTrade> = trades.iter().collect();
    ordered.sort_by_key(|t| (t.time, t.id));

    let mut bars: BTreeMap<i64, Bar> = BTreeMap::new();
    for trade in ordered {
        let bucket = align_to_boundary(trade.time, interval_millis);
        let price = trade.price.as_decimal();
        let volume = trade.qty.as_decimal();
        bars.entry(bucket)
            .and_modify(|bar| bar.update(price, volume))
            .or_insert_with(|| Bar::new(bucket, interval_millis, price, volume));
    }

    Ok(bars.into_values().collect())
}

/// Inner-join named series on bucket start.
///
/// Each row holds the values in the iteration order of `series` (sorted by
/// name). Buckets missing from any series are dropped.
pub fn align_series(
    series: &BTreeMap<String, BTreeMap<i64, Decimal>>,
) -> Vec<(i64, Vec<Decimal>)> {
    let Some((_, first)) = series.iter().next() else {
        return Vec::new();
    };

    first
        .keys()
        .filter_map(|bucket| {
            let row: Option<Vec<Decimal>> = series
                .values()
                .map(|s| s.get(bucket).copied())
                .collect();
            row.map(|values| (*bucket, values))
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResampleError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}
