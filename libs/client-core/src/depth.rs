//! Order-book statistics
//!
//! Summary statistics of level prices per book side and quantity-weighted
//! cumulative depth curves.

use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use types::market::PriceLevel;
use types::side::Side;

/// Descriptive statistics of level prices, one book side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceSummary {
    pub count: usize,
    pub mean: Decimal,
    /// Sample standard deviation; `None` with fewer than two levels
    pub std: Option<Decimal>,
    pub min: Decimal,
    pub p25: Decimal,
    pub p50: Decimal,
    pub p75: Decimal,
    pub max: Decimal,
}

/// Linear-interpolated quantile of an ascending, non-empty slice.
fn quantile(sorted: &[Decimal], q: Decimal) -> Decimal {
    let last = sorted.len() - 1;
    let position = q * Decimal::from(last);
    let lower = position.floor();
    let lower_idx = lower.to_usize().unwrap_or(0).min(last);
    let upper_idx = (lower_idx + 1).min(last);
    let fraction = position - lower;
    sorted[lower_idx] + (sorted[upper_idx] - sorted[lower_idx]) * fraction
}

/// Summarize level prices; `None` for an empty side.
pub fn describe(levels: &[PriceLevel]) -> Option<PriceSummary> {
    if levels.is_empty() {
        return None;
    }

    let mut prices: Vec<Decimal> = levels.iter().map(|l| l.price.as_decimal()).collect();
    prices.sort();

    let count = prices.len();
    let n = Decimal::from(count);
    let mean = prices.iter().copied().sum::<Decimal>() / n;
    let std = if count > 1 {
        let squares: Decimal = prices.iter().map(|p| (*p - mean) * (*p - mean)).sum();
        (squares / (n - Decimal::ONE)).sqrt()
    } else {
        None
    };

    Some(PriceSummary {
        count,
        mean,
        std,
        min: prices[0],
        p25: quantile(&prices, Decimal::new(25, 2)),
        p50: quantile(&prices, Decimal::new(50, 2)),
        p75: quantile(&prices, Decimal::new(75, 2)),
        max: prices[count - 1],
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepthPoint {
    pub price: Decimal,
    pub cumulative_quantity: Decimal,
}

/// Cumulative quantity walking away from the touch.
///
/// Asks accumulate upward from the lowest price; bids accumulate downward from
/// the highest, so each bid point is the quantity available at or above its
/// price.
pub fn cumulative_depth(levels: &[PriceLevel], side: Side) -> Vec<DepthPoint> {
    let mut sorted: Vec<&PriceLevel> = levels.iter().collect();
    match side {
        Side::Sell => sorted.sort_by_key(|l| l.price),
        Side::Buy => sorted.sort_by_key(|l| std::cmp::Reverse(l.price)),
    }

    let mut running = Decimal::ZERO;
    sorted
        .into_iter()
        .map(|level| {
            running += level.quantity.as_decimal();
            DepthPoint {
                price: level.price.as_decimal(),
                cumulative_quantity: running,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use types::numeric::{Price, Quantity};

    fn level(price: u64, qty: u64) -> PriceLevel {
        PriceLevel {
            price: Price::from_u64(price),
            quantity: Quantity::from_u64(qty),
        }
    }

    #[test]
    fn test_describe_empty() {
        assert!(describe(&[]).is_none());
    }

    #[test]
    fn test_describe_single_level() {
        let summary = describe(&[level(100, 1)]).unwrap();
        assert_eq!(summary.count, 1);
        assert_eq!(summary.mean, Decimal::from(100));
        assert!(summary.std.is_none());
        assert_eq!(summary.p25, Decimal::from(100));
        assert_eq!(summary.max, Decimal::from(100));
    }

    #[test]
    fn test_describe_quartiles_interpolate() {
        let levels = [level(4, 1), level(1, 1), level(3, 1), level(2, 1)];
        let summary = describe(&levels).unwrap();
        assert_eq!(summary.min, Decimal::from(1));
        assert_eq!(summary.max, Decimal::from(4));
        assert_eq!(summary.mean, Decimal::from_str("2.5").unwrap());
        assert_eq!(summary.p25, Decimal::from_str("1.75").unwrap());
        assert_eq!(summary.p50, Decimal::from_str("2.5").unwrap());
        assert_eq!(summary.p75, Decimal::from_str("3.25").unwrap());
    }

    #[test]
    fn test_describe_std() {
        let levels = [level(2, 1), level(4, 1), level(4, 1), level(4, 1), level(5, 1), level(5, 1), level(7, 1), level(9, 1)];
        let summary = describe(&levels).unwrap();
        let std = summary.std.unwrap();
        // sample std of the classic {2,4,4,4,5,5,7,9} set is sqrt(32/7)
        let expected = Decimal::from_str("2.138089935299395").unwrap();
        assert!((std - expected).abs() < Decimal::from_str("0.000000001").unwrap());
    }

    #[test]
    fn test_cumulative_depth_asks_ascending() {
        let asks = [level(102, 2), level(101, 1), level(103, 5)];
        let curve = cumulative_depth(&asks, Side::Sell);
        let points: Vec<(Decimal, Decimal)> =
            curve.iter().map(|p| (p.price, p.cumulative_quantity)).collect();
        assert_eq!(
            points,
            vec![
                (Decimal::from(101), Decimal::from(1)),
                (Decimal::from(102), Decimal::from(3)),
                (Decimal::from(103), Decimal::from(8)),
            ]
        );
    }

    #[test]
    fn test_cumulative_depth_bids_descending() {
        let bids = [level(98, 4), level(100, 1), level(99, 2)];
        let curve = cumulative_depth(&bids, Side::Buy);
        assert_eq!(curve[0].price, Decimal::from(100));
        assert_eq!(curve[0].cumulative_quantity, Decimal::from(1));
        assert_eq!(curve[2].price, Decimal::from(98));
        assert_eq!(curve[2].cumulative_quantity, Decimal::from(7));
    }
}
