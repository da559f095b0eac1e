//! Backward paging through public trade history

use crate::error::ClientError;
use async_trait::async_trait;
use types::trade::PublicTrade;

/// Anything that can serve blocks of public trades.
#[async_trait]
pub trait TradeSource {
    async fn recent_trades(&self, symbol: &str, limit: u32) -> Result<Vec<PublicTrade>, ClientError>;

    async fn historical_trades(
        &self,
        symbol: &str,
        limit: u32,
        from_id: u64,
    ) -> Result<Vec<PublicTrade>, ClientError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cursor {
    /// Next block is the most recent one
    Start,
    /// Next block starts at this trade id
    From(u64),
    Exhausted,
}

/// Walks trade history backwards in fixed-size blocks.
///
/// The first block is the latest `limit` trades; each later block ends where
/// the previous one began. Paging stops after the block starting at id 0 or
/// on an empty block.
#[derive(Debug, Clone)]
pub struct TradePager {
    symbol: String,
    limit: u32,
    cursor: Cursor,
}

impl TradePager {
    pub fn new(symbol: impl Into<String>, limit: u32) -> Self {
        Self {
            symbol: symbol.into(),
            limit,
            cursor: Cursor::Start,
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.cursor == Cursor::Exhausted
    }

    /// Fetch the next older block; `None` once exhausted.
    pub async fn next_block<S>(&mut self, source: &S) -> Result<Option<Vec<PublicTrade>>, ClientError>
    where
        S: TradeSource + Sync + ?Sized,
    {
        let block = match self.cursor {
            Cursor::Exhausted => return Ok(None),
            Cursor::Start => source.recent_trades(&self.symbol, self.limit).await?,
            Cursor::From(from_id) => {
                source
                    .historical_trades(&self.symbol, self.limit, from_id)
                    .await?
            }
        };

        self.cursor = match (self.cursor, block.first()) {
            (_, None) | (Cursor::From(0), _) => Cursor::Exhausted,
            (_, Some(top)) => Cursor::From(top.id.saturating_sub(u64::from(self.limit))),
        };
        tracing::debug!(symbol = %self.symbol, trades = block.len(), cursor = ?self.cursor, "trade block");

        if block.is_empty() {
            Ok(None)
        } else {
            Ok(Some(block))
        }
    }
}

/// Fetch up to `blocks` blocks of history, sorted by time then id, one entry
/// per trade id.
pub async fn fetch_trade_history<S>(
    source: &S,
    symbol: &str,
    limit: u32,
    blocks: usize,
) -> Result<Vec<PublicTrade>, ClientError>
where
    S: TradeSource + Sync + ?Sized,
{
    let mut pager = TradePager::new(symbol, limit);
    let mut trades = Vec::new();
    for _ in 0..blocks {
        match pager.next_block(source).await? {
            Some(block) => trades.extend(block),
            None => break,
        }
    }

    trades.sort_by_key(|t| (t.time, t.id));
    trades.dedup_by_key(|t| t.id);
    Ok(trades)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use std::sync::Mutex;
    use types::numeric::{Price, Quantity};

    /// Serves trades with ids `0..total`, one per second.
    struct MockSource {
        total: u64,
        calls: Mutex<Vec<Option<u64>>>,
    }

    impl MockSource {
        fn new(total: u64) -> Self {
            Self {
                total,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn trades(&self, from: u64, limit: u32) -> Vec<PublicTrade> {
            (from..self.total.min(from + u64::from(limit)))
                .map(|id| PublicTrade {
                    id,
                    price: Price::from_u64(100 + id),
                    qty: Quantity::from_u64(1),
                    quote_qty: Decimal::from(100 + id),
                    time: id as i64 * 1_000,
                    is_buyer_maker: id % 2 == 0,
                    is_best_match: true,
                })
                .collect()
        }
    }

    #[async_trait]
    impl TradeSource for MockSource {
        async fn recent_trades(&self, _symbol: &str, limit: u32) -> Result<Vec<PublicTrade>, ClientError> {
            self.calls.lock().unwrap().push(None);
            Ok(self.trades(self.total.saturating_sub(u64::from(limit)), limit))
        }

        async fn historical_trades(
            &self,
            _symbol: &str,
            limit: u32,
            from_id: u64,
        ) -> Result<Vec<PublicTrade>, ClientError> {
            self.calls.lock().unwrap().push(Some(from_id));
            Ok(self.trades(from_id, limit))
        }
    }

    #[tokio::test]
    async fn test_pager_walks_back_to_zero() {
        let source = MockSource::new(25);
        let mut pager = TradePager::new("BTCAUD", 10);

        let mut sizes = Vec::new();
        while let Some(block) = pager.next_block(&source).await.unwrap() {
            sizes.push(block.len());
        }

        assert!(pager.is_exhausted());
        // recent 15..25, then 5..15, then 0..10 (fromId saturates at 0)
        assert_eq!(*source.calls.lock().unwrap(), vec![None, Some(5), Some(0)]);
        assert_eq!(sizes, vec![10, 10, 10]);
    }

    #[tokio::test]
    async fn test_history_sorted_and_deduplicated() {
        let source = MockSource::new(25);
        let trades = fetch_trade_history(&source, "BTCAUD", 10, 5).await.unwrap();

        let ids: Vec<u64> = trades.iter().map(|t| t.id).collect();
        assert_eq!(ids, (0..25).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_history_respects_block_count() {
        let source = MockSource::new(100);
        let trades = fetch_trade_history(&source, "BTCAUD", 10, 2).await.unwrap();
        assert_eq!(trades.len(), 20);
        assert_eq!(trades.first().unwrap().id, 80);
        assert_eq!(source.calls.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_empty_market() {
        let source = MockSource::new(0);
        let mut pager = TradePager::new("BTCAUD", 10);
        assert!(pager.next_block(&source).await.unwrap().is_none());
        assert!(pager.is_exhausted());
    }
}
