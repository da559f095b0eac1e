use anyhow::Context;
use clap::{Parser, Subcommand};
use client_core::aggregation::{aggregate_fills, split_lots};
use client_core::depth::{cumulative_depth, describe};
use client_core::export::{build_export, export_json, write_to_file};
use client_core::reconcile::reconcile;
use client_core::resample::resample_ohlc;
use client_core::signing::{OffsetClock, SystemClock};
use client_core::valuation::{summarize, value_fills};
use rest_client::paging::fetch_trade_history;
use rest_client::{ClientConfig, RestClient};
use rust_decimal::Decimal;
use serde_json::json;
use tracing_subscriber::EnvFilter;
use types::side::Side;

#[derive(Debug, Parser)]
#[command(name = "pynance", version, about = "Exchange REST client and lot reconciler")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Exchange clock and its offset from the local clock
    Clock,
    /// Order-book snapshot with per-side statistics
    Book {
        symbol: String,
        #[arg(long)]
        limit: Option<u32>,
    },
    /// Recent trade history resampled into OHLCV bars
    History {
        symbol: String,
        #[arg(long, default_value_t = 1000)]
        limit: u32,
        #[arg(long, default_value_t = 1)]
        blocks: usize,
        #[arg(long, default_value_t = 60_000)]
        interval_ms: i64,
    },
    /// Reconcile the account's buy and sell lots
    Lots {
        symbol: String,
        /// Also write the export to this path
        #[arg(long)]
        out: Option<String>,
    },
    /// Mark the account's fills against the current price
    Positions { symbol: String },
}

/// A client that signs on the exchange clock rather than the local one.
async fn synchronized(
    public: &RestClient,
    config: ClientConfig,
) -> Result<RestClient<OffsetClock<SystemClock>>, anyhow::Error> {
    let offset = public.measure_clock_offset().await?;
    tracing::info!(offset_ms = offset, "Signing with exchange clock offset");
    Ok(RestClient::with_clock_offset(config, SystemClock, offset)?)
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = ClientConfig::from_env().context("loading client configuration")?;
    tracing::info!(base_url = %config.base_url, "Starting pynance");
    let client = RestClient::new(config.clone())?;

    let output = match cli.command {
        Command::Clock => {
            let server = client.server_time().await?;
            let offset = client.measure_clock_offset().await?;
            json!({
                "server_time": server.server_time,
                "server_time_utc": chrono::DateTime::from_timestamp_millis(server.server_time)
                    .map(|t| t.to_rfc3339()),
                "offset_ms": offset,
            })
        }
        Command::Book { symbol, limit } => {
            let ticker = client.book_ticker(&symbol).await?;
            let book = client.depth(&symbol, limit).await?;
            json!({
                "symbol": symbol,
                "best_bid": ticker.bid_price,
                "best_ask": ticker.ask_price,
                "spread": ticker.spread(),
                "mid": ticker.mid(),
                "bids": describe(&book.bids),
                "asks": describe(&book.asks),
                "bid_depth": cumulative_depth(&book.bids, Side::Buy),
                "ask_depth": cumulative_depth(&book.asks, Side::Sell),
            })
        }
        Command::History {
            symbol,
            limit,
            blocks,
            interval_ms,
        } => {
            let trades = fetch_trade_history(&client, &symbol, limit, blocks).await?;
            tracing::info!(symbol = %symbol, trades = trades.len(), "Fetched trade history");
            let bars = resample_ohlc(&trades, interval_ms)?;
            json!({ "symbol": symbol, "interval_ms": interval_ms, "bars": bars })
        }
        Command::Lots { symbol, out } => {
            let fills = synchronized(&client, config).await?.my_trades(&symbol).await?;
            let orders = aggregate_fills(&fills);
            let (buys, sells) = split_lots(&orders);
            tracing::info!(
                symbol = %symbol,
                fills = fills.len(),
                buys = buys.len(),
                sells = sells.len(),
                "Reconciling lots"
            );

            let regions = reconcile(&buys, &sells)?;
            let mark: Decimal = client.average_price(&symbol).await?.price.as_decimal();
            let export = build_export(&symbol, Some(mark), regions);
            if let Some(path) = out {
                write_to_file(&export, &path).with_context(|| format!("writing {path}"))?;
                tracing::info!(path = %path, "Wrote reconciliation export");
            }
            println!("{}", export_json(&export)?);
            return Ok(());
        }
        Command::Positions { symbol } => {
            let fills = synchronized(&client, config).await?.my_trades(&symbol).await?;
            let mark = client.ticker_price(&symbol).await?.price.as_decimal();
            let valuations = value_fills(&fills, mark);
            json!({
                "symbol": symbol,
                "mark_price": mark,
                "summary": summarize(&valuations),
                "fills": valuations,
            })
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
