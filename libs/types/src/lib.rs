//! Types library for the exchange client
//!
//! Core type definitions shared by the client computation layer and the REST
//! client: exact decimal prices and quantities, trade records, market data
//! payloads and aggregated lots.
//!
//! # Modules
//! - `numeric`: Fixed-point decimal types (Price, Quantity)
//! - `side`: Buy/sell side
//! - `trade`: Account fills and public trades
//! - `market`: Server time, average price, tickers, order book depth
//! - `lot`: Per-order aggregated lots
//! - `errors`: Error taxonomy

// Public modules
pub mod numeric;
pub mod side;
pub mod trade;
pub mod market;
pub mod lot;
pub mod errors;
