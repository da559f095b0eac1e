//! Async REST client for a Binance-style spot exchange.
//!
//! Public market data, API-key endpoints and HMAC-signed account endpoints.
//! Signing and all analytics live in `client-core`; this crate only does I/O.

pub mod client;
pub mod config;
pub mod error;
pub mod paging;

pub use client::RestClient;
pub use config::ClientConfig;
pub use error::ClientError;
