use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::paging::TradeSource;
use async_trait::async_trait;
use client_core::signing::{Clock, OffsetClock, RequestParams, RequestSigner, SystemClock};
use reqwest::Client;
use serde::de::DeserializeOwned;
use types::market::{AveragePrice, BookTicker, OrderBookDepth, ServerTime, TickerPrice};
use types::trade::{AccountTrade, PublicTrade};

pub const API_KEY_HEADER: &str = "X-MBX-APIKEY";
pub const RECV_WINDOW_KEY: &str = "recvWindow";

pub const PATH_TIME: &str = "/api/v3/time";
pub const PATH_AVG_PRICE: &str = "/api/v3/avgPrice";
pub const PATH_TICKER_PRICE: &str = "/api/v3/ticker/price";
pub const PATH_BOOK_TICKER: &str = "/api/v3/ticker/bookTicker";
pub const PATH_DEPTH: &str = "/api/v3/depth";
pub const PATH_TRADES: &str = "/api/v3/trades";
pub const PATH_HISTORICAL_TRADES: &str = "/api/v3/historicalTrades";
pub const PATH_MY_TRADES: &str = "/api/v3/myTrades";

/// How a request identifies the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Access {
    Public,
    /// `X-MBX-APIKEY` header only
    ApiKey,
    /// API key header plus timestamped, signed query string
    Signed,
}

/// Async client for the exchange's spot REST API.
#[derive(Debug)]
pub struct RestClient<C: Clock = SystemClock> {
    http: Client,
    config: ClientConfig,
    signer: Option<RequestSigner<C>>,
}

impl RestClient<SystemClock> {
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        Self::with_clock(config, SystemClock)
    }
}

impl<C: Clock> RestClient<C> {
    /// Build a client whose signed requests are stamped by `clock`.
    pub fn with_clock(config: ClientConfig, clock: C) -> Result<Self, ClientError> {
        let http = Client::builder().timeout(config.timeout).build()?;
        let signer = config
            .credentials
            .secret_key
            .clone()
            .map(|secret| RequestSigner::with_clock(secret, clock));
        Ok(Self { http, config, signer })
    }

    /// Build a client that signs with `clock` shifted by a measured
    /// exchange offset (see [`RestClient::measure_clock_offset`]).
    pub fn with_clock_offset(
        config: ClientConfig,
        clock: C,
        offset_millis: i64,
    ) -> Result<RestClient<OffsetClock<C>>, ClientError> {
        RestClient::<OffsetClock<C>>::with_clock(config, OffsetClock::new(clock, offset_millis))
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Full URL for `path`, with `params` form-encoded in insertion order.
    pub fn public_url(&self, path: &str, params: &RequestParams) -> Result<String, ClientError> {
        let query = params.to_query_string()?;
        if query.is_empty() {
            Ok(format!("{}{path}", self.config.base_url))
        } else {
            Ok(format!("{}{path}?{query}", self.config.base_url))
        }
    }

    /// Full URL for `path` carrying the exact string that was signed.
    ///
    /// `recvWindow` is added from config unless the caller already set one.
    pub fn signed_url(&self, path: &str, params: &RequestParams) -> Result<String, ClientError> {
        let signer = self
            .signer
            .as_ref()
            .ok_or(ClientError::MissingCredentials(crate::config::ENV_SECRET_KEY))?;

        let mut params = params.clone();
        if let Some(window) = self.config.recv_window_ms {
            if !params.contains_key(RECV_WINDOW_KEY) {
                params.insert(RECV_WINDOW_KEY, window);
            }
        }

        let signed = signer.sign(&params)?;
        Ok(format!("{}{path}?{}", self.config.base_url, signed.query_string()))
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        params: RequestParams,
        access: Access,
    ) -> Result<T, ClientError> {
        tracing::debug!(path, params = params.len(), ?access, "GET");

        let url = match access {
            Access::Signed => self.signed_url(path, &params)?,
            Access::Public | Access::ApiKey => self.public_url(path, &params)?,
        };

        let mut request = self.http.get(url);
        if access != Access::Public {
            request = request.header(API_KEY_HEADER, self.config.api_key()?);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            tracing::warn!(path, %status, "request failed");
            return Err(ClientError::from_status(status, &text));
        }

        Ok(serde_json::from_str(&text)?)
    }

    // ---------------------------------------------------------------------
    // Market data
    // ---------------------------------------------------------------------

    pub async fn server_time(&self) -> Result<ServerTime, ClientError> {
        self.get(PATH_TIME, RequestParams::new(), Access::Public).await
    }

    pub async fn average_price(&self, symbol: &str) -> Result<AveragePrice, ClientError> {
        let params = RequestParams::new().with("symbol", symbol);
        self.get(PATH_AVG_PRICE, params, Access::Public).await
    }

    pub async fn ticker_price(&self, symbol: &str) -> Result<TickerPrice, ClientError> {
        let params = RequestParams::new().with("symbol", symbol);
        self.get(PATH_TICKER_PRICE, params, Access::Public).await
    }

    pub async fn book_ticker(&self, symbol: &str) -> Result<BookTicker, ClientError> {
        let params = RequestParams::new().with("symbol", symbol);
        self.get(PATH_BOOK_TICKER, params, Access::Public).await
    }

    pub async fn depth(&self, symbol: &str, limit: Option<u32>) -> Result<OrderBookDepth, ClientError> {
        let mut params = RequestParams::new().with("symbol", symbol);
        if let Some(limit) = limit {
            params.insert("limit", limit);
        }
        self.get(PATH_DEPTH, params, Access::Public).await
    }

    pub async fn recent_trades(&self, symbol: &str, limit: u32) -> Result<Vec<PublicTrade>, ClientError> {
        let params = RequestParams::new().with("symbol", symbol).with("limit", limit);
        self.get(PATH_TRADES, params, Access::Public).await
    }

    pub async fn historical_trades(
        &self,
        symbol: &str,
        limit: u32,
        from_id: u64,
    ) -> Result<Vec<PublicTrade>, ClientError> {
        let params = RequestParams::new()
            .with("symbol", symbol)
            .with("limit", limit)
            .with("fromId", from_id);
        self.get(PATH_HISTORICAL_TRADES, params, Access::ApiKey).await
    }

    // ---------------------------------------------------------------------
    // Account
    // ---------------------------------------------------------------------

    pub async fn my_trades(&self, symbol: &str) -> Result<Vec<AccountTrade>, ClientError> {
        let params = RequestParams::new().with("symbol", symbol);
        self.get(PATH_MY_TRADES, params, Access::Signed).await
    }

    /// Exchange clock minus local clock, in millis.
    ///
    /// The local reading is the midpoint of the round trip.
    pub async fn measure_clock_offset(&self) -> Result<i64, ClientError> {
        let before = SystemClock.now_millis();
        let server = self.server_time().await?;
        let after = SystemClock.now_millis();
        let local = before + (after - before) / 2;
        let offset = server.server_time - local;
        tracing::debug!(offset_ms = offset, round_trip_ms = after - before, "clock offset");
        Ok(offset)
    }
}

#[async_trait]
impl<C: Clock + Send + Sync> TradeSource for RestClient<C> {
    async fn recent_trades(&self, symbol: &str, limit: u32) -> Result<Vec<PublicTrade>, ClientError> {
        RestClient::recent_trades(self, symbol, limit).await
    }

    async fn historical_trades(
        &self,
        symbol: &str,
        limit: u32,
        from_id: u64,
    ) -> Result<Vec<PublicTrade>, ClientError> {
        RestClient::historical_trades(self, symbol, limit, from_id).await
    }
}
