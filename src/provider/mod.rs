// =============================================================================
// Market Data Provider
// =============================================================================
//
// The input boundary of the pipeline: given a ticker and an inclusive date
// range, return its daily bars.  A ticker with no rows in the range is a
// `FetchError::NoData` (skip and log), never a panic.

pub mod yahoo;

use thiserror::Error;

use crate::market_data::{DateRange, PriceSeries};

pub use yahoo::YahooClient;

/// Failures surfaced by a [`MarketDataProvider`].
#[derive(Debug, Error)]
pub enum FetchError {
    /// The provider has no rows for the ticker in the requested range.
    #[error("no data for {ticker} in {range}")]
    NoData { ticker: String, range: DateRange },

    /// Transport-level failure (DNS, TLS, timeout, body read).
    #[error("request for {ticker} failed: {source}")]
    Request {
        ticker: String,
        #[source]
        source: reqwest::Error,
    },

    /// Non-success HTTP status without a structured provider error.
    #[error("provider returned HTTP {status} for {ticker}")]
    Status { ticker: String, status: u16 },

    /// Structured error reported by the provider.
    #[error("provider error for {ticker} [{code}]: {description}")]
    Api {
        ticker: String,
        code: String,
        description: String,
    },

    /// Response body could not be interpreted.
    #[error("malformed response for {ticker}: {reason}")]
    Malformed { ticker: String, reason: String },
}

impl FetchError {
    /// `true` for the "skip this ticker" case.
    pub fn is_no_data(&self) -> bool {
        matches!(self, FetchError::NoData { .. })
    }
}

/// Source of historical daily bars.
#[allow(async_fn_in_trait)]
pub trait MarketDataProvider {
    /// Fetch daily bars for `ticker` within `range` (both ends inclusive).
    async fn fetch_daily(&self, ticker: &str, range: &DateRange) -> Result<PriceSeries, FetchError>;
}
