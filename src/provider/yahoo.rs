// =============================================================================
// Yahoo Finance Chart Client: daily OHLCV history over REST
// =============================================================================
//
// Endpoint: GET /v8/finance/chart/{ticker}?period1=..&period2=..&interval=1d
//
// `period1` / `period2` are UNIX seconds at midnight UTC; `period2` is
// exclusive, so the client asks for the day after the inclusive range end.
// Bar timestamps are shifted by the exchange `gmtoffset` before taking the
// calendar date so that a 09:30 New York open maps to the right trading day.
// =============================================================================

use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate};
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use super::{FetchError, MarketDataProvider};
use crate::market_data::{DateRange, PriceBar, PriceSeries};

const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";

/// Yahoo rejects requests without a browser-like user agent.
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko)";

// ---------------------------------------------------------------------------
// Wire format
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: ChartBody,
}

#[derive(Debug, Deserialize)]
struct ChartBody {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    meta: ChartMeta,
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: ChartIndicators,
}

#[derive(Debug, Default, Deserialize)]
struct ChartMeta {
    #[serde(default)]
    gmtoffset: i64,
}

#[derive(Debug, Deserialize)]
struct ChartIndicators {
    #[serde(default)]
    quote: Vec<QuoteColumns>,
}

#[derive(Debug, Default, Deserialize)]
struct QuoteColumns {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<u64>>,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Yahoo Finance chart API client.
#[derive(Clone)]
pub struct YahooClient {
    base_url: String,
    client: reqwest::Client,
}

impl YahooClient {
    /// Create a client whose requests time out after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self> {
        Self::with_base_url(DEFAULT_BASE_URL, timeout)
    }

    /// Create a client against a custom chart endpoint.
    pub fn with_base_url(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .context("failed to build HTTP client for Yahoo Finance")?;

        let base_url = base_url.into();
        debug!(base_url = %base_url, ?timeout, "YahooClient initialised");

        Ok(Self { base_url, client })
    }

    /// Full request URL for `ticker` over `range`.
    fn chart_url(&self, ticker: &str, range: &DateRange) -> String {
        format!(
            "{}/{}?period1={}&period2={}&interval=1d&events=history",
            self.base_url,
            ticker,
            midnight_utc(range.start),
            midnight_utc(range.end_exclusive()),
        )
    }
}

impl MarketDataProvider for YahooClient {
    #[instrument(skip(self), name = "yahoo::fetch_daily")]
    async fn fetch_daily(&self, ticker: &str, range: &DateRange) -> Result<PriceSeries, FetchError> {
        let url = self.chart_url(ticker, range);

        let request_error = |source| FetchError::Request {
            ticker: ticker.to_string(),
            source,
        };

        let resp = self.client.get(&url).send().await.map_err(request_error)?;
        let status = resp.status();
        let body = resp.text().await.map_err(request_error)?;

        match parse_chart(ticker, range, &body) {
            // Yahoo answers unknown symbols with 404 + a structured error,
            // which `parse_chart` already classifies.
            Ok(series) => {
                debug!(ticker, rows = series.len(), "daily bars fetched");
                Ok(series)
            }
            Err(FetchError::Malformed { .. }) if !status.is_success() => Err(FetchError::Status {
                ticker: ticker.to_string(),
                status: status.as_u16(),
            }),
            Err(e) => Err(e),
        }
    }
}

impl std::fmt::Debug for YahooClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YahooClient")
            .field("base_url", &self.base_url)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Parsing helpers
// ---------------------------------------------------------------------------

fn midnight_utc(date: NaiveDate) -> i64 {
    date.and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc().timestamp())
        .unwrap_or_default()
}

/// Parse a chart response body into a validated series.
///
/// Rows with any missing OHLCV field are dropped; rows outside `range` are
/// discarded; a repeated date keeps the later row.
fn parse_chart(ticker: &str, range: &DateRange, body: &str) -> Result<PriceSeries, FetchError> {
    let malformed = |reason: String| FetchError::Malformed {
        ticker: ticker.to_string(),
        reason,
    };
    let no_data = || FetchError::NoData {
        ticker: ticker.to_string(),
        range: *range,
    };

    let envelope: ChartEnvelope =
        serde_json::from_str(body).map_err(|e| malformed(format!("invalid JSON: {e}")))?;

    if let Some(err) = envelope.chart.error {
        if err.code.eq_ignore_ascii_case("Not Found") {
            return Err(no_data());
        }
        return Err(FetchError::Api {
            ticker: ticker.to_string(),
            code: err.code,
            description: err.description,
        });
    }

    let result = envelope
        .chart
        .result
        .and_then(|r| r.into_iter().next())
        .ok_or_else(no_data)?;

    let quote = result.indicators.quote.into_iter().next().unwrap_or_default();
    let offset = result.meta.gmtoffset;

    let mut bars: Vec<PriceBar> = Vec::with_capacity(result.timestamp.len());
    let mut dropped = 0usize;

    for (i, &ts) in result.timestamp.iter().enumerate() {
        let field = |col: &[Option<f64>]| col.get(i).copied().flatten();
        let row = (
            field(&quote.open),
            field(&quote.high),
            field(&quote.low),
            field(&quote.close),
            quote.volume.get(i).copied().flatten(),
        );

        let (Some(open), Some(high), Some(low), Some(close), Some(volume)) = row else {
            dropped += 1;
            continue;
        };

        let date = DateTime::from_timestamp(ts + offset, 0)
            .ok_or_else(|| malformed(format!("timestamp {ts} out of range")))?
            .date_naive();

        if !range.contains(date) {
            continue;
        }

        let bar = PriceBar::new(date, open, high, low, close, volume);
        match bars.last_mut() {
            Some(last) if last.date == date => *last = bar,
            _ => bars.push(bar),
        }
    }

    if dropped > 0 {
        warn!(ticker, dropped, "dropped incomplete rows from chart response");
    }

    if bars.is_empty() {
        return Err(no_data());
    }

    PriceSeries::new(ticker, bars).map_err(|e| malformed(format!("{e:#}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range() -> DateRange {
        DateRange::new(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
        )
        .unwrap()
    }

    // 2024-01-02, 01-03, 01-04 at 14:30 UTC, gmtoffset -18000 (New York).
    const VALID: &str = r#"{"chart":{"result":[{"meta":{"gmtoffset":-18000},"timestamp":[1704205800,1704292200,1704378600],"indicators":{"quote":[{"open":[185.0,186.0,187.0],"high":[186.0,187.0,188.0],"low":[184.0,185.0,186.0],"close":[185.5,186.5,187.5],"volume":[1000000,1100000,1200000]}]}}],"error":null}}"#;

    #[test]
    fn parse_valid_response() {
        let series = parse_chart("AAPL", &range(), VALID).unwrap();
        assert_eq!(series.len(), 3);
        assert_eq!(series.ticker(), "AAPL");
        assert_eq!(series.first_date(), NaiveDate::from_ymd_opt(2024, 1, 2));
        assert_eq!(series.closes(), vec![185.5, 186.5, 187.5]);
        assert_eq!(series.bars()[2].volume, 1_200_000);
    }

    #[test]
    fn parse_drops_null_rows() {
        let json = r#"{"chart":{"result":[{"timestamp":[1704205800,1704292200,1704378600],"indicators":{"quote":[{"open":[185.0,null,187.0],"high":[186.0,null,188.0],"low":[184.0,null,186.0],"close":[185.5,null,187.5],"volume":[1000000,null,1200000]}]}}],"error":null}}"#;
        let series = parse_chart("AAPL", &range(), json).unwrap();
        assert_eq!(series.len(), 2);
    }

    #[test]
    fn parse_not_found_is_no_data() {
        let json = r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found, symbol may be delisted"}}}"#;
        let err = parse_chart("ZZZZ", &range(), json).unwrap_err();
        assert!(err.is_no_data());
        assert!(err.to_string().contains("ZZZZ"));
    }

    #[test]
    fn parse_other_api_error() {
        let json = r#"{"chart":{"result":null,"error":{"code":"Bad Request","description":"Invalid interval"}}}"#;
        let err = parse_chart("AAPL", &range(), json).unwrap_err();
        assert!(matches!(err, FetchError::Api { ref code, .. } if code == "Bad Request"));
    }

    #[test]
    fn parse_empty_result_is_no_data() {
        let json = r#"{"chart":{"result":[],"error":null}}"#;
        assert!(parse_chart("AAPL", &range(), json).unwrap_err().is_no_data());

        let json = r#"{"chart":{"result":[{"timestamp":[],"indicators":{"quote":[{}]}}],"error":null}}"#;
        assert!(parse_chart("AAPL", &range(), json).unwrap_err().is_no_data());
    }

    #[test]
    fn parse_invalid_json_is_malformed() {
        let err = parse_chart("AAPL", &range(), "not json").unwrap_err();
        assert!(matches!(err, FetchError::Malformed { .. }));
    }

    #[test]
    fn parse_discards_rows_outside_range() {
        let narrow = DateRange::new(
            NaiveDate::from_ymd_opt(2024, 1, 3).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 3).unwrap(),
        )
        .unwrap();
        let series = parse_chart("AAPL", &narrow, VALID).unwrap();
        assert_eq!(series.closes(), vec![186.5]);
    }

    #[test]
    fn chart_url_uses_exclusive_end() {
        let client = YahooClient::new(Duration::from_secs(5)).unwrap();
        let url = client.chart_url("BRK-B", &range());
        assert!(url.contains("/BRK-B?"));
        // 2024-01-01T00:00:00Z and 2024-02-01T00:00:00Z
        assert!(url.contains("period1=1704067200"));
        assert!(url.contains("period2=1706745600"));
        assert!(url.contains("interval=1d"));
    }
}
