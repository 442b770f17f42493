// =============================================================================
// Price Series: validated daily OHLCV history for a single ticker
// =============================================================================
//
// A `PriceSeries` is the immutable input to the indicator engine.  Bars are
// strictly ascending by trading date with no duplicates, and every close is a
// finite positive number (log returns depend on it).

use std::fmt;

use anyhow::{bail, Result};
use chrono::{Duration, NaiveDate};

// ---------------------------------------------------------------------------
// Data types
// ---------------------------------------------------------------------------

/// A single daily OHLCV bar.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

impl PriceBar {
    pub fn new(date: NaiveDate, open: f64, high: f64, low: f64, close: f64, volume: u64) -> Self {
        Self {
            date,
            open,
            high,
            low,
            close,
            volume,
        }
    }
}

/// Inclusive calendar date range `[start, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            bail!("date range start {start} is after end {end}");
        }
        Ok(Self { start, end })
    }

    /// First day *after* the range; providers with exclusive upper bounds
    /// query up to this date.
    pub fn end_exclusive(&self) -> NaiveDate {
        self.end + Duration::days(1)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..={}", self.start, self.end)
    }
}

// ---------------------------------------------------------------------------
// PriceSeries
// ---------------------------------------------------------------------------

/// Ordered, de-duplicated daily bars for one ticker.
#[derive(Debug, Clone)]
pub struct PriceSeries {
    ticker: String,
    bars: Vec<PriceBar>,
}

impl PriceSeries {
    /// Build a series, rejecting out-of-order or duplicate dates and
    /// non-finite / non-positive closes.
    pub fn new(ticker: impl Into<String>, bars: Vec<PriceBar>) -> Result<Self> {
        let ticker = ticker.into();

        for pair in bars.windows(2) {
            if pair[1].date <= pair[0].date {
                bail!(
                    "{ticker}: bars out of order or duplicated at {} -> {}",
                    pair[0].date,
                    pair[1].date
                );
            }
        }

        if let Some(bad) = bars.iter().find(|b| !b.close.is_finite() || b.close <= 0.0) {
            bail!("{ticker}: invalid close {} on {}", bad.close, bad.date);
        }

        Ok(Self { ticker, bars })
    }

    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Closing prices, oldest first.
    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.bars.iter().map(|b| b.date).collect()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.bars.first().map(|b| b.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.bars.last().map(|b| b.date)
    }

    /// Close of the most recent bar, if any.
    pub fn last_close(&self) -> Option<f64> {
        self.bars.last().map(|b| b.close)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn bar(d: u32, close: f64) -> PriceBar {
        PriceBar::new(day(d), close, close, close, close, 1_000)
    }

    #[test]
    fn series_accepts_ascending_bars() {
        let series = PriceSeries::new("AAPL", vec![bar(2, 10.0), bar(3, 11.0), bar(5, 12.0)]).unwrap();
        assert_eq!(series.len(), 3);
        assert_eq!(series.closes(), vec![10.0, 11.0, 12.0]);
        assert_eq!(series.first_date(), Some(day(2)));
        assert_eq!(series.last_close(), Some(12.0));
    }

    #[test]
    fn series_rejects_duplicate_dates() {
        assert!(PriceSeries::new("AAPL", vec![bar(2, 10.0), bar(2, 11.0)]).is_err());
    }

    #[test]
    fn series_rejects_descending_dates() {
        assert!(PriceSeries::new("AAPL", vec![bar(3, 10.0), bar(2, 11.0)]).is_err());
    }

    #[test]
    fn series_rejects_non_positive_close() {
        assert!(PriceSeries::new("AAPL", vec![bar(2, 0.0)]).is_err());
        assert!(PriceSeries::new("AAPL", vec![bar(2, f64::NAN)]).is_err());
    }

    #[test]
    fn empty_series_is_valid() {
        let series = PriceSeries::new("AAPL", Vec::new()).unwrap();
        assert!(series.is_empty());
        assert!(series.last_date().is_none());
    }

    #[test]
    fn date_range_is_inclusive() {
        let range = DateRange::new(day(2), day(5)).unwrap();
        assert!(range.contains(day(2)));
        assert!(range.contains(day(5)));
        assert!(!range.contains(day(6)));
        assert_eq!(range.end_exclusive(), day(6));
        assert!(DateRange::new(day(5), day(2)).is_err());
    }
}
