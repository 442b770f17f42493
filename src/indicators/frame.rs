// =============================================================================
// Indicator Frame: a price series augmented with every derived column
// =============================================================================
//
// Columns (all aligned index-for-index with the source bars):
//   MA20, STD20, UpperBB, LowerBB : Bollinger (rolling, warm-up = None)
//   RSI                           : SMA-based RSI (warm-up = None)
//   MACD, Signal                  : unadjusted EMAs (always defined)

use tracing::trace;

use super::bollinger::{calculate_bollinger_series, percent_b};
use super::macd::calculate_macd;
use super::rsi::{calculate_rsi_series, rsi_zone};
use crate::market_data::PriceSeries;

/// Window sizes and spans for the indicator engine.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorParams {
    pub bollinger_window: usize,
    pub bollinger_num_std: f64,
    pub rsi_window: usize,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
}

impl Default for IndicatorParams {
    fn default() -> Self {
        Self {
            bollinger_window: 20,
            bollinger_num_std: 2.0,
            rsi_window: 14,
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
        }
    }
}

/// A `PriceSeries` plus its derived indicator columns.
#[derive(Debug, Clone)]
pub struct IndicatorFrame {
    pub series: PriceSeries,
    pub params: IndicatorParams,
    pub ma: Vec<Option<f64>>,
    pub std_dev: Vec<Option<f64>>,
    pub upper_bb: Vec<Option<f64>>,
    pub lower_bb: Vec<Option<f64>>,
    pub rsi: Vec<Option<f64>>,
    pub macd: Vec<f64>,
    pub signal: Vec<f64>,
}

/// Last-bar values used for the per-ticker progress line.
#[derive(Debug, Clone)]
pub struct LatestReading {
    pub close: f64,
    pub ma: Option<f64>,
    pub std_dev: Option<f64>,
    pub percent_b: Option<f64>,
    pub rsi: Option<f64>,
    pub rsi_zone: Option<&'static str>,
    pub macd: f64,
    pub signal: f64,
}

impl IndicatorFrame {
    /// Compute every indicator column for `series`.
    pub fn compute(series: PriceSeries, params: &IndicatorParams) -> Self {
        let closes = series.closes();

        let bb = calculate_bollinger_series(&closes, params.bollinger_window, params.bollinger_num_std);
        let rsi = calculate_rsi_series(&closes, params.rsi_window);
        let macd = calculate_macd(&closes, params.macd_fast, params.macd_slow, params.macd_signal);

        trace!(
            ticker = series.ticker(),
            rows = closes.len(),
            "indicator frame computed"
        );

        Self {
            series,
            params: params.clone(),
            ma: bb.middle,
            std_dev: bb.std_dev,
            upper_bb: bb.upper,
            lower_bb: bb.lower,
            rsi,
            macd: macd.macd,
            signal: macd.signal,
        }
    }

    pub fn ticker(&self) -> &str {
        self.series.ticker()
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Closing prices, oldest first.
    pub fn closes(&self) -> Vec<f64> {
        self.series.closes()
    }

    /// Values on the most recent bar, or `None` for an empty frame.
    pub fn latest(&self) -> Option<LatestReading> {
        let last = self.len().checked_sub(1)?;
        let close = self.series.last_close()?;
        let percent_b = self.upper_bb[last]
            .zip(self.lower_bb[last])
            .and_then(|(upper, lower)| percent_b(close, upper, lower));
        let rsi = self.rsi[last];

        Some(LatestReading {
            close,
            ma: self.ma[last],
            std_dev: self.std_dev[last],
            percent_b,
            rsi,
            rsi_zone: rsi.map(rsi_zone),
            macd: *self.macd.get(last)?,
            signal: *self.signal.get(last)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market_data::PriceBar;
    use chrono::{Duration, NaiveDate};

    fn series(closes: &[f64]) -> PriceSeries {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let bars = closes
            .iter()
            .enumerate()
            .map(|(i, &c)| PriceBar::new(start + Duration::days(i as i64), c, c, c, c, 100))
            .collect();
        PriceSeries::new("TEST", bars).unwrap()
    }

    #[test]
    fn frame_columns_are_aligned() {
        let closes: Vec<f64> = (0..30).map(|i| 100.0 + i as f64).collect();
        let frame = IndicatorFrame::compute(series(&closes), &IndicatorParams::default());
        assert_eq!(frame.ma.len(), 30);
        assert_eq!(frame.std_dev.len(), 30);
        assert_eq!(frame.upper_bb.len(), 30);
        assert_eq!(frame.lower_bb.len(), 30);
        assert_eq!(frame.rsi.len(), 30);
        assert_eq!(frame.macd.len(), 30);
        assert_eq!(frame.signal.len(), 30);
    }

    #[test]
    fn rising_ramp_scenario() {
        // 100, 101, ..., 129
        let closes: Vec<f64> = (0..30).map(|i| 100.0 + i as f64).collect();
        let frame = IndicatorFrame::compute(series(&closes), &IndicatorParams::default());

        assert!(frame.ma[18].is_none());
        assert!((frame.ma[19].unwrap() - 109.5).abs() < 1e-12);

        let rsi = frame.rsi[29].unwrap();
        assert!(rsi.is_finite() && rsi > 99.9);

        let latest = frame.latest().unwrap();
        assert_eq!(latest.close, 129.0);
        assert_eq!(latest.rsi_zone, Some("OVERBOUGHT"));
        assert!(latest.macd > 0.0);
    }

    #[test]
    fn short_series_has_no_rolling_values() {
        let frame = IndicatorFrame::compute(series(&[10.0, 11.0, 12.0]), &IndicatorParams::default());
        assert!(frame.ma.iter().all(Option::is_none));
        assert!(frame.rsi.iter().all(Option::is_none));
        assert_eq!(frame.macd.len(), 3);

        let latest = frame.latest().unwrap();
        assert!(latest.ma.is_none());
        assert!(latest.rsi_zone.is_none());
    }

    #[test]
    fn empty_frame_has_no_latest() {
        let frame = IndicatorFrame::compute(series(&[]), &IndicatorParams::default());
        assert!(frame.is_empty());
        assert!(frame.latest().is_none());
    }

    #[test]
    fn flat_series_has_no_percent_b() {
        let frame = IndicatorFrame::compute(series(&[12.34; 25]), &IndicatorParams::default());
        let latest = frame.latest().unwrap();
        assert_eq!(latest.std_dev, Some(0.0));
        assert!(latest.percent_b.is_none());
        assert_eq!(latest.rsi, Some(50.0));
    }
}
