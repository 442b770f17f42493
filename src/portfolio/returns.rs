// =============================================================================
// Log Returns
// =============================================================================
//
//   r_t = ln(P_t / P_{t-1})
//
// Log returns are additive across time, so exp(sum of r) recovers the gross
// growth P_t / P_0.  A return is undefined on the first date and wherever
// either of the two closes it depends on is missing from the panel.

use chrono::NaiveDate;

use crate::market_data::ClosePanel;

/// Per-ticker log-return columns aligned with the panel's dates.
#[derive(Debug, Clone)]
pub struct ReturnsMatrix {
    dates: Vec<NaiveDate>,
    tickers: Vec<String>,
    columns: Vec<Vec<Option<f64>>>,
}

impl ReturnsMatrix {
    /// Build directly from columns; every column must match `dates` in length.
    pub fn from_columns(dates: Vec<NaiveDate>, columns: Vec<(String, Vec<Option<f64>>)>) -> Self {
        debug_assert!(columns.iter().all(|(_, c)| c.len() == dates.len()));
        let (tickers, columns): (Vec<String>, Vec<Vec<Option<f64>>>) = columns.into_iter().unzip();
        Self {
            dates,
            tickers,
            columns,
        }
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn tickers(&self) -> &[String] {
        &self.tickers
    }

    #[cfg(test)]
    pub fn column(&self, ticker: &str) -> Option<&[Option<f64>]> {
        self.tickers
            .iter()
            .position(|t| t == ticker)
            .map(|i| self.columns[i].as_slice())
    }

    pub fn columns(&self) -> impl Iterator<Item = (&str, &[Option<f64>])> {
        self.tickers
            .iter()
            .map(String::as_str)
            .zip(self.columns.iter().map(Vec::as_slice))
    }
}

/// Log returns of a single aligned close column.
pub fn log_return_column(closes: &[Option<f64>]) -> Vec<Option<f64>> {
    let mut out = Vec::with_capacity(closes.len());
    if closes.is_empty() {
        return out;
    }

    out.push(None);
    for w in closes.windows(2) {
        let r = match (w[0], w[1]) {
            (Some(prev), Some(curr)) if prev > 0.0 && curr > 0.0 => Some((curr / prev).ln()),
            _ => None,
        };
        out.push(r);
    }
    out
}

/// Log returns for every ticker in the panel.
pub fn log_returns(panel: &ClosePanel) -> ReturnsMatrix {
    let columns = panel
        .columns()
        .map(|(ticker, closes)| (ticker.to_string(), log_return_column(closes)))
        .collect();
    ReturnsMatrix::from_columns(panel.dates().to_vec(), columns)
}

/// Gross growth `P_t / P_0` rebuilt from a return column.
///
/// Undefined returns contribute nothing to the running sum, so a column with
/// gaps yields the growth over the defined steps only.
pub fn cumulative_growth(returns: &[Option<f64>]) -> Vec<f64> {
    let mut running = 0.0_f64;
    returns
        .iter()
        .map(|r| {
            running += r.unwrap_or(0.0);
            running.exp()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market_data::{PriceBar, PriceSeries};

    #[test]
    fn first_return_is_undefined() {
        let r = log_return_column(&[Some(100.0), Some(110.0)]);
        assert_eq!(r.len(), 2);
        assert!(r[0].is_none());
        assert!((r[1].unwrap() - (1.1_f64).ln()).abs() < 1e-15);
    }

    #[test]
    fn gaps_make_returns_undefined() {
        let r = log_return_column(&[Some(100.0), None, Some(105.0), Some(106.0)]);
        assert_eq!(r[1], None);
        assert_eq!(r[2], None);
        assert!(r[3].is_some());
    }

    #[test]
    fn empty_column() {
        assert!(log_return_column(&[]).is_empty());
    }

    #[test]
    fn cumulative_round_trip() {
        let prices = [100.0, 103.5, 99.2, 101.7, 108.3, 107.9, 112.4];
        let closes: Vec<Option<f64>> = prices.iter().copied().map(Some).collect();
        let growth = cumulative_growth(&log_return_column(&closes));
        for (t, g) in growth.iter().enumerate() {
            assert!((g - prices[t] / prices[0]).abs() < 1e-12, "t={t}");
        }
    }

    #[test]
    fn matrix_from_panel() {
        let start = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let bars = (0..4)
            .map(|i| {
                let c = 10.0 * (i + 1) as f64;
                PriceBar::new(start + chrono::Duration::days(i), c, c, c, c, 0)
            })
            .collect();
        let panel = ClosePanel::align(&[PriceSeries::new("AAA", bars).unwrap()]);
        let returns = log_returns(&panel);

        assert_eq!(returns.dates().len(), 4);
        let col = returns.column("AAA").unwrap();
        assert!(col[0].is_none());
        assert!((col[1].unwrap() - 2.0_f64.ln()).abs() < 1e-15);
        assert!((col[3].unwrap() - (4.0_f64 / 3.0).ln()).abs() < 1e-15);
    }
}
