// =============================================================================
// Close Panel: date-aligned closing prices across tickers
// =============================================================================
//
// The portfolio phase needs every ticker's closes on a shared date index.
// Series are outer-joined on trading date: a ticker with no bar on a date
// (not yet listed, suspended) carries `None` there instead of a value.

use std::collections::BTreeSet;

use chrono::NaiveDate;

use super::series::PriceSeries;

/// Column-oriented table of closes: one column per ticker, one row per date.
#[derive(Debug, Clone)]
pub struct ClosePanel {
    dates: Vec<NaiveDate>,
    tickers: Vec<String>,
    columns: Vec<Vec<Option<f64>>>,
}

impl ClosePanel {
    /// Outer-join the given series on date.  Ticker order is preserved.
    pub fn align(series: &[PriceSeries]) -> Self {
        let dates: Vec<NaiveDate> = series
            .iter()
            .flat_map(|s| s.bars().iter().map(|b| b.date))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let mut columns = Vec::with_capacity(series.len());
        for s in series {
            let mut column = Vec::with_capacity(dates.len());
            let mut bars = s.bars().iter().peekable();
            for date in &dates {
                match bars.peek() {
                    Some(bar) if bar.date == *date => {
                        column.push(Some(bar.close));
                        bars.next();
                    }
                    _ => column.push(None),
                }
            }
            columns.push(column);
        }

        Self {
            dates,
            tickers: series.iter().map(|s| s.ticker().to_string()).collect(),
            columns,
        }
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn tickers(&self) -> &[String] {
        &self.tickers
    }

    /// Aligned closes for `ticker`, if it is part of the panel.
    #[cfg(test)]
    pub fn column(&self, ticker: &str) -> Option<&[Option<f64>]> {
        self.tickers
            .iter()
            .position(|t| t == ticker)
            .map(|i| self.columns[i].as_slice())
    }

    /// Iterate `(ticker, column)` pairs in ticker order.
    pub fn columns(&self) -> impl Iterator<Item = (&str, &[Option<f64>])> {
        self.tickers
            .iter()
            .map(String::as_str)
            .zip(self.columns.iter().map(Vec::as_slice))
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }
}
