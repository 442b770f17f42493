// =============================================================================
// Console Report: plain-text tables for stdout
// =============================================================================

use std::fmt::Write as _;

use crate::pipeline::{BatchReport, TickerOutcome};
use crate::portfolio::{CorrelationMatrix, StatsTable, VolatilityTable};

const TICKER_WIDTH: usize = 8;
const NUMBER_WIDTH: usize = 11;

fn cell(value: Option<f64>, decimals: usize) -> String {
    match value {
        Some(v) => format!("{v:>NUMBER_WIDTH$.decimals$}"),
        None => format!("{:>NUMBER_WIDTH$}", "NaN"),
    }
}

/// Per-ticker summary statistics of daily log returns.
pub fn format_stats_table(stats: &StatsTable) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<TICKER_WIDTH$}{:>NUMBER_WIDTH$}{:>NUMBER_WIDTH$}{:>NUMBER_WIDTH$}{:>NUMBER_WIDTH$}{:>NUMBER_WIDTH$}",
        "", "count", "mean", "std", "skew", "kurtosis"
    );
    for (ticker, s) in stats {
        let _ = writeln!(
            out,
            "{ticker:<TICKER_WIDTH$}{:>NUMBER_WIDTH$}{}{}{}{}",
            s.observations,
            cell(s.mean, 6),
            cell(s.std_dev, 6),
            cell(s.skewness, 4),
            cell(s.kurtosis, 4),
        );
    }
    out
}

/// Annualized volatility, one ticker per line, in table order.
pub fn format_volatility(volatility: &VolatilityTable) -> String {
    let mut out = String::new();
    for (ticker, vol) in volatility {
        let _ = writeln!(out, "{ticker:<TICKER_WIDTH$}{:>9.2}%", vol * 100.0);
    }
    out
}

/// Square correlation grid with two decimals.
pub fn format_correlation_table(matrix: &CorrelationMatrix) -> String {
    let mut out = String::new();
    let _ = write!(out, "{:<TICKER_WIDTH$}", "");
    for ticker in matrix.tickers() {
        let _ = write!(out, "{ticker:>TICKER_WIDTH$}");
    }
    out.push('\n');

    for (i, row) in matrix.tickers().iter().enumerate() {
        let _ = write!(out, "{row:<TICKER_WIDTH$}");
        for j in 0..matrix.len() {
            match matrix.get(i, j) {
                Some(v) => {
                    let _ = write!(out, "{v:>TICKER_WIDTH$.2}");
                }
                None => {
                    let _ = write!(out, "{:>TICKER_WIDTH$}", "NaN");
                }
            }
        }
        out.push('\n');
    }
    out
}

/// One line per ticker plus a totals line.
pub fn format_batch_summary(report: &BatchReport) -> String {
    let mut out = String::new();
    for (ticker, outcome) in &report.entries {
        let line = match outcome {
            TickerOutcome::Rendered { chart, rows, latest } => {
                let rsi = latest
                    .as_ref()
                    .and_then(|r| r.rsi.zip(r.rsi_zone))
                    .map(|(v, zone)| format!(" (RSI {v:.1} {zone})"))
                    .unwrap_or_default();
                format!(
                    "OK      {ticker:<TICKER_WIDTH$} {rows} rows -> {}{rsi}",
                    chart.display()
                )
            }
            TickerOutcome::Skipped { reason } => format!("SKIPPED {ticker:<TICKER_WIDTH$} {reason}"),
            TickerOutcome::Failed { error } => format!("FAILED  {ticker:<TICKER_WIDTH$} {error}"),
        };
        out.push_str(&line);
        out.push('\n');
    }
    let _ = writeln!(
        out,
        "{} rendered, {} skipped, {} failed",
        report.rendered_count(),
        report.skipped_count(),
        report.failed_count()
    );
    out
}
