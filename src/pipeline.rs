// =============================================================================
// Analysis Pipeline: technical batch and portfolio phase
// =============================================================================
//
// Phase 1 (technical): for each ticker in order, fetch -> compute indicators
// -> render.  Every ticker ends in exactly one `TickerOutcome`; a failure for
// one ticker never stops the rest.
//
// Phase 2 (portfolio): fetch all closes, align on date, compute log returns,
// statistics, volatility and correlation, then render.  This phase runs on a
// single combined dataset and aborts on any hard failure.
// =============================================================================

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use tracing::{debug, error, info, warn};

use crate::analysis_config::AnalysisConfig;
use crate::indicators::{IndicatorFrame, LatestReading};
use crate::market_data::{ClosePanel, PriceSeries};
use crate::portfolio::{
    annualized_volatility, correlation_matrix, cumulative_growth, describe, log_returns,
    sorted_ascending, CorrelationMatrix, ReturnsMatrix, StatsTable, VolatilityTable,
};
use crate::provider::{FetchError, MarketDataProvider};
use crate::render::{
    ensure_output_dir, technical_chart_path, ChartRenderer, CORRELATION_CHART_FILE,
    VOLATILITY_CHART_FILE,
};

// =============================================================================
// Phase 1: technical batch
// =============================================================================

/// How one ticker's technical analysis ended.
#[derive(Debug)]
pub enum TickerOutcome {
    /// Chart written; `latest` holds the last-bar indicator values.
    Rendered {
        chart: PathBuf,
        rows: usize,
        latest: Option<LatestReading>,
    },
    /// Provider had no rows for the ticker in the range.
    Skipped { reason: String },
    /// Fetch or render failed.
    Failed { error: String },
}

/// Outcomes for every ticker, in processing order.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub entries: Vec<(String, TickerOutcome)>,
}

impl BatchReport {
    pub fn rendered(&self) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .filter(|(_, o)| matches!(o, TickerOutcome::Rendered { .. }))
            .map(|(t, _)| t.as_str())
    }

    pub fn rendered_count(&self) -> usize {
        self.rendered().count()
    }

    pub fn skipped_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|(_, o)| matches!(o, TickerOutcome::Skipped { .. }))
            .count()
    }

    pub fn failed_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|(_, o)| matches!(o, TickerOutcome::Failed { .. }))
            .count()
    }
}

/// Run the per-ticker technical analysis for every configured ticker.
///
/// Returns an error only when the output directory cannot be created; all
/// per-ticker failures are recorded in the report.
pub async fn run_technical_batch<P, R>(
    provider: &P,
    renderer: &R,
    config: &AnalysisConfig,
) -> Result<BatchReport>
where
    P: MarketDataProvider,
    R: ChartRenderer,
{
    let range = config.date_range()?;
    let params = config.indicator_params();
    ensure_output_dir(&config.technical_charts_dir)?;

    let mut report = BatchReport::default();

    for ticker in &config.tickers {
        info!(ticker = %ticker, "downloading data and performing analysis");

        let outcome = match provider.fetch_daily(ticker, &range).await {
            Ok(series) if series.is_empty() => {
                warn!(ticker = %ticker, "no data found or downloaded; skipping");
                TickerOutcome::Skipped {
                    reason: format!("no data for {ticker} in {range}"),
                }
            }
            Ok(series) => {
                let rows = series.len();
                debug!(
                    ticker = %ticker,
                    rows,
                    first = ?series.first_date(),
                    last = ?series.last_date(),
                    "price history received"
                );
                let frame = IndicatorFrame::compute(series, &params);
                let chart = technical_chart_path(&config.technical_charts_dir, ticker);

                match renderer.render_technical(&frame, &range, &chart) {
                    Ok(()) => {
                        let latest = frame.latest();
                        log_latest(ticker, latest.as_ref());
                        info!(ticker = %ticker, chart = %chart.display(), "technical analysis chart saved");
                        TickerOutcome::Rendered { chart, rows, latest }
                    }
                    Err(e) => {
                        let error = format!("{e:#}");
                        error!(ticker = %ticker, error = %error, "chart rendering failed");
                        TickerOutcome::Failed { error }
                    }
                }
            }
            Err(e) if e.is_no_data() => {
                warn!(ticker = %ticker, "no data found or downloaded; skipping");
                TickerOutcome::Skipped { reason: e.to_string() }
            }
            Err(e) => {
                error!(ticker = %ticker, error = %e, "an error occurred for ticker");
                TickerOutcome::Failed { error: e.to_string() }
            }
        };

        report.entries.push((ticker.clone(), outcome));
    }

    info!(
        rendered = report.rendered_count(),
        skipped = report.skipped_count(),
        failed = report.failed_count(),
        "technical batch complete"
    );

    Ok(report)
}

fn log_latest(ticker: &str, latest: Option<&LatestReading>) {
    let Some(r) = latest else { return };
    info!(
        ticker,
        close = r.close,
        ma = ?r.ma,
        std_dev = ?r.std_dev,
        percent_b = ?r.percent_b,
        rsi = ?r.rsi,
        zone = r.rsi_zone.unwrap_or("n/a"),
        macd = r.macd,
        signal = r.signal,
        "latest indicator values"
    );
}

// =============================================================================
// Phase 2: portfolio statistics
// =============================================================================

/// Everything computed and written by the portfolio phase.
#[derive(Debug)]
pub struct PortfolioReport {
    pub panel: ClosePanel,
    pub returns: ReturnsMatrix,
    pub stats: StatsTable,
    /// Ascending by volatility.
    pub volatility: VolatilityTable,
    pub correlation: CorrelationMatrix,
    /// Tickers left out because the provider had no data for them.
    pub excluded: Vec<String>,
    pub volatility_chart: PathBuf,
    pub correlation_chart: PathBuf,
}

/// Fetch every ticker's closes and align them on date.
///
/// Tickers without data are returned separately; any other fetch failure
/// aborts.
pub async fn fetch_close_panel<P: MarketDataProvider>(
    provider: &P,
    config: &AnalysisConfig,
) -> Result<(ClosePanel, Vec<String>)> {
    let range = config.date_range()?;
    let mut series: Vec<PriceSeries> = Vec::with_capacity(config.tickers.len());
    let mut excluded = Vec::new();

    for ticker in &config.tickers {
        match provider.fetch_daily(ticker, &range).await {
            Ok(s) if !s.is_empty() => series.push(s),
            Ok(_) => excluded.push(ticker.clone()),
            Err(FetchError::NoData { .. }) => excluded.push(ticker.clone()),
            Err(e) => {
                return Err(e).with_context(|| format!("combined price download failed at {ticker}"))
            }
        }
    }

    if !excluded.is_empty() {
        warn!(tickers = ?excluded, "excluded from portfolio analysis: no data");
    }
    if series.is_empty() {
        bail!("no ticker returned data for {range}; nothing to analyse");
    }

    Ok((ClosePanel::align(&series), excluded))
}

/// Run the portfolio phase end to end.
pub async fn run_portfolio_analysis<P, R>(
    provider: &P,
    renderer: &R,
    config: &AnalysisConfig,
) -> Result<PortfolioReport>
where
    P: MarketDataProvider,
    R: ChartRenderer,
{
    let (panel, excluded) = fetch_close_panel(provider, config).await?;
    info!(
        tickers = panel.tickers().len(),
        dates = panel.len(),
        "combined closes aligned"
    );

    let returns = log_returns(&panel);
    for (ticker, column) in returns.columns() {
        if let Some(growth) = cumulative_growth(column).last() {
            debug!(ticker, growth = *growth, "growth of one unit over the window");
        }
    }
    let stats = describe(&returns);
    let volatility = sorted_ascending(annualized_volatility(&stats));
    let correlation = correlation_matrix(&returns);

    ensure_output_dir(&config.portfolio_charts_dir)?;

    let volatility_chart = config.portfolio_charts_dir.join(VOLATILITY_CHART_FILE);
    renderer.render_volatility(&volatility, &volatility_chart)?;
    info!(chart = %volatility_chart.display(), "annualized volatility chart saved");

    let correlation_chart = config.portfolio_charts_dir.join(CORRELATION_CHART_FILE);
    renderer.render_correlation(&correlation, &correlation_chart)?;
    info!(chart = %correlation_chart.display(), "correlation matrix chart saved");

    Ok(PortfolioReport {
        panel,
        returns,
        stats,
        volatility,
        correlation,
        excluded,
        volatility_chart,
        correlation_chart,
    })
}
