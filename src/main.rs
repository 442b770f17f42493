// =============================================================================
// Market Lens: Main Entry Point
// =============================================================================
//
// Two phases run back to back:
//   1. Technical batch: one three-panel chart per ticker.
//   2. Portfolio analysis: return statistics, volatility and correlation
//      over the combined close prices.
// =============================================================================

// ── Module declarations ──────────────────────────────────────────────────────
mod analysis_config;
mod indicators;
mod market_data;
mod pipeline;
mod portfolio;
mod provider;
mod render;
mod report;

use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use crate::analysis_config::{AnalysisConfig, CONFIG_PATH_ENV, DEFAULT_CONFIG_PATH};
use crate::provider::YahooClient;
use crate::render::PlottersRenderer;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Environment & config ──────────────────────────────────────────
    let _ = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("╔══════════════════════════════════════════════════════════╗");
    info!("║        Market Lens: Technical & Portfolio Analysis       ║");
    info!("╚══════════════════════════════════════════════════════════╝");

    let config_path =
        std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());

    let mut config = AnalysisConfig::load(&config_path).unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        let defaults = AnalysisConfig::default();
        if !std::path::Path::new(&config_path).exists() {
            if let Err(e) = defaults.save(&config_path) {
                warn!(error = %e, "Failed to write default config");
            }
        }
        defaults
    });
    config.apply_env_overrides()?;
    config.validate()?;

    let range = config.date_range()?;
    info!(tickers = ?config.tickers, range = %range, "Configured analysis");

    // ── 2. Build provider and renderer ───────────────────────────────────
    let provider = YahooClient::new(config.fetch_timeout())?;
    let renderer = PlottersRenderer::new(&config.chart_font_paths)?;
    debug!(font = %renderer.font_path().display(), "renderer ready");

    // ── 3. Technical batch ───────────────────────────────────────────────
    let batch = pipeline::run_technical_batch(&provider, &renderer, &config).await?;
    println!("{}", report::format_batch_summary(&batch));
    info!(
        dir = %config.technical_charts_dir.display(),
        "Technical analysis charts complete"
    );

    // ── 4. Portfolio analysis ────────────────────────────────────────────
    info!("--- Starting General Portfolio Analysis ---");
    let portfolio = pipeline::run_portfolio_analysis(&provider, &renderer, &config).await?;

    println!("Descriptive Statistics of Daily Log Returns:");
    println!("{}", report::format_stats_table(&portfolio.stats));
    println!("Annualized Volatility (ascending):");
    println!("{}", report::format_volatility(&portfolio.volatility));
    println!("Correlation Matrix of Daily Log Returns:");
    println!("{}", report::format_correlation_table(&portfolio.correlation));

    info!(
        dir = %config.portfolio_charts_dir.display(),
        dates = portfolio.panel.len(),
        observations = portfolio.returns.dates().len(),
        volatility_chart = %portfolio.volatility_chart.display(),
        correlation_chart = %portfolio.correlation_chart.display(),
        excluded = ?portfolio.excluded,
        "General portfolio analysis complete"
    );

    Ok(())
}
