// =============================================================================
// Analysis Configuration: recognized parameters with atomic save
// =============================================================================
//
// Every tunable of a run lives here and is passed explicitly into the
// pipeline; nothing is read from process-wide state after startup.
//
// All fields carry `#[serde(default)]` so that a partial JSON file only
// overrides what it names.  Persistence uses an atomic tmp + rename pattern.
//
// =============================================================================

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::indicators::IndicatorParams;
use crate::market_data::DateRange;

/// Env var naming the config file.
pub const CONFIG_PATH_ENV: &str = "MARKET_LENS_CONFIG";

/// Config file used when [`CONFIG_PATH_ENV`] is unset.
pub const DEFAULT_CONFIG_PATH: &str = "analysis_config.json";

// =============================================================================
// Default-value helpers (required by serde `default = "..."` attribute)
// =============================================================================

fn default_tickers() -> Vec<String> {
    ["AAPL", "MSFT", "GOOGL", "AMZN", "META", "NVDA", "TSLA"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_start_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2023, 1, 1).unwrap_or_default()
}

fn default_end_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 23).unwrap_or_default()
}

fn default_technical_charts_dir() -> PathBuf {
    PathBuf::from("technical_analysis_charts")
}

fn default_portfolio_charts_dir() -> PathBuf {
    PathBuf::from("general_portfolio_charts")
}

fn default_bollinger_window() -> usize {
    IndicatorParams::default().bollinger_window
}

fn default_bollinger_num_std() -> f64 {
    IndicatorParams::default().bollinger_num_std
}

fn default_rsi_window() -> usize {
    IndicatorParams::default().rsi_window
}

fn default_macd_fast() -> usize {
    IndicatorParams::default().macd_fast
}

fn default_macd_slow() -> usize {
    IndicatorParams::default().macd_slow
}

fn default_macd_signal() -> usize {
    IndicatorParams::default().macd_signal
}

fn default_fetch_timeout_secs() -> u64 {
    10
}

fn default_chart_font_paths() -> Vec<PathBuf> {
    [
        "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
        "/usr/share/fonts/TTF/DejaVuSans.ttf",
        "/usr/share/fonts/dejavu/DejaVuSans.ttf",
        "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
        "/System/Library/Fonts/Supplemental/Arial.ttf",
        "C:\\Windows\\Fonts\\arial.ttf",
    ]
    .into_iter()
    .map(PathBuf::from)
    .collect()
}

// =============================================================================
// AnalysisConfig
// =============================================================================

/// Top-level configuration for one analysis run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    // --- Universe & date range ---------------------------------------------

    /// Ticker symbols, processed in this order.
    #[serde(default = "default_tickers")]
    pub tickers: Vec<String>,

    /// First calendar date requested (inclusive).
    #[serde(default = "default_start_date")]
    pub start_date: NaiveDate,

    /// Last calendar date requested (inclusive).  The default 2025-06-23
    /// covers the same bars as an exclusive upper bound of 2025-06-24.
    #[serde(default = "default_end_date")]
    pub end_date: NaiveDate,

    // --- Output -------------------------------------------------------------

    /// Directory for per-ticker technical charts.
    #[serde(default = "default_technical_charts_dir")]
    pub technical_charts_dir: PathBuf,

    /// Directory for portfolio-level charts.
    #[serde(default = "default_portfolio_charts_dir")]
    pub portfolio_charts_dir: PathBuf,

    /// TrueType fonts tried in order for chart text.
    #[serde(default = "default_chart_font_paths")]
    pub chart_font_paths: Vec<PathBuf>,

    // --- Indicator parameters ----------------------------------------------

    #[serde(default = "default_bollinger_window")]
    pub bollinger_window: usize,

    /// Band half-width in standard deviations.
    #[serde(default = "default_bollinger_num_std")]
    pub bollinger_num_std: f64,

    #[serde(default = "default_rsi_window")]
    pub rsi_window: usize,

    #[serde(default = "default_macd_fast")]
    pub macd_fast: usize,

    #[serde(default = "default_macd_slow")]
    pub macd_slow: usize,

    #[serde(default = "default_macd_signal")]
    pub macd_signal: usize,

    // --- Network ------------------------------------------------------------

    /// Per-request timeout for the market-data provider.
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            tickers: default_tickers(),
            start_date: default_start_date(),
            end_date: default_end_date(),
            technical_charts_dir: default_technical_charts_dir(),
            portfolio_charts_dir: default_portfolio_charts_dir(),
            chart_font_paths: default_chart_font_paths(),
            bollinger_window: default_bollinger_window(),
            bollinger_num_std: default_bollinger_num_std(),
            rsi_window: default_rsi_window(),
            macd_fast: default_macd_fast(),
            macd_slow: default_macd_slow(),
            macd_signal: default_macd_signal(),
            fetch_timeout_secs: default_fetch_timeout_secs(),
        }
    }
}

impl AnalysisConfig {
    /// Load configuration from a JSON file at `path`.
    ///
    /// If the file does not exist, returns an error so the caller can fall
    /// back to defaults with a warning.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read analysis config from {}", path.display()))?;

        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse analysis config from {}", path.display()))?;

        info!(
            path = %path.display(),
            tickers = ?config.tickers,
            "analysis config loaded"
        );

        Ok(config)
    }

    /// Persist the configuration to `path` using an atomic write
    /// (write to `.tmp`, then rename).
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        let content = serde_json::to_string_pretty(self)
            .context("failed to serialise analysis config to JSON")?;

        let tmp_path = path.with_extension("json.tmp");

        std::fs::write(&tmp_path, &content)
            .with_context(|| format!("failed to write tmp config to {}", tmp_path.display()))?;

        std::fs::rename(&tmp_path, path)
            .with_context(|| format!("failed to rename tmp config to {}", path.display()))?;

        info!(path = %path.display(), "analysis config saved (atomic)");
        Ok(())
    }

    /// Apply `MARKET_LENS_TICKERS`, `MARKET_LENS_START` and `MARKET_LENS_END`.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(raw) = std::env::var("MARKET_LENS_TICKERS") {
            self.tickers = parse_ticker_list(&raw);
            info!(tickers = ?self.tickers, "tickers overridden from environment");
        }
        if let Ok(raw) = std::env::var("MARKET_LENS_START") {
            self.start_date = parse_date(&raw).context("MARKET_LENS_START")?;
        }
        if let Ok(raw) = std::env::var("MARKET_LENS_END") {
            self.end_date = parse_date(&raw).context("MARKET_LENS_END")?;
        }
        Ok(())
    }

    /// Reject parameter combinations the indicator engine cannot honour.
    pub fn validate(&self) -> Result<()> {
        if self.tickers.is_empty() {
            bail!("ticker list is empty");
        }
        if self.start_date > self.end_date {
            bail!(
                "start_date {} is after end_date {}",
                self.start_date,
                self.end_date
            );
        }
        if self.bollinger_window < 2 {
            bail!("bollinger_window must be at least 2 (got {})", self.bollinger_window);
        }
        if !(self.bollinger_num_std.is_finite() && self.bollinger_num_std > 0.0) {
            bail!("bollinger_num_std must be positive (got {})", self.bollinger_num_std);
        }
        if self.rsi_window == 0 {
            bail!("rsi_window must be at least 1");
        }
        if self.macd_fast == 0 || self.macd_slow == 0 || self.macd_signal == 0 {
            bail!("MACD spans must be at least 1");
        }
        if self.macd_fast >= self.macd_slow {
            bail!(
                "macd_fast ({}) must be shorter than macd_slow ({})",
                self.macd_fast,
                self.macd_slow
            );
        }
        if self.fetch_timeout_secs == 0 {
            warn!("fetch_timeout_secs is 0; requests will fail immediately");
        }
        Ok(())
    }

    pub fn date_range(&self) -> Result<DateRange> {
        DateRange::new(self.start_date, self.end_date)
    }

    pub fn indicator_params(&self) -> IndicatorParams {
        IndicatorParams {
            bollinger_window: self.bollinger_window,
            bollinger_num_std: self.bollinger_num_std,
            rsi_window: self.rsi_window,
            macd_fast: self.macd_fast,
            macd_slow: self.macd_slow,
            macd_signal: self.macd_signal,
        }
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

/// Split a comma-separated ticker list, trimming and upper-casing symbols.
pub fn parse_ticker_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty())
        .collect()
}

fn parse_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .with_context(|| format!("expected YYYY-MM-DD, got '{raw}'"))
}
