// =============================================================================
// Chart Rendering Module
// =============================================================================
//
// The output boundary of the pipeline.  A `ChartRenderer` turns computed
// series into PNG files; the pipeline only decides *where* each chart goes.
//
// Every chart is drawn to a hidden temporary sibling and renamed into place
// once complete, so an interrupted run never leaves a truncated image under
// its final name.

pub mod palette;
pub mod plotters_backend;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::indicators::IndicatorFrame;
use crate::market_data::DateRange;
use crate::portfolio::{CorrelationMatrix, VolatilityTable};

pub use plotters_backend::PlottersRenderer;

/// File name of the annualized-volatility bar chart.
pub const VOLATILITY_CHART_FILE: &str = "annualized_volatility_bar_chart.png";

/// File name of the correlation heatmap.
pub const CORRELATION_CHART_FILE: &str = "correlation_matrix_heatmap.png";

/// Produces chart images at caller-chosen paths.
pub trait ChartRenderer {
    /// Three stacked panels: price + Bollinger, RSI, MACD.
    fn render_technical(&self, frame: &IndicatorFrame, range: &DateRange, path: &Path) -> Result<()>;

    /// Bar chart of annualized volatility, drawn in the given order.
    fn render_volatility(&self, volatility: &VolatilityTable, path: &Path) -> Result<()>;

    /// Annotated heatmap of the correlation matrix.
    fn render_correlation(&self, matrix: &CorrelationMatrix, path: &Path) -> Result<()>;
}

/// `{dir}/{TICKER}_technical_analysis.png`
pub fn technical_chart_path(dir: &Path, ticker: &str) -> PathBuf {
    dir.join(format!("{ticker}_technical_analysis.png"))
}

/// Create `dir` (and parents) if it does not exist yet.
pub fn ensure_output_dir(dir: &Path) -> Result<()> {
    if dir.is_dir() {
        return Ok(());
    }
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create output directory {}", dir.display()))?;
    info!(dir = %dir.display(), "output folder created");
    Ok(())
}

/// Hidden temporary sibling of `path`, keeping the extension so encoders
/// that infer the format from it still work.
pub fn temp_sibling(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match path.extension() {
        Some(ext) => format!(".{stem}.partial.{}", ext.to_string_lossy()),
        None => format!(".{stem}.partial"),
    };
    path.with_file_name(name)
}

/// Run `write` against a temporary path, then rename it onto `path`.
///
/// On failure the temporary file is removed and `path` is left untouched.
pub fn write_atomically<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(&Path) -> Result<()>,
{
    let tmp = temp_sibling(path);

    if let Err(e) = write(&tmp) {
        let _ = std::fs::remove_file(&tmp);
        return Err(e);
    }

    std::fs::rename(&tmp, path).with_context(|| {
        format!("failed to move {} into place at {}", tmp.display(), path.display())
    })?;

    debug!(path = %path.display(), "chart written (atomic)");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn technical_path_uses_ticker() {
        let p = technical_chart_path(Path::new("charts"), "NVDA");
        assert_eq!(p, PathBuf::from("charts").join("NVDA_technical_analysis.png"));
    }

    #[test]
    fn temp_sibling_keeps_extension() {
        let tmp = temp_sibling(Path::new("out/AAPL_technical_analysis.png"));
        assert_eq!(tmp, PathBuf::from("out/.AAPL_technical_analysis.partial.png"));
    }

    #[test]
    fn atomic_write_moves_file_into_place() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("chart.png");

        write_atomically(&target, |tmp| {
            std::fs::write(tmp, b"image").map_err(Into::into)
        })
        .unwrap();

        assert_eq!(std::fs::read(&target).unwrap(), b"image");
        assert!(!temp_sibling(&target).exists());
    }

    #[test]
    fn failed_write_leaves_nothing_behind() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("chart.png");

        let result = write_atomically(&target, |tmp| {
            std::fs::write(tmp, b"half")?;
            anyhow::bail!("renderer crashed")
        });

        assert!(result.is_err());
        assert!(!target.exists());
        assert!(!temp_sibling(&target).exists());
    }

    #[test]
    fn ensure_output_dir_creates_nested() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        ensure_output_dir(&nested).unwrap();
        assert!(nested.is_dir());
        // Idempotent.
        ensure_output_dir(&nested).unwrap();
    }
}
