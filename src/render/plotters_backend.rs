// =============================================================================
// Plotters Renderer: PNG charts via the plotters bitmap backend
// =============================================================================
//
// Charts:
//   {TICKER}_technical_analysis.png      1400x1200, three stacked panels
//   annualized_volatility_bar_chart.png  1000x600 bar chart
//   correlation_matrix_heatmap.png       1000x800 annotated heatmap
//
// Text is rendered through ab_glyph with a TrueType font loaded from disk at
// startup and registered under the "sans-serif" family.
// =============================================================================

use std::fmt::Display;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use chrono::{Datelike, NaiveDate};
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use plotters::style::{register_font, FontStyle};
use tracing::{debug, info};

use super::palette::{coolwarm, needs_light_text};
use super::{write_atomically, ChartRenderer};
use crate::indicators::rsi::{OVERBOUGHT, OVERSOLD};
use crate::indicators::IndicatorFrame;
use crate::market_data::DateRange;
use crate::portfolio::{CorrelationMatrix, VolatilityTable};

const FONT: &str = "sans-serif";

const TECHNICAL_SIZE: (u32, u32) = (1400, 1200);
const VOLATILITY_SIZE: (u32, u32) = (1000, 600);
const HEATMAP_SIZE: (u32, u32) = (1000, 800);

const ORANGE: RGBColor = RGBColor(255, 140, 0);
const PURPLE: RGBColor = RGBColor(128, 0, 128);
const DARK_GREEN: RGBColor = RGBColor(0, 128, 0);

/// Chart renderer backed by plotters' `BitMapBackend`.
#[derive(Debug)]
pub struct PlottersRenderer {
    font_path: PathBuf,
}

impl PlottersRenderer {
    /// Register the first readable font among `candidates` and build the
    /// renderer.  Fails when none of them can be loaded.
    pub fn new(candidates: &[PathBuf]) -> Result<Self> {
        let font_path = candidates
            .iter()
            .find(|p| p.is_file())
            .cloned()
            .with_context(|| format!("no chart font found among {candidates:?}"))?;

        let bytes = std::fs::read(&font_path)
            .with_context(|| format!("failed to read font {}", font_path.display()))?;
        // plotters keeps registered fonts for the lifetime of the process.
        let bytes: &'static [u8] = Box::leak(bytes.into_boxed_slice());

        register_font(FONT, FontStyle::Normal, bytes)
            .map_err(|_| anyhow!("{} is not a usable TrueType font", font_path.display()))?;

        info!(font = %font_path.display(), "chart font registered");
        Ok(Self { font_path })
    }

    pub fn font_path(&self) -> &Path {
        &self.font_path
    }
}

impl ChartRenderer for PlottersRenderer {
    fn render_technical(&self, frame: &IndicatorFrame, range: &DateRange, path: &Path) -> Result<()> {
        if frame.is_empty() {
            bail!("{}: nothing to plot", frame.ticker());
        }
        write_atomically(path, |tmp| draw_technical(frame, range, tmp))
            .with_context(|| format!("failed to render technical chart for {}", frame.ticker()))
    }

    fn render_volatility(&self, volatility: &VolatilityTable, path: &Path) -> Result<()> {
        if volatility.is_empty() {
            bail!("no volatility values to plot");
        }
        write_atomically(path, |tmp| draw_volatility(volatility, tmp))
            .context("failed to render volatility chart")
    }

    fn render_correlation(&self, matrix: &CorrelationMatrix, path: &Path) -> Result<()> {
        if matrix.is_empty() {
            bail!("empty correlation matrix");
        }
        write_atomically(path, |tmp| draw_heatmap(matrix, tmp))
            .context("failed to render correlation heatmap")
    }
}

// =============================================================================
// Technical chart
// =============================================================================

fn draw_technical(frame: &IndicatorFrame, range: &DateRange, path: &Path) -> Result<()> {
    let dates = frame.series.dates();
    let closes: Vec<Option<f64>> = frame.closes().into_iter().map(Some).collect();
    let x_max = (frame.len().saturating_sub(1)).max(1) as f64;

    let root = BitMapBackend::new(path, TECHNICAL_SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(draw_err)?;

    let title = format!(
        "{} Technical Analysis ({}-{})",
        frame.ticker(),
        range.start.year(),
        range.end.year()
    );
    let body = root.titled(&title, (FONT, 32)).map_err(draw_err)?;
    let panels = body.split_evenly((3, 1));

    // --- Price and Bollinger Bands ---------------------------------------
    let ma_label = format!("{}-day MA", frame.params.bollinger_window);
    let (y_lo, y_hi) = value_range(
        [&closes, &frame.upper_bb, &frame.lower_bb]
            .into_iter()
            .flat_map(|col| col.iter().flatten().copied()),
    );
    draw_line_panel(
        &panels[0],
        "Price and Bollinger Bands",
        &dates,
        (x_max, y_lo, y_hi),
        &[
            ("Close Price", BLUE, &closes),
            (ma_label.as_str(), ORANGE, &frame.ma),
            ("Upper BB", RED, &frame.upper_bb),
            ("Lower BB", DARK_GREEN, &frame.lower_bb),
        ],
        &[],
    )?;

    // --- RSI -------------------------------------------------------------
    draw_line_panel(
        &panels[1],
        "Relative Strength Index (RSI)",
        &dates,
        (x_max, 0.0, 100.0),
        &[("RSI", PURPLE, &frame.rsi)],
        &[("Overbought (70)", RED, OVERBOUGHT), ("Oversold (30)", DARK_GREEN, OVERSOLD)],
    )?;

    // --- MACD ------------------------------------------------------------
    let macd: Vec<Option<f64>> = frame.macd.iter().copied().map(Some).collect();
    let signal: Vec<Option<f64>> = frame.signal.iter().copied().map(Some).collect();
    let (m_lo, m_hi) = value_range(frame.macd.iter().chain(&frame.signal).copied());
    draw_line_panel(
        &panels[2],
        "Moving Average Convergence Divergence (MACD)",
        &dates,
        (x_max, m_lo, m_hi),
        &[("MACD Line", BLUE, &macd), ("Signal Line", RED, &signal)],
        &[],
    )?;

    root.present().map_err(draw_err)?;
    debug!(ticker = frame.ticker(), "technical chart drawn");
    Ok(())
}

/// One captioned panel of line series plus optional horizontal reference lines.
fn draw_line_panel(
    area: &DrawingArea<BitMapBackend<'_>, Shift>,
    caption: &str,
    dates: &[NaiveDate],
    (x_max, y_lo, y_hi): (f64, f64, f64),
    lines: &[(&str, RGBColor, &Vec<Option<f64>>)],
    levels: &[(&str, RGBColor, f64)],
) -> Result<()> {
    let mut chart = ChartBuilder::on(area)
        .caption(caption, (FONT, 22))
        .margin(12)
        .x_label_area_size(30)
        .y_label_area_size(70)
        .build_cartesian_2d(0f64..x_max, y_lo..y_hi)
        .map_err(draw_err)?;

    let date_formatter = |x: &f64| date_label(dates, *x);
    chart
        .configure_mesh()
        .x_labels(10)
        .x_label_formatter(&date_formatter)
        .label_style((FONT, 14))
        .light_line_style(&RGBColor(235, 235, 235))
        .draw()
        .map_err(draw_err)?;

    for &(label, color, values) in lines {
        chart
            .draw_series(LineSeries::new(defined_points(values), color.stroke_width(2)))
            .map_err(draw_err)?
            .label(label)
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2)));
    }

    for &(label, color, level) in levels {
        chart
            .draw_series(LineSeries::new(vec![(0.0, level), (x_max, level)], color.stroke_width(1)))
            .map_err(draw_err)?
            .label(label)
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(1)));
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperLeft)
        .label_font((FONT, 14))
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()
        .map_err(draw_err)?;

    Ok(())
}

// =============================================================================
// Volatility bar chart
// =============================================================================

fn draw_volatility(volatility: &VolatilityTable, path: &Path) -> Result<()> {
    let n = volatility.len();
    let top = volatility.iter().map(|(_, v)| *v).fold(0.0_f64, f64::max);
    let y_hi = if top > 0.0 { top * 1.15 } else { 1.0 };

    let root = BitMapBackend::new(path, VOLATILITY_SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(draw_err)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Annualized Volatility", (FONT, 28))
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(70)
        .build_cartesian_2d((0..n).into_segmented(), 0f64..y_hi)
        .map_err(draw_err)?;

    let ticker_formatter = |v: &SegmentValue<usize>| match v {
        SegmentValue::CenterOf(i) => volatility.get(*i).map(|(t, _)| t.clone()).unwrap_or_default(),
        _ => String::new(),
    };
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(n)
        .x_label_formatter(&ticker_formatter)
        .y_desc("Volatility")
        .label_style((FONT, 15))
        .draw()
        .map_err(draw_err)?;

    chart
        .draw_series(
            Histogram::vertical(&chart)
                .style(BLUE.mix(0.75).filled())
                .margin(14)
                .data(volatility.iter().enumerate().map(|(i, (_, v))| (i, *v))),
        )
        .map_err(draw_err)?;

    root.present().map_err(draw_err)?;
    Ok(())
}

// =============================================================================
// Correlation heatmap
// =============================================================================

fn draw_heatmap(matrix: &CorrelationMatrix, path: &Path) -> Result<()> {
    let root = BitMapBackend::new(path, HEATMAP_SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(draw_err)?;

    let (width, height) = root.dim_in_pixel();
    let (left, top, right, bottom) = (110_i32, 80_i32, 140_i32, 90_i32);
    let k = matrix.len() as i32;
    let grid = (width as i32 - left - right).min(height as i32 - top - bottom);
    let cell = (grid / k).max(1);
    let side = cell * k;

    let title_style = TextStyle::from((FONT, 28).into_font()).pos(Pos::new(HPos::Center, VPos::Top));
    root.draw(&Text::new(
        "Correlation Matrix of Log Returns",
        (width as i32 / 2, 20),
        title_style,
    ))
    .map_err(draw_err)?;

    let centred = Pos::new(HPos::Center, VPos::Center);
    for i in 0..k {
        for j in 0..k {
            let x0 = left + j * cell;
            let y0 = top + i * cell;
            let value = matrix.get(i as usize, j as usize);

            let fill = match value {
                Some(v) => {
                    let (r, g, b) = coolwarm(v);
                    RGBColor(r, g, b).filled()
                }
                None => RGBColor(245, 245, 245).filled(),
            };
            root.draw(&Rectangle::new([(x0, y0), (x0 + cell, y0 + cell)], fill))
                .map_err(draw_err)?;
            root.draw(&Rectangle::new([(x0, y0), (x0 + cell, y0 + cell)], WHITE.stroke_width(2)))
                .map_err(draw_err)?;

            let (label, ink) = match value {
                Some(v) if needs_light_text(v) => (format!("{v:.2}"), WHITE),
                Some(v) => (format!("{v:.2}"), BLACK),
                None => ("n/a".to_string(), BLACK),
            };
            let style = (FONT, 18).into_font().color(&ink).pos(centred);
            root.draw(&Text::new(label, (x0 + cell / 2, y0 + cell / 2), style))
                .map_err(draw_err)?;
        }
    }

    // --- Axis labels -----------------------------------------------------
    let row_style = (FONT, 16).into_font().color(&BLACK).pos(Pos::new(HPos::Right, VPos::Center));
    let col_style = (FONT, 16).into_font().color(&BLACK).pos(Pos::new(HPos::Center, VPos::Top));
    for (idx, ticker) in matrix.tickers().iter().enumerate() {
        let offset = idx as i32 * cell + cell / 2;
        root.draw(&Text::new(ticker.as_str(), (left - 10, top + offset), row_style.clone()))
            .map_err(draw_err)?;
        root.draw(&Text::new(ticker.as_str(), (left + offset, top + side + 10), col_style.clone()))
            .map_err(draw_err)?;
    }

    // --- Colour bar ------------------------------------------------------
    let bar_x = left + side + 30;
    for row in 0..side {
        let value = 1.0 - 2.0 * f64::from(row) / f64::from(side.max(1));
        let (r, g, b) = coolwarm(value);
        root.draw(&Rectangle::new(
            [(bar_x, top + row), (bar_x + 24, top + row + 1)],
            RGBColor(r, g, b).filled(),
        ))
        .map_err(draw_err)?;
    }
    let tick_style = (FONT, 14).into_font().color(&BLACK).pos(Pos::new(HPos::Left, VPos::Center));
    for (label, frac) in [("1.0", 0.0), ("0.5", 0.25), ("0.0", 0.5), ("-0.5", 0.75), ("-1.0", 1.0)] {
        let y = top + (f64::from(side) * frac) as i32;
        root.draw(&Text::new(label, (bar_x + 32, y), tick_style.clone()))
            .map_err(draw_err)?;
    }

    root.present().map_err(draw_err)?;
    Ok(())
}

// =============================================================================
// Helpers
// =============================================================================

fn draw_err<E: Display>(e: E) -> anyhow::Error {
    anyhow!("chart drawing failed: {e}")
}

/// `(index, value)` points for the defined entries of a column.
fn defined_points(values: &[Option<f64>]) -> Vec<(f64, f64)> {
    values
        .iter()
        .enumerate()
        .filter_map(|(i, v)| v.map(|v| (i as f64, v)))
        .collect()
}

/// Padded `(min, max)` of finite values; a unit range when there are none.
fn value_range(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let (lo, hi) = values
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));

    if !lo.is_finite() || !hi.is_finite() {
        return (0.0, 1.0);
    }
    if hi - lo < f64::EPSILON {
        let pad = lo.abs().max(1.0) * 0.05;
        return (lo - pad, hi + pad);
    }
    let pad = (hi - lo) * 0.05;
    (lo - pad, hi + pad)
}

/// Axis label for a fractional bar index.
fn date_label(dates: &[NaiveDate], x: f64) -> String {
    let idx = x.round();
    if idx < 0.0 {
        return String::new();
    }
    dates
        .get(idx as usize)
        .map(|d| d.format("%Y-%m").to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defined_points_skip_warm_up() {
        let pts = defined_points(&[None, None, Some(3.0), Some(4.0)]);
        assert_eq!(pts, vec![(2.0, 3.0), (3.0, 4.0)]);
    }

    #[test]
    fn value_range_pads_extremes() {
        let (lo, hi) = value_range([10.0, 20.0, f64::NAN].into_iter());
        assert!((lo - 9.5).abs() < 1e-12);
        assert!((hi - 20.5).abs() < 1e-12);
    }

    #[test]
    fn value_range_handles_flat_and_empty() {
        let (lo, hi) = value_range([100.0, 100.0].into_iter());
        assert!(lo < 100.0 && hi > 100.0);
        assert_eq!(value_range(std::iter::empty()), (0.0, 1.0));
    }

    #[test]
    fn date_labels_follow_index() {
        let dates = vec![
            NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
            NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
        ];
        assert_eq!(date_label(&dates, 0.2), "2024-01");
        assert_eq!(date_label(&dates, 0.8), "2024-02");
        assert_eq!(date_label(&dates, 5.0), "");
        assert_eq!(date_label(&dates, -1.0), "");
    }

    #[test]
    fn renderer_requires_a_font() {
        let dir = tempfile::tempdir().unwrap();
        let err = PlottersRenderer::new(&[dir.path().join("missing.ttf")]).unwrap_err();
        assert!(err.to_string().contains("no chart font"));
    }
}
