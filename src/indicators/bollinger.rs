// =============================================================================
// Bollinger Bands
// =============================================================================
//
// Bollinger Bands consist of a middle band (SMA), an upper band (SMA + k*σ),
// and a lower band (SMA - k*σ), where σ is the *sample* standard deviation
// of the trailing window.
//
// %B locates the latest close inside the envelope:
//   %B = (close - lower) / (upper - lower)

/// Rolling Bollinger columns aligned with the input closes.
///
/// The first `period - 1` entries of every column are `None`.
#[derive(Debug, Clone)]
pub struct BollingerSeries {
    pub middle: Vec<Option<f64>>,
    pub std_dev: Vec<Option<f64>>,
    pub upper: Vec<Option<f64>>,
    pub lower: Vec<Option<f64>>,
}

/// Calculate rolling Bollinger Bands for `closes`.
///
/// Each defined entry at index `t` uses only `closes[t + 1 - period..=t]`.
/// When `closes.len() < period`, or `period < 2` (sample σ is undefined for a
/// single observation), every entry is `None`.
pub fn calculate_bollinger_series(closes: &[f64], period: usize, num_std: f64) -> BollingerSeries {
    let n = closes.len();
    let mut series = BollingerSeries {
        middle: vec![None; n],
        std_dev: vec![None; n],
        upper: vec![None; n],
        lower: vec![None; n],
    };

    if period < 2 || n < period {
        return series;
    }

    let period_f = period as f64;
    for end in period..=n {
        let window = &closes[end - period..end];
        let (mean, std_dev) = if window.iter().all(|&x| x == window[0]) {
            // Identical closes: exact zero width, no rounding residue.
            (window[0], 0.0)
        } else {
            let mean = window.iter().sum::<f64>() / period_f;
            let variance =
                window.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (period_f - 1.0);
            (mean, variance.sqrt())
        };

        let t = end - 1;
        series.middle[t] = Some(mean);
        series.std_dev[t] = Some(std_dev);
        series.upper[t] = Some(mean + num_std * std_dev);
        series.lower[t] = Some(mean - num_std * std_dev);
    }

    series
}

/// %B of `close` inside the `[lower, upper]` envelope.
///
/// `None` when the band has zero width (flat window).
pub fn percent_b(close: f64, upper: f64, lower: f64) -> Option<f64> {
    let width = upper - lower;
    (width > 0.0).then(|| (close - lower) / width)
}
