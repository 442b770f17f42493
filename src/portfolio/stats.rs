// =============================================================================
// Descriptive Statistics of Log Returns
// =============================================================================
//
// For each ticker, over the defined returns only (n observations):
//
//   mean      = Σx / n
//   std_dev   = sqrt(Σd² / (n - 1))                          (sample, ddof = 1)
//   skewness  = sqrt(n(n-1)) / (n-2) * m3 / m2^1.5           (adjusted G1, n >= 3)
//   kurtosis  = n(n+1)(n-1) Σd⁴ / ((n-2)(n-3) (Σd²)²)
//               - 3(n-1)² / ((n-2)(n-3))                     (excess G2, n >= 4)
//
// where d = x - mean and m_k = Σd^k / n.  A zero-variance column reports
// skewness = kurtosis = 0.
//
// Annualized volatility = std_dev * sqrt(252).

use super::returns::ReturnsMatrix;

/// Trading days per year used to annualize daily volatility.
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Summary statistics of one ticker's log returns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReturnStats {
    pub observations: usize,
    pub mean: Option<f64>,
    pub std_dev: Option<f64>,
    pub skewness: Option<f64>,
    pub kurtosis: Option<f64>,
}

/// `(ticker, stats)` rows in ticker order.
pub type StatsTable = Vec<(String, ReturnStats)>;

/// `(ticker, annualized volatility)` rows.
pub type VolatilityTable = Vec<(String, f64)>;

/// Compute [`ReturnStats`] over the defined values of `column`.
pub fn describe_column(column: &[Option<f64>]) -> ReturnStats {
    let values: Vec<f64> = column.iter().flatten().copied().collect();
    let n = values.len();
    if n == 0 {
        return ReturnStats::default();
    }

    let n_f = n as f64;
    let flat = values.iter().all(|&x| x == values[0]);

    // Identical values are zero-variance exactly, whatever their binary form.
    let mean = if flat { values[0] } else { values.iter().sum::<f64>() / n_f };

    let (mut s2, mut s3, mut s4) = (0.0_f64, 0.0_f64, 0.0_f64);
    if !flat {
        for x in &values {
            let d = x - mean;
            let d2 = d * d;
            s2 += d2;
            s3 += d2 * d;
            s4 += d2 * d2;
        }
    }

    let std_dev = (n >= 2).then(|| (s2 / (n_f - 1.0)).sqrt());

    let skewness = (n >= 3).then(|| {
        if s2 == 0.0 {
            return 0.0;
        }
        let m2 = s2 / n_f;
        let m3 = s3 / n_f;
        (n_f * (n_f - 1.0)).sqrt() / (n_f - 2.0) * m3 / m2.powf(1.5)
    });

    let kurtosis = (n >= 4).then(|| {
        if s2 == 0.0 {
            return 0.0;
        }
        let adj = 3.0 * (n_f - 1.0).powi(2) / ((n_f - 2.0) * (n_f - 3.0));
        let numer = n_f * (n_f + 1.0) * (n_f - 1.0) * s4;
        let denom = (n_f - 2.0) * (n_f - 3.0) * s2 * s2;
        numer / denom - adj
    });

    ReturnStats {
        observations: n,
        mean: Some(mean),
        std_dev,
        skewness,
        kurtosis,
    }
}

/// Statistics for every ticker in `returns`.
pub fn describe(returns: &ReturnsMatrix) -> StatsTable {
    returns
        .columns()
        .map(|(ticker, column)| (ticker.to_string(), describe_column(column)))
        .collect()
}

/// Annualized volatility for every ticker whose std-dev is defined.
pub fn annualized_volatility(stats: &StatsTable) -> VolatilityTable {
    stats
        .iter()
        .filter_map(|(ticker, s)| {
            s.std_dev
                .map(|sd| (ticker.clone(), sd * TRADING_DAYS_PER_YEAR.sqrt()))
        })
        .collect()
}

/// Sort a volatility table ascending (bar chart order).
pub fn sorted_ascending(mut table: VolatilityTable) -> VolatilityTable {
    table.sort_by(|a, b| a.1.total_cmp(&b.1));
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    fn col(values: &[f64]) -> Vec<Option<f64>> {
        values.iter().copied().map(Some).collect()
    }

    #[test]
    fn empty_column_has_no_stats() {
        let s = describe_column(&[None, None]);
        assert_eq!(s.observations, 0);
        assert!(s.mean.is_none() && s.std_dev.is_none());
    }

    #[test]
    fn undefined_values_are_skipped() {
        let s = describe_column(&[None, Some(1.0), None, Some(3.0)]);
        assert_eq!(s.observations, 2);
        assert_eq!(s.mean, Some(2.0));
        assert!((s.std_dev.unwrap() - 2.0_f64.sqrt()).abs() < 1e-12);
        assert!(s.skewness.is_none());
        assert!(s.kurtosis.is_none());
    }

    #[test]
    fn sample_std_dev() {
        // 2, 4, 4, 4, 5, 5, 7, 9: Σd² = 32 => sample var = 32/7.
        let s = describe_column(&col(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]));
        assert_eq!(s.mean, Some(5.0));
        assert!((s.std_dev.unwrap() - (32.0_f64 / 7.0).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn symmetric_data_has_zero_skew() {
        let s = describe_column(&col(&[-2.0, -1.0, 0.0, 1.0, 2.0]));
        assert!(s.skewness.unwrap().abs() < 1e-12);
    }

    #[test]
    fn known_skew_and_kurtosis() {
        // x = 1, 2, 3, 10: mean 4, d = -3 -2 -1 6,
        // Σd² = 50, Σd³ = 180, Σd⁴ = 1394.
        let s = describe_column(&col(&[1.0, 2.0, 3.0, 10.0]));
        let n: f64 = 4.0;
        let m2 = 50.0 / n;
        let m3 = 180.0 / n;
        let g1 = (n * (n - 1.0)).sqrt() / (n - 2.0) * m3 / m2.powf(1.5);
        let g2 = n * (n + 1.0) * (n - 1.0) * 1394.0 / ((n - 2.0) * (n - 3.0) * 2500.0)
            - 3.0 * (n - 1.0).powi(2) / ((n - 2.0) * (n - 3.0));
        assert!((s.skewness.unwrap() - g1).abs() < 1e-12);
        assert!((s.kurtosis.unwrap() - g2).abs() < 1e-12);
        assert!(s.skewness.unwrap() > 0.0);
    }

    #[test]
    fn constant_returns_have_zero_moments() {
        let s = describe_column(&col(&[0.25; 10]));
        assert_eq!(s.std_dev, Some(0.0));
        assert_eq!(s.skewness, Some(0.0));
        assert_eq!(s.kurtosis, Some(0.0));
    }

    #[test]
    fn constant_inexact_returns_have_zero_moments() {
        // 0.1 has no exact binary form; the mean must not drift off it.
        let s = describe_column(&[Some(0.1); 10]);
        assert_eq!(s.mean, Some(0.1));
        assert_eq!(s.std_dev, Some(0.0));
        assert_eq!(s.skewness, Some(0.0));
        assert_eq!(s.kurtosis, Some(0.0));
    }

    #[test]
    fn volatility_is_annualized_and_sorted() {
        let stats: StatsTable = vec![
            (
                "HIGH".to_string(),
                ReturnStats {
                    std_dev: Some(0.02),
                    ..Default::default()
                },
            ),
            (
                "LOW".to_string(),
                ReturnStats {
                    std_dev: Some(0.01),
                    ..Default::default()
                },
            ),
            ("NONE".to_string(), ReturnStats::default()),
        ];
        let vol = sorted_ascending(annualized_volatility(&stats));
        assert_eq!(vol.len(), 2);
        assert_eq!(vol[0].0, "LOW");
        assert!((vol[0].1 - 0.01 * 252.0_f64.sqrt()).abs() < 1e-12);
        assert_eq!(vol[1].0, "HIGH");
    }
}
