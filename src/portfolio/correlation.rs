// =============================================================================
// Pearson Correlation Matrix
// =============================================================================
//
// For each ticker pair, only rows where *both* returns are defined are used
// (pairwise-complete observations):
//
//   ρ = Σ(x - x̄)(y - ȳ) / sqrt(Σ(x - x̄)² · Σ(y - ȳ)²)
//
// The coefficient is undefined with fewer than two complete rows or when
// either side has zero variance over those rows.

use super::returns::ReturnsMatrix;

/// Symmetric ticker × ticker correlation table.
#[derive(Debug, Clone)]
pub struct CorrelationMatrix {
    tickers: Vec<String>,
    values: Vec<Vec<Option<f64>>>,
}

impl CorrelationMatrix {
    pub fn tickers(&self) -> &[String] {
        &self.tickers
    }

    /// Coefficient at row `i`, column `j`.
    pub fn get(&self, i: usize, j: usize) -> Option<f64> {
        self.values.get(i).and_then(|row| row.get(j)).copied().flatten()
    }

    /// Coefficient between two tickers by name.
    #[cfg(test)]
    pub fn between(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.tickers.iter().position(|t| t == a)?;
        let j = self.tickers.iter().position(|t| t == b)?;
        self.get(i, j)
    }

    pub fn len(&self) -> usize {
        self.tickers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tickers.is_empty()
    }
}

/// Pearson correlation over rows where both `a` and `b` are defined.
pub fn pearson_pairwise(a: &[Option<f64>], b: &[Option<f64>]) -> Option<f64> {
    let pairs: Vec<(f64, f64)> = a
        .iter()
        .zip(b)
        .filter_map(|(x, y)| Some(((*x)?, (*y)?)))
        .collect();

    if pairs.len() < 2 {
        return None;
    }
    if pairs.iter().all(|p| p.0 == pairs[0].0) || pairs.iter().all(|p| p.1 == pairs[0].1) {
        return None;
    }

    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|p| p.1).sum::<f64>() / n;

    let (mut sxy, mut sxx, mut syy) = (0.0_f64, 0.0_f64, 0.0_f64);
    for (x, y) in &pairs {
        let dx = x - mean_x;
        let dy = y - mean_y;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }

    if sxx == 0.0 || syy == 0.0 {
        return None;
    }

    let r = sxy / (sxx * syy).sqrt();
    Some(r.clamp(-1.0, 1.0))
}

/// Full pairwise correlation matrix of `returns`.
pub fn correlation_matrix(returns: &ReturnsMatrix) -> CorrelationMatrix {
    let columns: Vec<&[Option<f64>]> = returns.columns().map(|(_, c)| c).collect();
    let k = columns.len();
    let mut values = vec![vec![None; k]; k];

    for i in 0..k {
        // Diagonal: 1.0 whenever the column has variance.
        values[i][i] = pearson_pairwise(columns[i], columns[i]).map(|_| 1.0);
        for j in (i + 1)..k {
            let r = pearson_pairwise(columns[i], columns[j]);
            values[i][j] = r;
            values[j][i] = r;
        }
    }

    CorrelationMatrix {
        tickers: returns.tickers().to_vec(),
        values,
    }
}
