// =============================================================================
// Exponential Moving Average (EMA)
// =============================================================================
//
// EMA gives more weight to recent prices, making it more responsive to new
// information than the Simple Moving Average (SMA).
//
// Formula (unadjusted, recursively defined):
//   alpha  = 2 / (span + 1)
//   EMA_0  = x_0
//   EMA_t  = alpha * x_t + (1 - alpha) * EMA_{t-1}
//
// The series is seeded with the first observation, so every output position
// is defined.  Early values carry warm-up bias.
// =============================================================================

/// Compute the unadjusted EMA of `values` with the given `span`.
///
/// The output is aligned index-for-index with the input.
///
/// # Edge cases
/// - `span == 0` => empty vec (no valid smoothing factor)
/// - empty input => empty vec
pub fn calculate_ema_series(values: &[f64], span: usize) -> Vec<f64> {
    if span == 0 || values.is_empty() {
        return Vec::new();
    }

    let alpha = 2.0 / (span as f64 + 1.0);

    let mut result = Vec::with_capacity(values.len());
    let mut prev = values[0];
    result.push(prev);

    for &x in &values[1..] {
        prev = alpha * x + (1.0 - alpha) * prev;
        result.push(prev);
    }

    result
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ema_empty_input() {
        assert!(calculate_ema_series(&[], 5).is_empty());
    }

    #[test]
    fn ema_span_zero() {
        assert!(calculate_ema_series(&[1.0, 2.0, 3.0], 0).is_empty());
    }

    #[test]
    fn ema_seeded_with_first_value() {
        let ema = calculate_ema_series(&[42.0, 10.0], 12);
        assert_eq!(ema.len(), 2);
        assert_eq!(ema[0], 42.0);
    }

    #[test]
    fn ema_known_values() {
        // span 5 => alpha = 1/3
        let values: Vec<f64> = (1..=10).map(|x| x as f64).collect();
        let ema = calculate_ema_series(&values, 5);
        assert_eq!(ema.len(), values.len());

        let alpha = 2.0 / 6.0;
        let mut expected = values[0];
        for (i, &x) in values.iter().enumerate().skip(1) {
            expected = alpha * x + (1.0 - alpha) * expected;
            assert!((ema[i] - expected).abs() < 1e-12, "got {}, expected {expected}", ema[i]);
        }
    }

    #[test]
    fn ema_span_one_tracks_input() {
        let values = vec![3.0, 7.0, 1.0];
        assert_eq!(calculate_ema_series(&values, 1), values);
    }

    #[test]
    fn ema_flat_series_stays_flat() {
        let ema = calculate_ema_series(&[100.0; 50], 26);
        for v in ema {
            assert!((v - 100.0).abs() < 1e-12);
        }
    }
}
