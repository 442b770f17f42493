// =============================================================================
// Moving Average Convergence Divergence (MACD)
// =============================================================================
//
//   MACD      = EMA(close, fast) - EMA(close, slow)
//   Signal    = EMA(MACD, signal)
//   Histogram = MACD - Signal
//
// All EMAs are the unadjusted recursive form seeded with the first value, so
// every position is defined from the first bar onwards.

use super::ema::calculate_ema_series;

/// MACD columns aligned with the input closes.
#[derive(Debug, Clone, PartialEq)]
pub struct MacdSeries {
    pub macd: Vec<f64>,
    pub signal: Vec<f64>,
    pub histogram: Vec<f64>,
}

/// Compute MACD, Signal and Histogram for `closes`.
///
/// Returns empty columns when `closes` is empty or any span is zero.
pub fn calculate_macd(closes: &[f64], fast: usize, slow: usize, signal: usize) -> MacdSeries {
    let fast_ema = calculate_ema_series(closes, fast);
    let slow_ema = calculate_ema_series(closes, slow);

    if fast_ema.is_empty() || slow_ema.is_empty() || signal == 0 {
        return MacdSeries {
            macd: Vec::new(),
            signal: Vec::new(),
            histogram: Vec::new(),
        };
    }

    let macd: Vec<f64> = fast_ema.iter().zip(&slow_ema).map(|(f, s)| f - s).collect();
    let signal_line = calculate_ema_series(&macd, signal);
    let histogram = macd.iter().zip(&signal_line).map(|(m, s)| m - s).collect();

    MacdSeries {
        macd,
        signal: signal_line,
        histogram,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wave(n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| 100.0 + (i as f64 * 0.3).sin() * 5.0 + i as f64 * 0.1)
            .collect()
    }

    #[test]
    fn macd_empty_input() {
        let m = calculate_macd(&[], 12, 26, 9);
        assert!(m.macd.is_empty() && m.signal.is_empty() && m.histogram.is_empty());
    }

    #[test]
    fn macd_zero_span() {
        assert!(calculate_macd(&[1.0, 2.0], 0, 26, 9).macd.is_empty());
        assert!(calculate_macd(&[1.0, 2.0], 12, 26, 0).macd.is_empty());
    }

    #[test]
    fn macd_first_value_is_zero() {
        // Both EMAs are seeded with the first close.
        let m = calculate_macd(&wave(40), 12, 26, 9);
        assert_eq!(m.macd.len(), 40);
        assert_eq!(m.macd[0], 0.0);
        assert_eq!(m.signal[0], 0.0);
    }

    #[test]
    fn macd_is_deterministic() {
        let closes = wave(250);
        let a = calculate_macd(&closes, 12, 26, 9);
        let b = calculate_macd(&closes, 12, 26, 9);
        assert_eq!(a, b);
        for (x, y) in a.macd.iter().zip(&b.macd) {
            assert_eq!(x.to_bits(), y.to_bits());
        }
    }

    #[test]
    fn macd_matches_manual_ema() {
        let closes = wave(60);
        let m = calculate_macd(&closes, 12, 26, 9);
        let fast = calculate_ema_series(&closes, 12);
        let slow = calculate_ema_series(&closes, 26);
        for i in 0..closes.len() {
            assert!((m.macd[i] - (fast[i] - slow[i])).abs() < 1e-12);
            assert!((m.histogram[i] - (m.macd[i] - m.signal[i])).abs() < 1e-12);
        }
    }

    #[test]
    fn macd_positive_in_uptrend() {
        let closes: Vec<f64> = (0..100).map(|i| 100.0 + i as f64).collect();
        let m = calculate_macd(&closes, 12, 26, 9);
        assert!(m.macd[1..].iter().all(|&v| v > 0.0));
    }
}
