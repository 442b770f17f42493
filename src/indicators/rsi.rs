// =============================================================================
// Relative Strength Index (RSI): Simple Moving Average variant
// =============================================================================
//
// RSI measures the speed and magnitude of recent price changes to evaluate
// whether an asset is overbought or oversold.
//
// Step 1. Compute price changes (deltas) from consecutive closes.  The first
//          bar has no prior day and counts as no movement.
// Step 2. Split into gain = max(delta, 0) and loss = max(-delta, 0).
// Step 3. Average gain / average loss = trailing SMA over `period` bars.
// Step 4. RS  = avg_gain / avg_loss
//          RSI = 100 - 100 / (1 + RS)
//
// Zero-division policy:
//   avg_gain == 0 && avg_loss == 0  =>  RSI = 50 (flat window)
//   avg_loss == 0                   =>  avg_loss replaced by LOSS_EPSILON,
//                                       so RSI approaches (never reaches) 100
//
// Thresholds:  RSI >= 70 => OVERBOUGHT,  RSI <= 30 => OVERSOLD.
// =============================================================================

/// Denominator substituted when the average loss is exactly zero.
pub const LOSS_EPSILON: f64 = 1e-9;

/// Upper reference line drawn on the RSI panel.
pub const OVERBOUGHT: f64 = 70.0;

/// Lower reference line drawn on the RSI panel.
pub const OVERSOLD: f64 = 30.0;

/// Compute the RSI series for `closes`, aligned index-for-index.
///
/// The first `period - 1` entries are `None`; entry `t` uses the deltas of
/// bars `t + 1 - period ..= t`.
///
/// # Edge cases
/// - `period == 0` => all `None`
/// - `closes.len() < period` => all `None`
pub fn calculate_rsi_series(closes: &[f64], period: usize) -> Vec<Option<f64>> {
    let n = closes.len();
    let mut result = vec![None; n];
    if period == 0 || n < period {
        return result;
    }

    // --- Split deltas into gains and losses ----------------------------------
    let mut gains = Vec::with_capacity(n);
    let mut losses = Vec::with_capacity(n);
    gains.push(0.0);
    losses.push(0.0);
    for w in closes.windows(2) {
        let delta = w[1] - w[0];
        gains.push(delta.max(0.0));
        losses.push((-delta).max(0.0));
    }

    // --- Trailing simple averages --------------------------------------------
    let period_f = period as f64;
    for end in period..=n {
        let avg_gain = gains[end - period..end].iter().sum::<f64>() / period_f;
        let avg_loss = losses[end - period..end].iter().sum::<f64>() / period_f;
        result[end - 1] = Some(rsi_from_averages(avg_gain, avg_loss));
    }

    result
}

/// Human-readable zone for an RSI value.
pub fn rsi_zone(value: f64) -> &'static str {
    if value >= OVERBOUGHT {
        "OVERBOUGHT"
    } else if value <= OVERSOLD {
        "OVERSOLD"
    } else {
        "NEUTRAL"
    }
}

// =============================================================================
// Internal helpers
// =============================================================================

/// Convert average gain / average loss into an RSI value in [0, 100].
fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_gain == 0.0 && avg_loss == 0.0 {
        return 50.0;
    }

    let denominator = if avg_loss == 0.0 { LOSS_EPSILON } else { avg_loss };
    let rs = avg_gain / denominator;
    100.0 - 100.0 / (1.0 + rs)
}
