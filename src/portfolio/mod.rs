// =============================================================================
// Portfolio Statistics Module
// =============================================================================
//
// Cross-ticker analysis of aligned closing prices:
// - Log returns (additive daily returns)
// - Descriptive statistics and annualized volatility
// - Pairwise Pearson correlation

pub mod correlation;
pub mod returns;
pub mod stats;

pub use correlation::{correlation_matrix, CorrelationMatrix};
pub use returns::{cumulative_growth, log_returns, ReturnsMatrix};
pub use stats::{annualized_volatility, describe, sorted_ascending, StatsTable, VolatilityTable};
