// =============================================================================
// Technical Indicators Module
// =============================================================================
//
// Pure, side-effect-free implementations of the indicators drawn on the
// per-ticker charts.  Rolling indicators return columns aligned with their
// input, using `None` for positions without enough history.

pub mod bollinger;
pub mod ema;
pub mod frame;
pub mod macd;
pub mod rsi;

pub use frame::{IndicatorFrame, IndicatorParams, LatestReading};
