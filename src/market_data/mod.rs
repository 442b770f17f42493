pub mod panel;
pub mod series;

// Re-export the core types for convenient access (e.g. `use crate::market_data::PriceSeries`).
pub use panel::ClosePanel;
pub use series::{DateRange, PriceBar, PriceSeries};
