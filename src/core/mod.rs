//! Core domain types and the data pipeline

pub mod cache;
pub mod calendar;
pub mod config;
pub mod convert;
pub mod frame;
pub mod horizon;
pub mod log;
pub mod market_data;
pub mod price;
pub mod rebase;
pub mod returns;
pub mod series;
pub mod table;
pub mod universe;

// Re-export main types for cleaner imports
pub use cache::{Clock, ManualClock, SystemClock};
pub use convert::{FxMap, convert_series};
pub use horizon::Horizon;
pub use market_data::MarketData;
pub use price::PriceProvider;
pub use rebase::{RebasedTable, build_rebased_table};
pub use returns::{custom_return, horizon_return};
pub use series::PriceSeries;
pub use table::{ConvertedSeries, PerformanceTable, ReturnColumn, build_performance_table};
pub use universe::{Region, TargetCurrency};
