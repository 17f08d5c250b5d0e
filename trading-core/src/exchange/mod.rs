// exchange/mod.rs
pub mod file_source;
pub mod market_hours;
pub mod paper;
pub mod traits;
pub mod types;

// Re-export main interfaces for easy access
pub use file_source::JsonFileSource;
pub use market_hours::is_market_open;
pub use paper::PaperExecutor;
pub use traits::{MarketDataSource, OrderExecutor};
pub use types::*;
