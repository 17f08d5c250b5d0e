pub mod types;

pub use types::{align_pair, AlignedPair, PriceBar, PriceSeries};
