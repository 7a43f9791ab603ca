use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A daily OHLCV bar for an instrument, as attached to market detail artifacts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    /// Trading day.
    pub date: NaiveDate,
    /// Opening price.
    pub open: f64,
    /// Highest price.
    pub high: f64,
    /// Lowest price.
    pub low: f64,
    /// Closing price.
    pub close: f64,
    /// Volume traded; zero when the source omits it.
    pub volume: u64,
}
