mod decoration;
mod event_count;

pub use decoration::TickerDecorationCheck;
pub use event_count::{EventCountCheck, ExpectedCount};

/// Ticker count assumed when a command runs without setup context.
pub const DEFAULT_EXPECTED_TICKERS: usize = 10;
