//! Historical candle access port trait.

use crate::domain::candle::Candle;
use crate::domain::error::CycletraderError;
use crate::domain::ledger::Trade;

/// Port for reading and writing cached candle series and exporting trades.
pub trait CandleStore {
    /// Loads the full cached series for `symbol` at `granularity` seconds,
    /// sorted by epoch ascending.
    fn load(&self, symbol: &str, granularity: i64) -> Result<Vec<Candle>, CycletraderError>;

    /// Writes a candle series to the store, replacing any existing cache
    /// for the same symbol and granularity.
    fn store(
        &self,
        symbol: &str,
        granularity: i64,
        candles: &[Candle],
    ) -> Result<(), CycletraderError>;

    /// Epoch range and row count of the cached series, `None` if empty.
    fn data_range(
        &self,
        symbol: &str,
        granularity: i64,
    ) -> Result<Option<(i64, i64, usize)>, CycletraderError>;

    /// Writes closed trades to `output_path`, one row per round trip.
    fn export_trades(&self, trades: &[Trade], output_path: &str)
        -> Result<(), CycletraderError>;
}
