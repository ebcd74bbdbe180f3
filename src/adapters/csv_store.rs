//! CSV candle cache adapter and trade export.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use log::warn;

use crate::domain::candle::Candle;
use crate::domain::error::CycletraderError;
use crate::domain::ledger::Trade;
use crate::ports::candle_store::CandleStore;

/// Candle cache backed by `{symbol}_{granularity}.csv` files under a base
/// directory. Column order is header-driven; the time column may hold Unix
/// seconds or ISO-8601 datetimes.
pub struct CsvCandleStore {
    base_path: PathBuf,
}

impl CsvCandleStore {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, symbol: &str, granularity: i64) -> PathBuf {
        self.base_path
            .join(format!("{}_{}.csv", symbol, granularity))
    }
}

struct Columns {
    time: usize,
    open: usize,
    high: usize,
    low: usize,
    close: usize,
}

fn resolve_columns(headers: &csv::StringRecord) -> Result<Columns, CycletraderError> {
    let find = |name: &str| {
        headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(name))
    };
    let missing = |name: &str| CycletraderError::Data {
        reason: format!("missing {} column in CSV header", name),
    };

    let time = find("epoch")
        .or_else(|| find("time"))
        .or_else(|| find("datetime"))
        .ok_or_else(|| missing("epoch/time/datetime"))?;
    Ok(Columns {
        time,
        open: find("open").ok_or_else(|| missing("open"))?,
        high: find("high").ok_or_else(|| missing("high"))?,
        low: find("low").ok_or_else(|| missing("low"))?,
        close: find("close").ok_or_else(|| missing("close"))?,
    })
}

/// Accepts Unix seconds (integer or float) or an ISO-8601 datetime/date.
fn parse_epoch(value: &str) -> Option<i64> {
    let value = value.trim();
    if let Ok(seconds) = value.parse::<f64>() {
        return seconds.is_finite().then_some(seconds as i64);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.timestamp());
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, fmt) {
            return Some(dt.and_utc().timestamp());
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc().timestamp())
}

fn parse_price(value: &str) -> Option<f64> {
    value.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

fn parse_candle(record: &csv::StringRecord, columns: &Columns) -> Option<Candle> {
    let candle = Candle {
        epoch: parse_epoch(record.get(columns.time)?)?,
        open: parse_price(record.get(columns.open)?)?,
        high: parse_price(record.get(columns.high)?)?,
        low: parse_price(record.get(columns.low)?)?,
        close: parse_price(record.get(columns.close)?)?,
    };
    candle.is_valid().then_some(candle)
}

fn csv_io(err: csv::Error) -> CycletraderError {
    CycletraderError::Io(std::io::Error::other(err))
}

impl CandleStore for CsvCandleStore {
    fn load(&self, symbol: &str, granularity: i64) -> Result<Vec<Candle>, CycletraderError> {
        let path = self.csv_path(symbol, granularity);
        load_candles(&path)
    }

    fn store(
        &self,
        symbol: &str,
        granularity: i64,
        candles: &[Candle],
    ) -> Result<(), CycletraderError> {
        fs::create_dir_all(&self.base_path)?;
        let path = self.csv_path(symbol, granularity);
        let file = fs::File::create(&path)?;
        let mut wtr = csv::Writer::from_writer(file);

        wtr.write_record(["epoch", "open", "high", "low", "close"])
            .map_err(csv_io)?;
        for candle in candles {
            wtr.write_record(&[
                candle.epoch.to_string(),
                candle.open.to_string(),
                candle.high.to_string(),
                candle.low.to_string(),
                candle.close.to_string(),
            ])
            .map_err(csv_io)?;
        }
        wtr.flush()?;
        Ok(())
    }

    fn data_range(
        &self,
        symbol: &str,
        granularity: i64,
    ) -> Result<Option<(i64, i64, usize)>, CycletraderError> {
        let candles = self.load(symbol, granularity)?;
        Ok(candles
            .first()
            .zip(candles.last())
            .map(|(first, last)| (first.epoch, last.epoch, candles.len())))
    }

    fn export_trades(
        &self,
        trades: &[Trade],
        output_path: &str,
    ) -> Result<(), CycletraderError> {
        let file = fs::File::create(output_path)?;
        let mut wtr = csv::Writer::from_writer(file);

        wtr.write_record([
            "entry_time",
            "exit_time",
            "side",
            "entry_price",
            "exit_price",
            "stake",
            "pnl",
            "pnl_pct",
            "duration_seconds",
            "exit_reason",
        ])
        .map_err(csv_io)?;
        for trade in trades {
            wtr.write_record(&[
                trade.entry_time.to_string(),
                trade.exit_time.to_string(),
                trade.side.to_string(),
                trade.entry_price.to_string(),
                trade.exit_price.to_string(),
                trade.stake.to_string(),
                trade.pnl.to_string(),
                trade.pnl_pct.to_string(),
                trade.duration_seconds.to_string(),
                trade.exit_reason.clone(),
            ])
            .map_err(csv_io)?;
        }
        wtr.flush()?;
        Ok(())
    }
}

/// Parses one candle file. Rows with unparsable or non-finite fields are
/// logged and skipped; surviving candles come back sorted by epoch.
fn load_candles(path: &Path) -> Result<Vec<Candle>, CycletraderError> {
    let content = fs::read_to_string(path).map_err(|e| CycletraderError::Data {
        reason: format!("failed to read {}: {}", path.display(), e),
    })?;

    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(content.as_bytes());
    let headers = rdr
        .headers()
        .map_err(|e| CycletraderError::Data {
            reason: format!("CSV header error: {}", e),
        })?
        .clone();
    let columns = resolve_columns(&headers)?;

    let mut candles = Vec::new();
    for (row, result) in rdr.records().enumerate() {
        let record = result.map_err(|e| CycletraderError::Data {
            reason: format!("CSV parse error: {}", e),
        })?;
        match parse_candle(&record, &columns) {
            Some(candle) => candles.push(candle),
            // Header is line 1, so data row N sits on line N+1.
            None => warn!(
                "{} line {}: skipped row with unparsable or non-finite fields",
                path.display(),
                row + 2
            ),
        }
    }

    candles.sort_by_key(|c| c.epoch);
    Ok(candles)
}
