//! Domain error types.

/// Top-level error type for cycletrader.
#[derive(Debug, thiserror::Error)]
pub enum CycletraderError {
    #[error("data error: {reason}")]
    Data { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("broker error: {reason}")]
    Broker { reason: String },

    #[error("broker authorization failed: {reason}")]
    BrokerAuth { reason: String },

    #[error("no data for {symbol} at granularity {granularity}")]
    NoData { symbol: String, granularity: i64 },

    #[error("insufficient data for {symbol}: have {candles} candles, need {minimum}")]
    InsufficientData {
        symbol: String,
        candles: usize,
        minimum: usize,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&CycletraderError> for std::process::ExitCode {
    fn from(err: &CycletraderError) -> Self {
        let code: u8 = match err {
            CycletraderError::Io(_) => 1,
            CycletraderError::ConfigParse { .. }
            | CycletraderError::ConfigMissing { .. }
            | CycletraderError::ConfigInvalid { .. } => 2,
            CycletraderError::Data { .. }
            | CycletraderError::NoData { .. }
            | CycletraderError::InsufficientData { .. } => 3,
            CycletraderError::Broker { .. } | CycletraderError::BrokerAuth { .. } => 4,
        };
        std::process::ExitCode::from(code)
    }
}
