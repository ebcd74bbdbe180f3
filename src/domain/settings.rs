//! Validated runtime settings.
//!
//! Parameters are read once from the config port, merged with defaults, and
//! validated before any run starts. Invalid values fail fast with
//! `ConfigInvalid` rather than surfacing mid-replay.

use crate::domain::error::CycletraderError;
use crate::ports::config_port::ConfigPort;

/// Which strategy implementation to instantiate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyKind {
    Harmonic,
    Enhanced,
}

impl StrategyKind {
    pub fn parse(value: &str) -> Result<Self, CycletraderError> {
        match value.trim().to_lowercase().as_str() {
            "harmonic" => Ok(StrategyKind::Harmonic),
            "enhanced" => Ok(StrategyKind::Enhanced),
            other => Err(CycletraderError::ConfigInvalid {
                section: "strategy".into(),
                key: "kind".into(),
                reason: format!("unknown strategy kind '{other}' (harmonic|enhanced)"),
            }),
        }
    }
}

/// Parameters of the base harmonic strategy.
#[derive(Debug, Clone)]
pub struct HarmonicParams {
    pub lookback: usize,
    pub forecast: usize,
    pub smooth_period: usize,
    pub stake: f64,
    pub risk_cash: f64,
    pub rr_ratio: f64,
    pub atr_period: usize,
    pub atr_multiplier: f64,
    pub mtf_enabled: bool,
}

impl Default for HarmonicParams {
    fn default() -> Self {
        Self {
            lookback: 150,
            forecast: 20,
            smooth_period: 11,
            stake: 30.0,
            risk_cash: 15.0,
            rr_ratio: 3.0,
            atr_period: 14,
            atr_multiplier: 0.5,
            mtf_enabled: false,
        }
    }
}

impl HarmonicParams {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, CycletraderError> {
        let defaults = Self::default();
        let stake = config.get_double("strategy", "stake", defaults.stake);
        let risk_factor = config.get_double("strategy", "risk_factor", 0.5);
        let params = Self {
            lookback: config.get_int("strategy", "lookback", defaults.lookback as i64) as usize,
            forecast: config.get_int("strategy", "forecast", defaults.forecast as i64) as usize,
            smooth_period: config.get_int(
                "strategy",
                "smooth_period",
                defaults.smooth_period as i64,
            ) as usize,
            stake,
            risk_cash: config.get_double("strategy", "risk_cash", stake * risk_factor),
            rr_ratio: config.get_double("strategy", "rr_ratio", defaults.rr_ratio),
            atr_period: config.get_int("strategy", "atr_period", defaults.atr_period as i64)
                as usize,
            atr_multiplier: config.get_double(
                "strategy",
                "atr_multiplier",
                defaults.atr_multiplier,
            ),
            mtf_enabled: config.get_bool("strategy", "mtf_enabled", defaults.mtf_enabled),
        };
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<(), CycletraderError> {
        require_positive_int("lookback", self.lookback)?;
        require_positive_int("forecast", self.forecast)?;
        require_positive_int("smooth_period", self.smooth_period)?;
        require_positive_int("atr_period", self.atr_period)?;
        require_positive("stake", self.stake)?;
        require_positive("risk_cash", self.risk_cash)?;
        require_positive("rr_ratio", self.rr_ratio)?;
        require_non_negative("atr_multiplier", self.atr_multiplier)?;
        if self.smooth_period > self.lookback {
            return Err(invalid(
                "smooth_period",
                "smooth_period must not exceed lookback",
            ));
        }
        Ok(())
    }

    /// Candles needed before the strategy can produce non-HOLD output.
    pub fn required_lookback(&self) -> usize {
        self.lookback.max(self.atr_period) + 20
    }
}

/// Parameters of the enhanced harmonic strategy.
#[derive(Debug, Clone)]
pub struct EnhancedParams {
    pub lookback: usize,
    pub forecast: usize,
    pub smooth_period: usize,
    pub stake: f64,
    pub risk_factor: f64,
    pub rr_ratio: f64,
    pub atr_period: usize,
    pub min_atr_multiplier: f64,
    pub max_stake_multiplier: f64,
    pub vol_expansion: f64,
    pub trail_activation: f64,
    pub trail_distance: f64,
    pub momentum_period: usize,
    pub use_momentum_filter: bool,
    pub use_trailing_stop: bool,
    pub mtf_enabled: bool,
}

impl Default for EnhancedParams {
    fn default() -> Self {
        Self {
            lookback: 150,
            forecast: 20,
            smooth_period: 11,
            stake: 30.0,
            risk_factor: 0.5,
            rr_ratio: 4.0,
            atr_period: 14,
            min_atr_multiplier: 0.3,
            max_stake_multiplier: 2.0,
            vol_expansion: 1.2,
            trail_activation: 1.5,
            trail_distance: 0.5,
            momentum_period: 10,
            use_momentum_filter: true,
            use_trailing_stop: true,
            mtf_enabled: true,
        }
    }
}

impl EnhancedParams {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, CycletraderError> {
        let d = Self::default();
        let params = Self {
            lookback: config.get_int("strategy", "lookback", d.lookback as i64) as usize,
            forecast: config.get_int("strategy", "forecast", d.forecast as i64) as usize,
            smooth_period: config.get_int("strategy", "smooth_period", d.smooth_period as i64)
                as usize,
            stake: config.get_double("strategy", "stake", d.stake),
            risk_factor: config.get_double("strategy", "risk_factor", d.risk_factor),
            rr_ratio: config.get_double("strategy", "rr_ratio", d.rr_ratio),
            atr_period: config.get_int("strategy", "atr_period", d.atr_period as i64) as usize,
            min_atr_multiplier: config.get_double(
                "strategy",
                "min_atr_multiplier",
                d.min_atr_multiplier,
            ),
            max_stake_multiplier: config.get_double(
                "strategy",
                "max_stake_multiplier",
                d.max_stake_multiplier,
            ),
            vol_expansion: config.get_double("strategy", "vol_expansion", d.vol_expansion),
            trail_activation: config.get_double("strategy", "trail_activation", d.trail_activation),
            trail_distance: config.get_double("strategy", "trail_distance", d.trail_distance),
            momentum_period: config.get_int(
                "strategy",
                "momentum_period",
                d.momentum_period as i64,
            ) as usize,
            use_momentum_filter: config.get_bool(
                "strategy",
                "use_momentum_filter",
                d.use_momentum_filter,
            ),
            use_trailing_stop: config.get_bool(
                "strategy",
                "use_trailing_stop",
                d.use_trailing_stop,
            ),
            mtf_enabled: config.get_bool("strategy", "mtf_enabled", d.mtf_enabled),
        };
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<(), CycletraderError> {
        require_positive_int("lookback", self.lookback)?;
        require_positive_int("forecast", self.forecast)?;
        require_positive_int("smooth_period", self.smooth_period)?;
        require_positive_int("atr_period", self.atr_period)?;
        require_positive_int("momentum_period", self.momentum_period)?;
        require_positive("stake", self.stake)?;
        require_positive("risk_factor", self.risk_factor)?;
        require_positive("rr_ratio", self.rr_ratio)?;
        require_non_negative("min_atr_multiplier", self.min_atr_multiplier)?;
        require_non_negative("trail_activation", self.trail_activation)?;
        require_non_negative("trail_distance", self.trail_distance)?;
        require_positive("vol_expansion", self.vol_expansion)?;
        if self.max_stake_multiplier < 1.0 {
            return Err(invalid(
                "max_stake_multiplier",
                "max_stake_multiplier must be at least 1",
            ));
        }
        if self.smooth_period > self.lookback {
            return Err(invalid(
                "smooth_period",
                "smooth_period must not exceed lookback",
            ));
        }
        Ok(())
    }

    pub fn required_lookback(&self) -> usize {
        self.lookback.max(self.atr_period).max(self.momentum_period) + 20
    }
}

/// Settings of one backtest run.
#[derive(Debug, Clone)]
pub struct BacktestSettings {
    pub symbol: String,
    pub granularity: i64,
    pub initial_balance: f64,
    pub stake: f64,
}

impl BacktestSettings {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, CycletraderError> {
        let symbol = config
            .get_string("backtest", "symbol")
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| CycletraderError::ConfigMissing {
                section: "backtest".into(),
                key: "symbol".into(),
            })?;

        let settings = Self {
            symbol: symbol.trim().to_string(),
            granularity: config.get_int("backtest", "granularity", 3600),
            initial_balance: config.get_double("backtest", "initial_balance", 1000.0),
            stake: config.get_double("backtest", "stake", 30.0),
        };
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), CycletraderError> {
        if self.granularity <= 0 {
            return Err(CycletraderError::ConfigInvalid {
                section: "backtest".into(),
                key: "granularity".into(),
                reason: "granularity must be positive seconds".into(),
            });
        }
        if self.initial_balance <= 0.0 {
            return Err(CycletraderError::ConfigInvalid {
                section: "backtest".into(),
                key: "initial_balance".into(),
                reason: "initial_balance must be positive".into(),
            });
        }
        if self.stake <= 0.0 {
            return Err(CycletraderError::ConfigInvalid {
                section: "backtest".into(),
                key: "stake".into(),
                reason: "stake must be positive".into(),
            });
        }
        Ok(())
    }
}

/// Settings of the live orchestrator.
#[derive(Debug, Clone)]
pub struct LiveSettings {
    pub symbol: String,
    pub stake: f64,
    /// Minimum spacing between quote requests, in seconds.
    pub min_quote_interval: f64,
    pub demo: bool,
    /// Contract duration passed through to the broker.
    pub duration: u32,
    pub duration_unit: String,
}

impl LiveSettings {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, CycletraderError> {
        let symbol = config
            .get_string("backtest", "symbol")
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| CycletraderError::ConfigMissing {
                section: "backtest".into(),
                key: "symbol".into(),
            })?;

        let settings = Self {
            symbol: symbol.trim().to_string(),
            stake: config.get_double("backtest", "stake", 30.0),
            min_quote_interval: config.get_double("live", "min_quote_interval", 1.5),
            demo: config.get_bool("live", "demo", true),
            duration: config.get_int("live", "duration", 5) as u32,
            duration_unit: config
                .get_string("live", "duration_unit")
                .unwrap_or_else(|| "t".to_string()),
        };
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), CycletraderError> {
        if self.min_quote_interval < 0.0 {
            return Err(CycletraderError::ConfigInvalid {
                section: "live".into(),
                key: "min_quote_interval".into(),
                reason: "min_quote_interval must be non-negative".into(),
            });
        }
        if self.stake <= 0.0 {
            return Err(CycletraderError::ConfigInvalid {
                section: "backtest".into(),
                key: "stake".into(),
                reason: "stake must be positive".into(),
            });
        }
        Ok(())
    }
}

fn invalid(key: &str, reason: &str) -> CycletraderError {
    CycletraderError::ConfigInvalid {
        section: "strategy".into(),
        key: key.into(),
        reason: reason.into(),
    }
}

fn require_positive(key: &str, value: f64) -> Result<(), CycletraderError> {
    if value <= 0.0 {
        return Err(invalid(key, &format!("{key} must be positive")));
    }
    Ok(())
}

fn require_non_negative(key: &str, value: f64) -> Result<(), CycletraderError> {
    if value < 0.0 {
        return Err(invalid(key, &format!("{key} must be non-negative")));
    }
    Ok(())
}

fn require_positive_int(key: &str, value: usize) -> Result<(), CycletraderError> {
    if value == 0 {
        return Err(invalid(key, &format!("{key} must be positive")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::file_config_adapter::FileConfigAdapter;

    fn make_config(content: &str) -> FileConfigAdapter {
        FileConfigAdapter::from_string(content).unwrap()
    }

    #[test]
    fn harmonic_defaults_apply() {
        let config = make_config("[strategy]\n");
        let params = HarmonicParams::from_config(&config).unwrap();
        assert_eq!(params.lookback, 150);
        assert_eq!(params.forecast, 20);
        assert_eq!(params.smooth_period, 11);
        assert_eq!(params.stake, 30.0);
        assert_eq!(params.risk_cash, 15.0);
        assert_eq!(params.rr_ratio, 3.0);
        assert!(!params.mtf_enabled);
    }

    #[test]
    fn risk_cash_derives_from_risk_factor() {
        let config = make_config("[strategy]\nstake = 100\nrisk_factor = 0.25\n");
        let params = HarmonicParams::from_config(&config).unwrap();
        assert_eq!(params.risk_cash, 25.0);
    }

    #[test]
    fn explicit_risk_cash_wins() {
        let config = make_config("[strategy]\nstake = 100\nrisk_factor = 0.25\nrisk_cash = 40\n");
        let params = HarmonicParams::from_config(&config).unwrap();
        assert_eq!(params.risk_cash, 40.0);
    }

    #[test]
    fn rr_ratio_zero_fails() {
        let config = make_config("[strategy]\nrr_ratio = 0\n");
        let err = HarmonicParams::from_config(&config).unwrap_err();
        assert!(matches!(err, CycletraderError::ConfigInvalid { key, .. } if key == "rr_ratio"));
    }

    #[test]
    fn negative_stake_fails() {
        let config = make_config("[strategy]\nstake = -5\n");
        let err = HarmonicParams::from_config(&config).unwrap_err();
        assert!(matches!(err, CycletraderError::ConfigInvalid { key, .. } if key == "stake"));
    }

    #[test]
    fn smooth_period_beyond_lookback_fails() {
        let config = make_config("[strategy]\nlookback = 10\nsmooth_period = 11\n");
        let err = HarmonicParams::from_config(&config).unwrap_err();
        assert!(
            matches!(err, CycletraderError::ConfigInvalid { key, .. } if key == "smooth_period")
        );
    }

    #[test]
    fn required_lookback_adds_margin() {
        let params = HarmonicParams::default();
        assert_eq!(params.required_lookback(), 170);

        let short = HarmonicParams {
            lookback: 10,
            atr_period: 14,
            smooth_period: 5,
            ..HarmonicParams::default()
        };
        assert_eq!(short.required_lookback(), 34);
    }

    #[test]
    fn enhanced_defaults_apply() {
        let config = make_config("[strategy]\n");
        let params = EnhancedParams::from_config(&config).unwrap();
        assert_eq!(params.rr_ratio, 4.0);
        assert_eq!(params.min_atr_multiplier, 0.3);
        assert_eq!(params.max_stake_multiplier, 2.0);
        assert!(params.use_trailing_stop);
        assert!(params.use_momentum_filter);
        assert!(params.mtf_enabled);
        assert_eq!(params.required_lookback(), 170);
    }

    #[test]
    fn enhanced_stake_multiplier_below_one_fails() {
        let config = make_config("[strategy]\nmax_stake_multiplier = 0.5\n");
        let err = EnhancedParams::from_config(&config).unwrap_err();
        assert!(
            matches!(err, CycletraderError::ConfigInvalid { key, .. } if key == "max_stake_multiplier")
        );
    }

    #[test]
    fn strategy_kind_parses() {
        assert_eq!(
            StrategyKind::parse("harmonic").unwrap(),
            StrategyKind::Harmonic
        );
        assert_eq!(
            StrategyKind::parse(" Enhanced ").unwrap(),
            StrategyKind::Enhanced
        );
        assert!(StrategyKind::parse("momentum").is_err());
    }

    #[test]
    fn backtest_settings_require_symbol() {
        let config = make_config("[backtest]\ngranularity = 3600\n");
        let err = BacktestSettings::from_config(&config).unwrap_err();
        assert!(matches!(err, CycletraderError::ConfigMissing { key, .. } if key == "symbol"));
    }

    #[test]
    fn backtest_settings_defaults() {
        let config = make_config("[backtest]\nsymbol = R_100\n");
        let settings = BacktestSettings::from_config(&config).unwrap();
        assert_eq!(settings.symbol, "R_100");
        assert_eq!(settings.granularity, 3600);
        assert_eq!(settings.initial_balance, 1000.0);
        assert_eq!(settings.stake, 30.0);
    }

    #[test]
    fn backtest_settings_reject_bad_granularity() {
        let config = make_config("[backtest]\nsymbol = R_100\ngranularity = 0\n");
        let err = BacktestSettings::from_config(&config).unwrap_err();
        assert!(matches!(err, CycletraderError::ConfigInvalid { key, .. } if key == "granularity"));
    }

    #[test]
    fn live_settings_defaults() {
        let config = make_config("[backtest]\nsymbol = R_100\n");
        let settings = LiveSettings::from_config(&config).unwrap();
        assert_eq!(settings.min_quote_interval, 1.5);
        assert!(settings.demo);
        assert_eq!(settings.duration, 5);
        assert_eq!(settings.duration_unit, "t");
    }
}
