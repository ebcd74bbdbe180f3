//! CLI definition and dispatch.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use crate::adapters::csv_store::CsvCandleStore;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::paper_broker::PaperBroker;
use crate::domain::backtest::run_backtest;
use crate::domain::candle::{Candle, resample_closes};
use crate::domain::enhanced::EnhancedStrategy;
use crate::domain::error::CycletraderError;
use crate::domain::harmonic::HarmonicStrategy;
use crate::domain::report::PerformanceReport;
use crate::domain::settings::{
    BacktestSettings, EnhancedParams, HarmonicParams, LiveSettings, StrategyKind,
};
use crate::domain::strategy::Strategy;
use crate::live::LiveEngine;
use crate::ports::candle_store::CandleStore;
use crate::ports::config_port::ConfigPort;

// MTF reference closes aggregate 4x the base timeframe (4h on 1h candles).
const HTF_FACTOR: i64 = 4;

const SWEEP_RISK_FACTORS: [f64; 3] = [0.25, 0.5, 0.75];
const SWEEP_RR_RATIOS: [f64; 3] = [2.0, 3.0, 4.0];

#[derive(Parser, Debug)]
#[command(name = "cycletrader", about = "Harmonic cycle signal engine and backtester")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a backtest over cached candles
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        /// Write closed trades to this CSV file
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long)]
        symbol: Option<String>,
    },
    /// Backtest a risk_factor x rr_ratio grid over one candle series
    Sweep {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        symbol: Option<String>,
    },
    /// Replay cached candles through the live engine with a paper broker
    Paper {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        symbol: Option<String>,
    },
    /// Validate the configuration without running anything
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Show the cached data range for a symbol
    Info {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        symbol: Option<String>,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Backtest {
            config,
            output,
            symbol,
        } => run_backtest_cmd(&config, output.as_ref(), symbol.as_deref()),
        Command::Sweep { config, symbol } => run_sweep(&config, symbol.as_deref()),
        Command::Paper { config, symbol } => run_paper(&config, symbol.as_deref()),
        Command::Validate { config } => run_validate(&config),
        Command::Info { config, symbol } => run_info(&config, symbol.as_deref()),
    }
}

pub fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        eprintln!("error: {e}");
        ExitCode::from(&e)
    })
}

fn strategy_kind(config: &dyn ConfigPort) -> Result<StrategyKind, CycletraderError> {
    match config.get_string("strategy", "kind") {
        Some(value) => StrategyKind::parse(&value),
        None => Ok(StrategyKind::Harmonic),
    }
}

pub fn build_strategy(config: &dyn ConfigPort) -> Result<Box<dyn Strategy>, CycletraderError> {
    match strategy_kind(config)? {
        StrategyKind::Harmonic => Ok(Box::new(HarmonicStrategy::new(
            HarmonicParams::from_config(config)?,
        ))),
        StrategyKind::Enhanced => Ok(Box::new(EnhancedStrategy::new(
            EnhancedParams::from_config(config)?,
        ))),
    }
}

fn csv_dir(config: &dyn ConfigPort) -> PathBuf {
    PathBuf::from(
        config
            .get_string("data", "csv_dir")
            .unwrap_or_else(|| "data".to_string()),
    )
}

fn resolve_symbol(settings: &mut BacktestSettings, symbol_override: Option<&str>) {
    if let Some(symbol) = symbol_override {
        settings.symbol = symbol.trim().to_uppercase();
    }
}

/// Loads and gates the candle series every run-style command starts from.
fn load_candles(
    store: &CsvCandleStore,
    settings: &BacktestSettings,
    minimum: usize,
) -> Result<Vec<Candle>, CycletraderError> {
    let candles = store.load(&settings.symbol, settings.granularity)?;
    if candles.is_empty() {
        return Err(CycletraderError::NoData {
            symbol: settings.symbol.clone(),
            granularity: settings.granularity,
        });
    }
    if candles.len() < minimum {
        return Err(CycletraderError::InsufficientData {
            symbol: settings.symbol.clone(),
            candles: candles.len(),
            minimum,
        });
    }
    Ok(candles)
}

fn format_epoch(epoch: i64) -> String {
    chrono::DateTime::from_timestamp(epoch, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| epoch.to_string())
}

fn run_backtest_cmd(
    config_path: &PathBuf,
    output_path: Option<&PathBuf>,
    symbol_override: Option<&str>,
) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let mut settings = match BacktestSettings::from_config(&config) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    resolve_symbol(&mut settings, symbol_override);

    let mut strategy = match build_strategy(&config) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    eprintln!("Strategy: {}", strategy.name());

    let store = CsvCandleStore::new(csv_dir(&config));
    eprintln!(
        "Loading candles for {} ({}s)...",
        settings.symbol, settings.granularity
    );
    let candles = match load_candles(&store, &settings, strategy.required_lookback()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    eprintln!(
        "Loaded {} candles, {} to {}",
        candles.len(),
        format_epoch(candles[0].epoch),
        format_epoch(candles[candles.len() - 1].epoch)
    );

    let htf = resample_closes(&candles, settings.granularity, HTF_FACTOR);

    eprintln!("Running backtest...");
    let result = run_backtest(strategy.as_mut(), &candles, &settings, Some(&htf));

    println!("{}", result.report);

    if let Some(path) = output_path {
        if let Err(e) = store.export_trades(&result.trades, &path.display().to_string()) {
            eprintln!("error: failed to write trades: {e}");
            return (&e).into();
        }
        eprintln!("Trades written to: {}", path.display());
    }

    ExitCode::SUCCESS
}

fn build_sweep_strategy(
    kind: StrategyKind,
    config: &dyn ConfigPort,
    risk_factor: f64,
    rr_ratio: f64,
) -> Result<Box<dyn Strategy>, CycletraderError> {
    match kind {
        StrategyKind::Harmonic => {
            let mut params = HarmonicParams::from_config(config)?;
            params.risk_cash = params.stake * risk_factor;
            params.rr_ratio = rr_ratio;
            Ok(Box::new(HarmonicStrategy::new(params)))
        }
        StrategyKind::Enhanced => {
            let mut params = EnhancedParams::from_config(config)?;
            params.risk_factor = risk_factor;
            params.rr_ratio = rr_ratio;
            Ok(Box::new(EnhancedStrategy::new(params)))
        }
    }
}

fn run_sweep(config_path: &PathBuf, symbol_override: Option<&str>) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let mut settings = match BacktestSettings::from_config(&config) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    resolve_symbol(&mut settings, symbol_override);

    let kind = match strategy_kind(&config) {
        Ok(k) => k,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    // Built once up front so config errors and the data gate fire before
    // the grid starts.
    let probe = match build_strategy(&config) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let store = CsvCandleStore::new(csv_dir(&config));
    let candles = match load_candles(&store, &settings, probe.required_lookback()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    let htf = resample_closes(&candles, settings.granularity, HTF_FACTOR);

    let combos = SWEEP_RISK_FACTORS.len() * SWEEP_RR_RATIOS.len();
    eprintln!(
        "Sweeping {} combinations over {} candles ({})...",
        combos,
        candles.len(),
        probe.name()
    );

    let mut rows: Vec<(f64, f64, PerformanceReport)> = Vec::with_capacity(combos);
    for &risk_factor in &SWEEP_RISK_FACTORS {
        for &rr_ratio in &SWEEP_RR_RATIOS {
            let mut strategy = match build_sweep_strategy(kind, &config, risk_factor, rr_ratio) {
                Ok(s) => s,
                Err(e) => {
                    eprintln!("error: {e}");
                    return (&e).into();
                }
            };
            let result = run_backtest(strategy.as_mut(), &candles, &settings, Some(&htf));
            eprintln!(
                "  risk_factor={:.2} rr_ratio={:.1}: {} trades, PnL ${:.2}",
                risk_factor, rr_ratio, result.report.total_trades, result.report.total_pnl
            );
            rows.push((risk_factor, rr_ratio, result.report));
        }
    }

    rows.sort_by(|a, b| {
        b.2.total_pnl
            .partial_cmp(&a.2.total_pnl)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    println!("=== Sweep Results ({}) ===", settings.symbol);
    println!(
        "{:>11}  {:>8}  {:>6}  {:>8}  {:>10}  {:>13}  {:>12}",
        "risk_factor",
        "rr_ratio",
        "trades",
        "win_rate",
        "total_pnl",
        "profit_factor",
        "max_drawdown"
    );
    for (risk_factor, rr_ratio, report) in &rows {
        println!(
            "{:>11.2}  {:>8.1}  {:>6}  {:>7.1}%  {:>10.2}  {:>13.2}  {:>11.2}%",
            risk_factor,
            rr_ratio,
            report.total_trades,
            report.win_rate,
            report.total_pnl,
            report.profit_factor,
            report.max_drawdown
        );
    }

    ExitCode::SUCCESS
}

fn run_paper(config_path: &PathBuf, symbol_override: Option<&str>) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let mut settings = match BacktestSettings::from_config(&config) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    resolve_symbol(&mut settings, symbol_override);

    let mut live_settings = match LiveSettings::from_config(&config) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    live_settings.symbol = settings.symbol.clone();

    let strategy = match build_strategy(&config) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let store = CsvCandleStore::new(csv_dir(&config));
    let candles = match load_candles(&store, &settings, 1) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    eprintln!(
        "Replaying {} candles through the live engine...",
        candles.len()
    );

    let broker = Arc::new(PaperBroker::new(settings.initial_balance));
    let mut engine = LiveEngine::new(strategy, broker, live_settings, settings.initial_balance);

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("error: failed to start async runtime: {e}");
            return ExitCode::from(1);
        }
    };

    let outcome: Result<(), CycletraderError> = runtime.block_on(async {
        engine.start().await?;
        for candle in &candles {
            engine.on_candle(candle).await;
        }
        engine.stop();
        Ok(())
    });

    if let Err(e) = outcome {
        eprintln!("error: {e}");
        return (&e).into();
    }

    eprintln!(
        "Replay complete: {} trades booked",
        engine.ledger().trades().len()
    );
    ExitCode::SUCCESS
}

fn run_validate(config_path: &PathBuf) -> ExitCode {
    eprintln!("Validating configuration: {}", config_path.display());
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let settings = match BacktestSettings::from_config(&config) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    eprintln!("\nBacktest:");
    eprintln!("  symbol:          {}", settings.symbol);
    eprintln!("  granularity:     {}s", settings.granularity);
    eprintln!("  initial_balance: ${}", settings.initial_balance);
    eprintln!("  stake:           ${}", settings.stake);

    let strategy = match build_strategy(&config) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    eprintln!("\nStrategy:");
    eprintln!("  kind:            {}", strategy.name());
    eprintln!("  warmup candles:  {}", strategy.required_lookback());

    if let Err(e) = LiveSettings::from_config(&config) {
        eprintln!("error: {e}");
        return (&e).into();
    }

    eprintln!("\nConfiguration is valid.");
    ExitCode::SUCCESS
}

fn run_info(config_path: &PathBuf, symbol_override: Option<&str>) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let mut settings = match BacktestSettings::from_config(&config) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    resolve_symbol(&mut settings, symbol_override);

    let store = CsvCandleStore::new(csv_dir(&config));
    match store.data_range(&settings.symbol, settings.granularity) {
        Ok(Some((min_epoch, max_epoch, count))) => {
            println!(
                "{}: {} candles, {} to {}",
                settings.symbol,
                count,
                format_epoch(min_epoch),
                format_epoch(max_epoch)
            );
            ExitCode::SUCCESS
        }
        Ok(None) => {
            eprintln!("{}: no data found", settings.symbol);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}
