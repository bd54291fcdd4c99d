//! CLI definition and dispatch.

use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_ledger_adapter::CsvLedgerAdapter;
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::order_journal_adapter::CsvOrderJournal;
use crate::domain::config_validation::{validate_data_config, validate_strategy_config};
use crate::domain::cycle::{CycleOptions, CyclePorts, CycleReport, run_cycle};
use crate::domain::decision::BuyDecision;
use crate::domain::error::NiftyShopError;
use crate::domain::position::{Aggregation, QuoteBook, aggregate};
use crate::domain::screening::{ScreenConfig, ScreeningReport, screen};
use crate::domain::strategy::StrategyParams;
use crate::domain::symbol::Symbol;
use crate::domain::trade::LedgerSnapshot;
use crate::domain::universe::{
    DEFAULT_INDEX, Universe, UniverseSource, parse_symbols, resolve_universe,
};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::ledger_port::LedgerPort;
use crate::ports::report_port::ReportPort;

const DEFAULT_ORDERS_PATH: &str = "orders.csv";

#[derive(Parser, Debug)]
#[command(name = "niftyshop", about = "Nifty Shop daily buy-the-dip strategy")]
pub struct Cli {
    /// trace, debug, info, warn or error (RUST_LOG takes precedence)
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run one decision cycle: sell pass, then buy/averaging pass
    Run {
        #[arg(short, long)]
        config: PathBuf,
        /// Decide without placing orders
        #[arg(long)]
        dry_run: bool,
        /// Cycle date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        as_of: Option<String>,
        /// Write the cycle's decisions to this CSV file
        #[arg(short, long)]
        report: Option<PathBuf>,
        /// Order journal path, overrides [data] orders_path
        #[arg(long)]
        orders: Option<PathBuf>,
    },
    /// Show the stocks furthest below their 20 DMA
    Screen {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        as_of: Option<String>,
    },
    /// Show the strategy's aggregated holdings
    Holdings {
        #[arg(short, long)]
        config: PathBuf,
        /// Price holdings at this date's close (YYYY-MM-DD)
        #[arg(long)]
        as_of: Option<String>,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Show the resolved stock universe
    Universe {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    init_tracing(&cli.log_level);

    match cli.command {
        Command::Run {
            config,
            dry_run,
            as_of,
            report,
            orders,
        } => run_daily(
            &config,
            dry_run,
            as_of.as_deref(),
            report.as_deref(),
            orders.as_deref(),
        ),
        Command::Screen { config, as_of } => run_screen(&config, as_of.as_deref()),
        Command::Holdings { config, as_of } => run_holdings(&config, as_of.as_deref()),
        Command::Validate { config } => run_validate(&config),
        Command::Universe { config } => run_universe(&config),
    }
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    // a subscriber may already be installed when run() is called more than once
    let _ = tracing::subscriber::set_global_default(subscriber);
}

fn fail(err: NiftyShopError) -> ExitCode {
    eprintln!("error: {err}");
    ExitCode::from(&err)
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(fail)
}

/// Validated strategy parameters; absent keys take their defaults.
pub fn build_params(config: &dyn ConfigPort) -> Result<StrategyParams, NiftyShopError> {
    validate_strategy_config(config)?;
    let d = StrategyParams::default();

    Ok(StrategyParams {
        name: config
            .get_string("strategy", "name")
            .map(|s| s.trim().to_string())
            .unwrap_or(d.name),
        investment_first_buy: config.get_double(
            "strategy",
            "investment_first_buy",
            d.investment_first_buy,
        ),
        investment_averaging: config.get_double(
            "strategy",
            "investment_averaging",
            d.investment_averaging,
        ),
        target_pct: config.get_double("strategy", "target_pct", d.target_pct),
        averaging_pct: config.get_double("strategy", "averaging_pct", d.averaging_pct),
        max_buys_per_day: config.get_int("strategy", "max_buys_per_day", d.max_buys_per_day as i64)
            as usize,
        max_sells_per_day: config.get_int(
            "strategy",
            "max_sells_per_day",
            d.max_sells_per_day as i64,
        ) as usize,
        max_averaging_per_stock: config.get_int(
            "strategy",
            "max_averaging_per_stock",
            d.max_averaging_per_stock as i64,
        ) as usize,
        lookback_days: config.get_int("strategy", "lookback_days", d.lookback_days),
        top_k: config.get_int("strategy", "top_k", d.top_k as i64) as usize,
    })
}

pub fn is_enabled(config: &dyn ConfigPort) -> bool {
    config.get_bool("strategy", "enabled", true)
}

pub fn resolve_index(config: &dyn ConfigPort) -> String {
    config
        .get_string("universe", "index")
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| DEFAULT_INDEX.to_string())
}

/// Explicit `[universe] symbols` list, if configured.
pub fn configured_symbols(config: &dyn ConfigPort) -> Result<Option<Vec<Symbol>>, NiftyShopError> {
    match config.get_string("universe", "symbols") {
        Some(list) if !list.trim().is_empty() => {
            parse_symbols(&list)
                .map(Some)
                .map_err(|e| NiftyShopError::ConfigInvalid {
                    section: "universe".to_string(),
                    key: "symbols".to_string(),
                    reason: e.to_string(),
                })
        }
        _ => Ok(None),
    }
}

fn universe_for(config: &dyn ConfigPort, data: &dyn DataPort) -> Result<Universe, NiftyShopError> {
    let index = resolve_index(config);
    Ok(match configured_symbols(config)? {
        Some(symbols) => Universe::configured(&index, symbols),
        None => resolve_universe(data, &index),
    })
}

/// `YYYY-MM-DD`, or today's local date when absent.
pub fn parse_as_of(value: Option<&str>) -> Result<NaiveDate, NiftyShopError> {
    match value {
        None => Ok(Local::now().date_naive()),
        Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|e| {
            NiftyShopError::ConfigInvalid {
                section: "cli".to_string(),
                key: "as_of".to_string(),
                reason: format!("'{}': {}", s, e),
            }
        }),
    }
}

fn data_path(config: &dyn ConfigPort, key: &str) -> Result<PathBuf, NiftyShopError> {
    config
        .get_string("data", key)
        .map(|s| PathBuf::from(s.trim()))
        .ok_or_else(|| NiftyShopError::ConfigMissing {
            section: "data".to_string(),
            key: key.to_string(),
        })
}

/// Builds the CSV adapters from `[data]` and runs one cycle.
pub fn execute_cycle(
    config: &dyn ConfigPort,
    as_of: NaiveDate,
    dry_run: bool,
    orders_override: Option<&Path>,
) -> Result<CycleReport, NiftyShopError> {
    validate_data_config(config)?;
    let params = build_params(config)?;

    let market = CsvAdapter::new(data_path(config, "price_dir")?).with_as_of(as_of);
    let ledger = CsvLedgerAdapter::new(data_path(config, "ledger_path")?);
    let orders_path = match orders_override {
        Some(p) => p.to_path_buf(),
        None => data_path(config, "orders_path").unwrap_or_else(|_| PathBuf::from(DEFAULT_ORDERS_PATH)),
    };
    let broker = CsvOrderJournal::new(orders_path);

    let ports = CyclePorts {
        data: &market,
        quotes: &market,
        ledger: &ledger,
        broker: &broker,
    };
    let options = CycleOptions {
        as_of,
        index: resolve_index(config),
        symbols: configured_symbols(config)?,
        dry_run,
    };
    run_cycle(&ports, &params, &options)
}

fn run_daily(
    config_path: &Path,
    dry_run: bool,
    as_of: Option<&str>,
    report_path: Option<&Path>,
    orders_path: Option<&Path>,
) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    if !is_enabled(&adapter) {
        info!("strategy disabled in config, nothing to do");
        eprintln!("Strategy is disabled ([strategy] enabled = false)");
        return ExitCode::SUCCESS;
    }

    let as_of = match parse_as_of(as_of) {
        Ok(d) => d,
        Err(e) => return fail(e),
    };

    let report = match execute_cycle(&adapter, as_of, dry_run, orders_path) {
        Ok(r) => r,
        Err(e) => return fail(e),
    };

    print_cycle(&report);

    if let Some(path) = report_path {
        let Some(path_str) = path.to_str() else {
            return fail(NiftyShopError::Report {
                reason: format!("report path is not valid UTF-8: {}", path.display()),
            });
        };
        if let Err(e) = CsvReportAdapter::new().write(&report, path_str) {
            return fail(e);
        }
        eprintln!("\nReport written to: {}", path.display());
    }

    ExitCode::SUCCESS
}

fn run_screen(config_path: &Path, as_of: Option<&str>) -> ExitCode {
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    let result = parse_as_of(as_of).and_then(|as_of| {
        let params = build_params(&adapter)?;
        let market = CsvAdapter::new(data_path(&adapter, "price_dir")?);
        let universe = universe_for(&adapter, &market)?;
        Ok(screen(
            &market,
            &universe.symbols,
            as_of,
            &ScreenConfig {
                lookback_days: params.lookback_days,
                top_k: params.top_k,
            },
        ))
    });

    match result {
        Ok(report) => {
            print_screening(&report);
            ExitCode::SUCCESS
        }
        Err(e) => fail(e),
    }
}

fn run_holdings(config_path: &Path, as_of: Option<&str>) -> ExitCode {
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    let result = parse_as_of(as_of).and_then(|as_of| {
        let params = build_params(&adapter)?;
        let market = CsvAdapter::new(data_path(&adapter, "price_dir")?).with_as_of(as_of);
        let ledger = CsvLedgerAdapter::new(data_path(&adapter, "ledger_path")?);
        let snapshot = LedgerSnapshot::new(ledger.list_trades(&params.name)?);
        let held: Vec<_> = snapshot
            .open_lots(&params.name)
            .map(|t| t.symbol.clone())
            .collect();
        let quotes = QuoteBook::fetch(&market, &held);
        Ok(aggregate(&snapshot, &params.name, &quotes))
    });

    match result {
        Ok(aggregation) => {
            print_positions(&aggregation);
            ExitCode::SUCCESS
        }
        Err(e) => fail(e),
    }
}

fn run_validate(config_path: &Path) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    let params = match validate_data_config(&adapter)
        .and_then(|_| configured_symbols(&adapter))
        .and_then(|_| build_params(&adapter))
    {
        Ok(p) => p,
        Err(e) => return fail(e),
    };

    eprintln!("Config validated successfully");
    eprintln!("  strategy:             {}", params.name);
    eprintln!("  enabled:              {}", is_enabled(&adapter));
    eprintln!("  first buy:            {:.2}", params.investment_first_buy);
    eprintln!("  averaging buy:        {:.2}", params.investment_averaging);
    eprintln!("  target:               {:.2}%", params.target_pct);
    eprintln!("  averaging trigger:    {:.2}%", params.averaging_pct);
    eprintln!("  max buys/sells:       {}/{}", params.max_buys_per_day, params.max_sells_per_day);
    eprintln!("  max averaging/stock:  {}", params.max_averaging_per_stock);
    eprintln!("  screen:               top {} over {} days", params.top_k, params.lookback_days);
    eprintln!("  universe:             {}", resolve_index(&adapter));
    ExitCode::SUCCESS
}

fn run_universe(config_path: &Path) -> ExitCode {
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    let market = match data_path(&adapter, "price_dir") {
        Ok(p) => CsvAdapter::new(p),
        Err(e) => return fail(e),
    };

    let universe = match universe_for(&adapter, &market) {
        Ok(u) => u,
        Err(e) => return fail(e),
    };
    let source = match universe.source {
        UniverseSource::Provider => "provider",
        UniverseSource::Configured => "configured",
        UniverseSource::Fallback => "static fallback",
    };
    eprintln!("{} ({} symbols, {})", universe.index, universe.count(), source);
    for symbol in &universe.symbols {
        println!("{}", symbol);
    }
    ExitCode::SUCCESS
}

fn print_screening(report: &ScreeningReport) {
    println!(
        "{:<16} {:>12} {:>12} {:>12}",
        "Symbol", "Deviation %", "CMP", "20 DMA"
    );
    for stock in &report.candidates {
        println!(
            "{:<16} {:>12.2} {:>12.2} {:>12.2}",
            stock.symbol, stock.deviation_pct, stock.close, stock.dma
        );
    }
    if report.candidates.is_empty() {
        println!("(no stock below its 20 DMA)");
    }
    for skipped in &report.skipped {
        warn!(symbol = %skipped.symbol, reason = %skipped.reason, "skipped in screening");
    }
    eprintln!(
        "{} eligible, {} above average, {} skipped",
        report.eligible_count,
        report.above_average.len(),
        report.skipped.len()
    );
}

fn print_positions(aggregation: &Aggregation) {
    println!(
        "{:<16} {:>8} {:>12} {:>12} {:>9} {:>5}",
        "Symbol", "Qty", "Avg Entry", "CMP", "P&L %", "Lots"
    );
    for p in aggregation.positions.values() {
        println!(
            "{:<16} {:>8} {:>12.2} {:>12.2} {:>9.2} {:>5}",
            p.symbol, p.total_qty, p.weighted_avg_entry, p.current_price, p.unrealized_pnl_pct, p.lots
        );
    }
    if aggregation.positions.is_empty() {
        println!("(no open positions)");
    }
    for symbol in &aggregation.unpriced {
        eprintln!("warning: no quote for held symbol {}", symbol);
    }
}

fn print_cycle(report: &CycleReport) {
    let mode = if report.dry_run { " (dry run)" } else { "" };
    println!("=== {} {}{} ===", report.strategy, report.as_of, mode);

    println!("\n--- Holdings ---");
    print_positions(&report.positions_before);

    println!("\n--- Sells ---");
    if report.sells.is_empty() {
        println!("(none)");
    }
    for sell in &report.sells {
        println!("SELL {:<16} P&L {:.2}%", sell.symbol, sell.pnl_pct);
    }

    println!("\n--- Screen ---");
    print_screening(&report.screening);

    println!("\n--- Orders ---");
    if let BuyDecision::NoAction(reason) = &report.buy {
        println!("(none: {})", reason);
    }
    for order in &report.orders {
        println!(
            "{:<7} {:<16} qty {:>6} @ {:>10.2} ({:.2})",
            order.kind, order.symbol, order.quantity, order.reference_price, order.investment
        );
    }

    if !report.failures.is_empty() {
        println!("\n--- Failures ---");
        for failure in &report.failures {
            println!("{:<16} {}", failure.symbol(), failure);
        }
    }
}
