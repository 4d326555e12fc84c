//! CLI definition and dispatch for the reference driver.
//!
//! The driver replays CSV bar histories through a configured strategy and
//! hands each period's target allocation to a sink. It simulates no fills
//! and tracks no cash; execution belongs to the host engine.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_bars::CsvBarSource;
use crate::adapters::csv_tables;
use crate::adapters::ini_config::IniConfigAdapter;
use crate::adapters::sinks::{ConsoleSink, CsvSink};
use crate::domain::bar::Bar;
use crate::domain::config_validation::validate_strategy_config;
use crate::domain::error::SignallocError;
use crate::domain::fundamentals::{AnalystEstimate, DcfValuation, EarningsSurprise};
use crate::domain::snapshot::{MarketSnapshot, ModelAllocation, unified_timeline};
use crate::domain::strategies;
use crate::domain::universe::validate_universe;
use crate::ports::allocation_sink::AllocationSink;
use crate::ports::bar_source::BarSource;
use crate::ports::config_source::ConfigSource;

#[derive(Parser, Debug)]
#[command(name = "signalloc", about = "Signal scoring and target-allocation engine")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Replay bar history through a configured strategy
    Replay {
        #[arg(short, long)]
        config: PathBuf,
        /// Write allocations to a CSV file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Validate a strategy configuration
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Show data range for symbol(s) in the configured data directory
    Info {
        #[arg(long)]
        symbol: Option<String>,
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    let result = match cli.command {
        Command::Replay { config, output } => run_replay(&config, output.as_deref()),
        Command::Validate { config } => run_validate(&config),
        Command::Info { symbol, config } => run_info(symbol.as_deref(), &config),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::from(&err)
        }
    }
}

pub fn load_config(path: &Path) -> Result<IniConfigAdapter, SignallocError> {
    IniConfigAdapter::from_file(path).map_err(|e| SignallocError::ConfigParse {
        file: path.display().to_string(),
        reason: e.to_string(),
    })
}

fn run_replay(config_path: &Path, output: Option<&Path>) -> Result<(), SignallocError> {
    let config = load_config(config_path)?;
    validate_strategy_config(&config)?;

    match output {
        Some(path) => {
            let mut sink = CsvSink::create(path)?;
            replay(&config, &mut sink)?;
            sink.finish()
        }
        None => {
            let mut sink = ConsoleSink;
            replay(&config, &mut sink)
        }
    }
}

fn run_validate(config_path: &Path) -> Result<(), SignallocError> {
    let config = load_config(config_path)?;
    validate_strategy_config(&config)?;
    println!("Configuration OK");
    Ok(())
}

fn run_info(symbol: Option<&str>, config_path: &Path) -> Result<(), SignallocError> {
    let config = load_config(config_path)?;
    let source = CsvBarSource::new(data_dir(&config)?);

    let symbols = match symbol {
        Some(s) => vec![s.to_uppercase()],
        None => source.list_symbols()?,
    };

    for symbol in symbols {
        match source.data_range(&symbol)? {
            Some((first, last, bars)) => {
                println!("{symbol}: {bars} bars, {first} to {last}");
            }
            None => println!("{symbol}: no data"),
        }
    }
    Ok(())
}

fn data_dir(config: &dyn ConfigSource) -> Result<PathBuf, SignallocError> {
    config
        .get_string("replay", "data_dir")
        .map(PathBuf::from)
        .ok_or_else(|| SignallocError::ConfigMissing {
            section: "replay".into(),
            key: "data_dir".into(),
        })
}

fn replay_date(config: &dyn ConfigSource, key: &str) -> Result<NaiveDate, SignallocError> {
    let raw = config
        .get_string("replay", key)
        .ok_or_else(|| SignallocError::ConfigMissing {
            section: "replay".into(),
            key: key.to_string(),
        })?;
    NaiveDate::parse_from_str(&raw, "%Y-%m-%d").map_err(|_| SignallocError::ConfigInvalid {
        section: "replay".into(),
        key: key.to_string(),
        reason: format!("invalid {key} format, expected YYYY-MM-DD"),
    })
}

/// Per-key cursor that reveals records into a destination map as their
/// dates pass, so a strategy never sees data from the future.
fn advance_series<T: Clone>(
    date: NaiveDate,
    source: &HashMap<String, Vec<T>>,
    cursors: &mut HashMap<String, usize>,
    dest: &mut HashMap<String, Vec<T>>,
    record_date: impl Fn(&T) -> NaiveDate,
) {
    for (key, records) in source {
        let cursor = cursors.entry(key.clone()).or_insert(0);
        let series = dest.entry(key.clone()).or_default();
        while *cursor < records.len() && record_date(&records[*cursor]) <= date {
            series.push(records[*cursor].clone());
            *cursor += 1;
        }
    }
}

/// Replay the configured date window through the configured strategy,
/// handing each period's allocation to the sink.
pub fn replay(
    config: &dyn ConfigSource,
    sink: &mut dyn AllocationSink,
) -> Result<(), SignallocError> {
    let mut strategy = strategies::from_config(config)?;
    let source = CsvBarSource::new(data_dir(config)?);
    let start_date = replay_date(config, "start_date")?;
    let end_date = replay_date(config, "end_date")?;

    let validation = validate_universe(&source, strategy.assets(), start_date, end_date)?;

    let mut full_bars: HashMap<String, Vec<Bar>> = HashMap::new();
    for symbol in &validation.symbols {
        full_bars.insert(
            symbol.clone(),
            source.fetch_bars(symbol, start_date, end_date)?,
        );
    }
    let timeline = unified_timeline(&full_bars);
    let tables = load_side_tables(config, &validation.symbols)?;

    let mut snapshot = MarketSnapshot::new();
    let mut bar_cursors = HashMap::new();
    let mut earnings_cursors = HashMap::new();
    let mut estimates_cursors = HashMap::new();
    let mut valuations_cursors = HashMap::new();
    let mut model_cursors = HashMap::new();

    for date in timeline {
        advance_series(date, &full_bars, &mut bar_cursors, &mut snapshot.bars, |b| {
            b.date
        });
        advance_series(
            date,
            &tables.earnings,
            &mut earnings_cursors,
            &mut snapshot.earnings,
            |r| r.date,
        );
        advance_series(
            date,
            &tables.estimates,
            &mut estimates_cursors,
            &mut snapshot.estimates,
            |r| r.date,
        );
        advance_series(
            date,
            &tables.valuations,
            &mut valuations_cursors,
            &mut snapshot.valuations,
            |r| r.date,
        );
        advance_series(
            date,
            &tables.model_portfolios,
            &mut model_cursors,
            &mut snapshot.model_portfolios,
            |r| r.date,
        );

        let allocation = strategy.run(&snapshot);
        sink.record(date, &allocation)?;
    }

    Ok(())
}

/// The optional model-portfolio and fundamental series referenced by the
/// `[replay]` section, loaded in full and revealed date by date during the
/// replay.
#[derive(Default)]
struct SideTables {
    earnings: HashMap<String, Vec<EarningsSurprise>>,
    estimates: HashMap<String, Vec<AnalystEstimate>>,
    valuations: HashMap<String, Vec<DcfValuation>>,
    model_portfolios: HashMap<String, Vec<ModelAllocation>>,
}

/// Load the side tables. Missing files for a symbol simply leave that
/// series absent.
fn load_side_tables(
    config: &dyn ConfigSource,
    symbols: &[String],
) -> Result<SideTables, SignallocError> {
    let mut tables = SideTables::default();

    if let Some(model_file) = config.get_string("replay", "model_file") {
        let provider = config
            .get_string("strategy", "provider")
            .unwrap_or_else(|| "model".to_string());
        let records = csv_tables::load_model_allocations(Path::new(&model_file))?;
        tables.model_portfolios.insert(provider, records);
    }

    if let Some(dir) = config.get_string("replay", "fundamentals_dir") {
        let dir = PathBuf::from(dir);
        for symbol in symbols {
            let earnings = dir.join(format!("{symbol}_earnings.csv"));
            if earnings.exists() {
                tables
                    .earnings
                    .insert(symbol.clone(), csv_tables::load_earnings(&earnings)?);
            }
            let estimates = dir.join(format!("{symbol}_estimates.csv"));
            if estimates.exists() {
                tables
                    .estimates
                    .insert(symbol.clone(), csv_tables::load_estimates(&estimates)?);
            }
            let valuations = dir.join(format!("{symbol}_valuations.csv"));
            if valuations.exists() {
                tables
                    .valuations
                    .insert(symbol.clone(), csv_tables::load_valuations(&valuations)?);
            }
        }
    }

    Ok(tables)
}
