//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{debug, info};

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::config_validation::{
    NumericKind, ValuationSettings, indicator_specs, numeric_kind, validate_config,
    valuation_settings,
};
use crate::domain::context::IndicatorContext;
use crate::domain::error::BarstreamError;
use crate::domain::metrics::Metrics;
use crate::domain::num::{DecimalFactory, DoubleFactory, Num, NumFactory};
use crate::domain::position::{HoldingCostModel, TransactionCostModel};
use crate::domain::record::TradingRecord;
use crate::domain::valuation::{CashFlow, RealizedCashFlow, Returns};
use crate::ports::data_port::DataPort;

#[derive(Parser, Debug)]
#[command(name = "barstream", about = "Streaming indicators and trade valuation over bar data")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Stream bars through the configured indicators and print one CSV row per bar
    Indicators {
        #[arg(short, long)]
        bars: PathBuf,
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Value a list of positions over the bars
    Valuation {
        #[arg(short, long)]
        bars: PathBuf,
        #[arg(short, long)]
        positions: PathBuf,
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    let result = match cli.command {
        Command::Indicators { bars, config } => run_indicators(&bars, &config),
        Command::Valuation {
            bars,
            positions,
            config,
        } => run_valuation(&bars, &positions, config.as_deref()),
        Command::Validate { config } => run_validate(&config),
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, BarstreamError> {
    info!(path = %path.display(), "loading config");
    FileConfigAdapter::from_file(path)
}

fn run_indicators(bars_path: &Path, config_path: &Path) -> Result<(), BarstreamError> {
    let config = load_config(config_path)?;
    let kind = numeric_kind(&config)?;
    let specs = indicator_specs(&config)?;
    let data = CsvAdapter::new(bars_path);
    let stdout = io::stdout().lock();

    let rows = match kind {
        NumericKind::Double => stream_indicators(&data, &specs, DoubleFactory, stdout)?,
        NumericKind::Decimal => stream_indicators(&data, &specs, DecimalFactory, stdout)?,
    };
    info!(rows, numeric = %kind, "indicators written");
    Ok(())
}

fn run_valuation(
    bars_path: &Path,
    positions_path: &Path,
    config_path: Option<&Path>,
) -> Result<(), BarstreamError> {
    let (kind, settings) = match config_path {
        Some(path) => {
            let config = load_config(path)?;
            (numeric_kind(&config)?, valuation_settings(&config)?)
        }
        None => (NumericKind::default(), ValuationSettings::default()),
    };
    let data = CsvAdapter::new(bars_path).with_positions(positions_path);
    let stdout = io::stdout().lock();

    let metrics = match kind {
        NumericKind::Double => write_valuation(&data, &settings, DoubleFactory, stdout)?,
        NumericKind::Decimal => write_valuation(&data, &settings, DecimalFactory, stdout)?,
    };
    print_metrics(&metrics);
    Ok(())
}

fn run_validate(config_path: &Path) -> Result<(), BarstreamError> {
    eprintln!("Validating config: {}", config_path.display());
    let config = load_config(config_path)?;
    validate_config(&config)?;

    eprintln!("\nNumeric:     {}", numeric_kind(&config)?);
    eprintln!("Indicators:");
    for (name, spec) in indicator_specs(&config)? {
        eprintln!("  {name} = {spec}");
    }
    let settings = valuation_settings(&config)?;
    eprintln!("Valuation:   {:?} first, {} returns", settings.start_with, settings.return_type);

    eprintln!("\nConfiguration is valid.");
    Ok(())
}

fn csv_error(e: csv::Error) -> BarstreamError {
    BarstreamError::Io(io::Error::other(e))
}

/// Streams every bar of `data` through a context built from `specs` and
/// writes `end,<name>...,stable` rows to `out`. Returns the number of rows.
pub fn stream_indicators<D, F, W>(
    data: &D,
    specs: &[(String, String)],
    factory: F,
    out: W,
) -> Result<usize, BarstreamError>
where
    D: DataPort,
    F: NumFactory,
    W: Write,
{
    let series = data.load_bars(&factory)?;
    let mut context = IndicatorContext::from_specs(
        specs.iter().map(|(n, s)| (n.as_str(), s.as_str())),
        &factory,
    )?;
    debug!(indicators = context.len(), bars = series.len(), "streaming bars");

    let mut writer = csv::Writer::from_writer(out);
    let mut header = vec!["end".to_string()];
    header.extend(context.names().map(str::to_string));
    header.push("stable".to_string());
    writer.write_record(&header).map_err(csv_error)?;

    for bar in series.bars() {
        context.advance(bar);
        let mut row = vec![bar.end.to_rfc3339()];
        row.extend(context.iter().map(|(_, handle)| handle.output().to_string()));
        row.push(context.is_stable().to_string());
        writer.write_record(&row).map_err(csv_error)?;
    }
    writer.flush()?;
    Ok(series.len())
}

/// Replays the positions of `data` into a trading record, writes
/// `end,cash_flow,realized,return` rows to `out` and returns the summary
/// metrics.
pub fn write_valuation<D, F, W>(
    data: &D,
    settings: &ValuationSettings,
    factory: F,
    out: W,
) -> Result<Metrics, BarstreamError>
where
    D: DataPort,
    F: NumFactory,
    W: Write,
{
    let series = data.load_bars(&factory)?;
    let spans = data.load_positions()?;
    let mut record = build_record(settings, &factory)?;
    record.replay(&series, &spans, &factory)?;
    info!(
        bars = series.len(),
        positions = record.position_count(),
        open = !record.is_closed(),
        "valuing record"
    );

    let cash_flow = CashFlow::new(&series, &record, factory);
    let realized = RealizedCashFlow::new(&series, &record, factory);
    let returns = Returns::new(&series, &record, settings.return_type, factory);

    let mut writer = csv::Writer::from_writer(out);
    writer
        .write_record(["end", "cash_flow", "realized", "return"])
        .map_err(csv_error)?;
    for bar in series.bars() {
        writer
            .write_record([
                bar.end.to_rfc3339(),
                cash_flow.value_at(bar.end).to_string(),
                realized.value_at(bar.end).to_string(),
                returns.value_at(bar.end).to_string(),
            ])
            .map_err(csv_error)?;
    }
    writer.flush()?;

    Ok(Metrics::compute(&series, &record, &cash_flow, &returns, factory))
}

/// Trading record with the cost models described by `settings`.
pub fn build_record<F: NumFactory>(
    settings: &ValuationSettings,
    factory: &F,
) -> Result<TradingRecord<F::Num>, BarstreamError> {
    let fee = factory.value_of(settings.transaction_fee);
    let transaction = if fee.is_zero() {
        TransactionCostModel::Zero
    } else {
        TransactionCostModel::linear(fee)?
    };
    let borrowing = factory.value_of(settings.borrowing_fee);
    let holding = if borrowing.is_zero() {
        HoldingCostModel::Zero
    } else {
        HoldingCostModel::linear_borrowing(borrowing)?
    };
    Ok(TradingRecord::new(settings.start_with, transaction, holding))
}

fn print_metrics(metrics: &Metrics) {
    eprintln!("\n=== Valuation Summary ===");
    eprintln!("Gross Return:     {:.4}", metrics.gross_return);
    eprintln!("Max Drawdown:     -{:.1}%", metrics.max_drawdown * 100.0);
    eprintln!("Drawdown Bars:    {}", metrics.max_drawdown_duration);
    eprintln!("Sharpe Ratio:     {:.2}", metrics.sharpe_ratio);
    eprintln!("Sortino Ratio:    {:.2}", metrics.sortino_ratio);
    eprintln!("Positions:        {}", metrics.positions);
    eprintln!(
        "Won/Lost/Even:    {}/{}/{}",
        metrics.positions_won, metrics.positions_lost, metrics.positions_breakeven
    );
    eprintln!("Win Rate:         {:.1}%", metrics.win_rate * 100.0);
    eprintln!("Avg Holding Bars: {:.1}", metrics.average_holding_bars);
}
