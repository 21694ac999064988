//! CLI definition and dispatch.

use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::cache::CachingDataPort;
use crate::adapters::csv_adapter::{load_universe, CsvAdapter};
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::markdown_report::tables::{format_metric, sign_label};
use crate::adapters::markdown_report::MarkdownReportAdapter;
use crate::domain::config_validation::{parse_date, validate_dashboard_config};
use crate::domain::dashboard::{
    fundamentals_pass, price_pass, FundamentalsDashboard, PriceDashboard, Selection,
};
use crate::domain::dates::DateRange;
use crate::domain::error::DashboardError;
use crate::domain::performance::{format_percent, Sign, DEFAULT_INITIAL_PER_SYMBOL};
use crate::domain::symbol::Symbol;
use crate::domain::universe::{
    parse_delimiter, parse_symbol_list, Universe, UniverseSpec, DEFAULT_CODE_COLUMN,
    DEFAULT_DELIMITER, DEFAULT_MARKET_SUFFIX,
};
use crate::domain::valuation::MetricKind;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::MarketDataPort;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(name = "equidash", about = "Equity price and fundamentals dashboards")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// Symbol and date filters. Each flag overrides the `[dashboard]` config value.
#[derive(Args, Debug, Clone, Default, PartialEq)]
pub struct SelectionArgs {
    /// Comma-separated symbols; bare codes get the market suffix
    #[arg(long)]
    pub symbols: Option<String>,
    /// First date shown (YYYY-MM-DD or RFC 3339)
    #[arg(long)]
    pub start: Option<String>,
    /// Last date shown (YYYY-MM-DD or RFC 3339)
    #[arg(long)]
    pub end: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Price evolution and equal-weight portfolio performance
    Prices {
        #[arg(short, long)]
        config: PathBuf,
        #[command(flatten)]
        selection: SelectionArgs,
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long)]
        no_charts: bool,
    },
    /// P/E, dividend yield, EBITDA and Graham value per symbol
    Fundamentals {
        #[arg(short, long)]
        config: PathBuf,
        #[command(flatten)]
        selection: SelectionArgs,
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long)]
        no_charts: bool,
    },
    /// Print the normalized ticker universe
    ListSymbols {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Show loaded data range for symbol(s)
    Info {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        symbols: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Provider {
    Csv(PathBuf),
    Yahoo,
}

/// Everything a pass needs from the config file.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardSettings {
    pub universe_path: PathBuf,
    pub universe_spec: UniverseSpec,
    pub provider: Provider,
    pub fetch_range: DateRange,
    pub timeout_secs: u64,
    pub initial_per_symbol: f64,
    pub default_selection: SelectionArgs,
    pub output: Option<PathBuf>,
    pub charts: bool,
}

pub fn run(cli: Cli) -> ExitCode {
    let result = match cli.command {
        Command::Prices {
            config,
            selection,
            output,
            no_charts,
        } => run_prices(&config, &selection, output.as_deref(), no_charts),
        Command::Fundamentals {
            config,
            selection,
            output,
            no_charts,
        } => run_fundamentals(&config, &selection, output.as_deref(), no_charts),
        Command::ListSymbols { config } => run_list_symbols(&config),
        Command::Info { config, symbols } => run_info(&config, symbols.as_deref()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, DashboardError> {
    eprintln!("Loading config from {}", path.display());
    FileConfigAdapter::from_file(path)
}

pub fn build_settings(config: &dyn ConfigPort) -> Result<DashboardSettings, DashboardError> {
    let universe_path = config
        .get_string("universe", "path")
        .map(PathBuf::from)
        .ok_or_else(|| DashboardError::ConfigMissing {
            section: "universe".into(),
            key: "path".into(),
        })?;

    let delimiter = match config.get_string("universe", "delimiter") {
        Some(value) => parse_delimiter(&value).ok_or_else(|| DashboardError::ConfigInvalid {
            section: "universe".into(),
            key: "delimiter".into(),
            reason: format!("unrecognized delimiter '{}'", value),
        })?,
        None => DEFAULT_DELIMITER,
    };
    let universe_spec = UniverseSpec {
        column: config
            .get_string("universe", "column")
            .unwrap_or_else(|| DEFAULT_CODE_COLUMN.to_string()),
        suffix: config
            .get_string("universe", "suffix")
            .unwrap_or_else(|| DEFAULT_MARKET_SUFFIX.to_string()),
        delimiter,
    };

    let provider = match config
        .get_string("data", "provider")
        .unwrap_or_else(|| "csv".to_string())
        .to_lowercase()
        .as_str()
    {
        "yahoo" => Provider::Yahoo,
        "csv" => Provider::Csv(config.get_string("data", "path").map(PathBuf::from).ok_or_else(
            || DashboardError::ConfigMissing {
                section: "data".into(),
                key: "path".into(),
            },
        )?),
        other => {
            return Err(DashboardError::ConfigInvalid {
                section: "data".into(),
                key: "provider".into(),
                reason: format!("unknown provider '{}'", other),
            })
        }
    };

    let start_date = config.get_string("data", "start_date");
    let end_date = config.get_string("data", "end_date");
    let start = parse_date("data", start_date.as_deref(), "start_date")?;
    let end = parse_date("data", end_date.as_deref(), "end_date")?;
    let fetch_range = DateRange::new(start, end)?;

    Ok(DashboardSettings {
        universe_path,
        universe_spec,
        provider,
        fetch_range,
        timeout_secs: config.get_int("data", "timeout_secs", 30).max(1) as u64,
        initial_per_symbol: config.get_double(
            "portfolio",
            "initial_per_symbol",
            DEFAULT_INITIAL_PER_SYMBOL,
        ),
        default_selection: SelectionArgs {
            symbols: config.get_string("dashboard", "symbols"),
            start: config.get_string("dashboard", "start"),
            end: config.get_string("dashboard", "end"),
        },
        output: config.get_string("report", "output").map(PathBuf::from),
        charts: config.get_bool("report", "charts", true),
    })
}

fn parse_selection_date(value: &str, key: &str) -> Result<chrono::NaiveDate, DashboardError> {
    parse_date("dashboard", Some(value), key)
}

/// Merge CLI flags over config defaults into a [`Selection`].
///
/// A lone start or end is paired with the other end of the fetch range.
pub fn resolve_selection_args(
    args: &SelectionArgs,
    settings: &DashboardSettings,
) -> Result<Selection, DashboardError> {
    let defaults = &settings.default_selection;

    let symbols = match args.symbols.as_ref().or(defaults.symbols.as_ref()) {
        Some(list) => parse_symbol_list(list, &settings.universe_spec.suffix).map_err(|e| {
            DashboardError::ConfigInvalid {
                section: "dashboard".into(),
                key: "symbols".into(),
                reason: e.to_string(),
            }
        })?,
        None => Vec::new(),
    };

    let start = args
        .start
        .as_ref()
        .or(defaults.start.as_ref())
        .map(|s| parse_selection_date(s, "start"))
        .transpose()?;
    let end = args
        .end
        .as_ref()
        .or(defaults.end.as_ref())
        .map(|s| parse_selection_date(s, "end"))
        .transpose()?;

    let range = match (start, end) {
        (None, None) => None,
        (start, end) => Some(DateRange::new(
            start.unwrap_or(settings.fetch_range.start()),
            end.unwrap_or(settings.fetch_range.end()),
        )?),
    };

    Ok(Selection { symbols, range })
}

pub fn open_data_port(
    settings: &DashboardSettings,
) -> Result<Box<dyn MarketDataPort>, DashboardError> {
    match &settings.provider {
        Provider::Csv(path) => {
            log::info!("reading market data from {}", path.display());
            Ok(Box::new(CachingDataPort::new(CsvAdapter::new(path.clone()))))
        }
        #[cfg(feature = "yahoo")]
        Provider::Yahoo => {
            use crate::adapters::yahoo_adapter::YahooAdapter;
            let adapter = YahooAdapter::new(std::time::Duration::from_secs(settings.timeout_secs))?;
            Ok(Box::new(CachingDataPort::new(adapter)))
        }
        #[cfg(not(feature = "yahoo"))]
        Provider::Yahoo => Err(DashboardError::ConfigInvalid {
            section: "data".into(),
            key: "provider".into(),
            reason: "yahoo provider requires the `yahoo` feature".into(),
        }),
    }
}

/// Config, universe, selection and gateway for one pass.
struct Prepared {
    settings: DashboardSettings,
    universe: Universe,
    selection: Selection,
    port: Box<dyn MarketDataPort>,
}

fn prepare(config_path: &Path, args: &SelectionArgs) -> Result<Prepared, DashboardError> {
    // Stage 1: Load and validate config
    let config = load_config(config_path)?;
    validate_dashboard_config(&config)?;
    let settings = build_settings(&config)?;

    // Stage 2: Load ticker universe
    let universe = load_universe(&settings.universe_path, &settings.universe_spec)?;
    eprintln!(
        "Loaded {} symbols from {}",
        universe.count(),
        settings.universe_path.display()
    );

    // Stage 3: Resolve selection
    let selection = resolve_selection_args(args, &settings)?;
    for symbol in &selection.symbols {
        if !universe.contains(symbol) {
            log::warn!("{symbol} is not in the ticker universe");
        }
    }

    // Stage 4: Open gateway
    let port = open_data_port(&settings)?;

    Ok(Prepared {
        settings,
        universe,
        selection,
        port,
    })
}

fn report_adapter(settings: &DashboardSettings, no_charts: bool) -> MarkdownReportAdapter {
    if no_charts || !settings.charts {
        MarkdownReportAdapter::without_charts()
    } else {
        MarkdownReportAdapter::new()
    }
}

fn output_path(flag: Option<&Path>, settings: &DashboardSettings, default: &str) -> PathBuf {
    flag.map(Path::to_path_buf)
        .or_else(|| settings.output.clone())
        .unwrap_or_else(|| PathBuf::from(default))
}

pub fn run_prices(
    config_path: &Path,
    args: &SelectionArgs,
    output: Option<&Path>,
    no_charts: bool,
) -> Result<(), DashboardError> {
    let prepared = prepare(config_path, args)?;

    // Stage 5: Rendering pass
    let dashboard = price_pass(
        prepared.port.as_ref(),
        &prepared.universe.symbols,
        &prepared.settings.fetch_range,
        &prepared.selection,
        prepared.settings.initial_per_symbol,
    )?;

    // Stage 6: Console summary
    print_price_summary(&dashboard);

    // Stage 7: Report
    let output = output_path(output, &prepared.settings, "prices.md");
    report_adapter(&prepared.settings, no_charts).write_prices(&dashboard, &output)?;
    eprintln!("\nReport written to: {}", output.display());
    Ok(())
}

pub fn run_fundamentals(
    config_path: &Path,
    args: &SelectionArgs,
    output: Option<&Path>,
    no_charts: bool,
) -> Result<(), DashboardError> {
    let prepared = prepare(config_path, args)?;

    let dashboard = fundamentals_pass(
        prepared.port.as_ref(),
        &prepared.universe.symbols,
        &prepared.settings.fetch_range,
        &prepared.selection,
    )?;

    print_fundamentals_summary(&dashboard);

    let output = output_path(output, &prepared.settings, "fundamentals.md");
    report_adapter(&prepared.settings, no_charts).write_fundamentals(&dashboard, &output)?;
    eprintln!("\nReport written to: {}", output.display());
    Ok(())
}

fn print_price_summary(dashboard: &PriceDashboard) {
    eprintln!(
        "\n=== Performance ({}, {} symbols) ===",
        dashboard.range,
        dashboard.symbols.len()
    );
    for (symbol, r) in dashboard.performance.per_symbol.iter() {
        match r {
            Some(r) => eprintln!(
                "  {}:  {} {}",
                symbol,
                format_percent(*r),
                sign_label(Sign::of(*r))
            ),
            None => eprintln!("  {}:  N/A", symbol),
        }
    }
    match dashboard.performance.aggregate {
        Some(r) => eprintln!("Portfolio:  {} {}", format_percent(r), sign_label(Sign::of(r))),
        None => eprintln!("Portfolio:  N/A"),
    }
}

fn print_fundamentals_summary(dashboard: &FundamentalsDashboard) {
    for kind in MetricKind::ALL {
        eprintln!("\n=== {} ===", kind);
        for (symbol, value) in dashboard.metric_cards(kind).iter() {
            eprintln!("  {}:  {}", symbol, format_metric(kind, *value));
        }
    }
}

pub fn run_list_symbols(config_path: &Path) -> Result<(), DashboardError> {
    let config = load_config(config_path)?;
    let settings = build_settings(&config)?;
    let universe = load_universe(&settings.universe_path, &settings.universe_spec)?;

    for symbol in &universe.symbols {
        println!("{}", symbol);
    }
    eprintln!("{} symbols found", universe.count());
    Ok(())
}

pub fn run_info(config_path: &Path, symbols: Option<&str>) -> Result<(), DashboardError> {
    let config = load_config(config_path)?;
    validate_dashboard_config(&config)?;
    let settings = build_settings(&config)?;

    let requested: Vec<Symbol> = match symbols {
        Some(list) => parse_symbol_list(list, &settings.universe_spec.suffix).map_err(|e| {
            DashboardError::ConfigInvalid {
                section: "dashboard".into(),
                key: "symbols".into(),
                reason: e.to_string(),
            }
        })?,
        None => load_universe(&settings.universe_path, &settings.universe_spec)?.symbols,
    };

    let port = open_data_port(&settings)?;
    let table = port.fetch_price_history(
        &requested,
        settings.fetch_range.start(),
        settings.fetch_range.end(),
    );

    for symbol in &requested {
        match table.get(symbol).and_then(|s| s.bounds().map(|b| (b, s.len()))) {
            Some((bounds, count)) => println!("{}: {} ({} observations)", symbol, bounds, count),
            None => println!("{}: no data", symbol),
        }
    }
    eprintln!(
        "{} of {} symbols have data in {}",
        table.len(),
        requested.len(),
        settings.fetch_range
    );
    Ok(())
}
