use crate::infra::{build_alert_sink, build_price_store};
use chrono::NaiveDate;
use std::path::Path;
use stockpulse_application::config::{to_toml_pretty, Config};
use stockpulse_application::meta::{engine_name, engine_version};
use stockpulse_application::performance::run_historical_performance;
use stockpulse_application::scanning::{scan_watchlist, ScanOptions};
use stockpulse_application::simulation::{
    run_comparison, run_simulation, ComparisonRequest, SimulationRequest,
};
use stockpulse_domain::value_objects::instrument::Symbol;

#[derive(Debug, Clone)]
pub enum Command {
    Scan {
        /// Overrides `scan.watchlist` when non-empty.
        symbols: Vec<String>,
        no_alerts: bool,
    },
    Simulate {
        amount: f64,
        symbol: String,
        start: String,
        end: Option<String>,
    },
    Compare {
        amount: f64,
        symbols: Vec<String>,
        start: String,
        end: Option<String>,
    },
    History {
        symbol: String,
        start: String,
        shares: f64,
    },
    Validate,
}

pub fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("invalid date '{raw}' (expected YYYY-MM-DD): {err}"))
}

fn parse_optional_date(raw: Option<&str>) -> Result<Option<NaiveDate>, String> {
    raw.map(parse_date).transpose()
}

pub fn run_command(
    command: &Command,
    config: &Config,
    config_path: &Path,
) -> Result<serde_json::Value, String> {
    match command {
        Command::Scan { symbols, no_alerts } => {
            run_scan(config, config_path, symbols, *no_alerts)
        }
        Command::Simulate {
            amount,
            symbol,
            start,
            end,
        } => {
            let store = build_price_store(config, config_path)?;
            let request = SimulationRequest {
                amount: *amount,
                symbol: symbol.clone(),
                start_date: parse_date(start)?,
                end_date: parse_optional_date(end.as_deref())?,
            };
            let result = run_simulation(&request, &store, None)?;
            Ok(serde_json::json!({
                "status": "ok",
                "mode": "simulate",
                "result": result,
            }))
        }
        Command::Compare {
            amount,
            symbols,
            start,
            end,
        } => {
            let store = build_price_store(config, config_path)?;
            let request = ComparisonRequest {
                amount: *amount,
                symbols: symbols.clone(),
                start_date: parse_date(start)?,
                end_date: parse_optional_date(end.as_deref())?,
            };
            let comparison = run_comparison(&request, &store, config.scan_parallelism(), None)?;
            Ok(serde_json::json!({
                "status": "ok",
                "mode": "compare",
                "comparison": comparison,
            }))
        }
        Command::History {
            symbol,
            start,
            shares,
        } => {
            let store = build_price_store(config, config_path)?;
            let points = run_historical_performance(symbol, parse_date(start)?, *shares, &store)?;
            Ok(serde_json::json!({
                "status": "ok",
                "mode": "history",
                "symbol": symbol.trim().to_uppercase(),
                "shares": shares,
                "points": points,
            }))
        }
        Command::Validate => run_validate(config, config_path),
    }
}

fn run_scan(
    config: &Config,
    config_path: &Path,
    overrides: &[String],
    no_alerts: bool,
) -> Result<serde_json::Value, String> {
    let symbols = if overrides.is_empty() {
        config.watchlist()?
    } else {
        overrides
            .iter()
            .map(|raw| {
                Symbol::parse(raw).map_err(|err| format!("invalid symbol '{raw}': {err}"))
            })
            .collect::<Result<Vec<_>, _>>()?
    };

    let store = build_price_store(config, config_path)?;
    let sink = if no_alerts {
        None
    } else {
        build_alert_sink(config, config_path)?
    };
    let options = ScanOptions {
        detector: config.detector_config()?,
        parallelism: config.scan_parallelism(),
        record_alerts: config.record_alerts() && !no_alerts,
    };

    let report = scan_watchlist(&symbols, &options, &store, sink.as_deref())?;
    Ok(serde_json::json!({
        "status": "ok",
        "mode": "scan",
        "report": report,
    }))
}

fn run_validate(config: &Config, config_path: &Path) -> Result<serde_json::Value, String> {
    let store = build_price_store(config, config_path)?;
    let mut symbols = config.watchlist()?;
    if symbols.is_empty() {
        symbols = store.symbols().cloned().collect();
    }

    let mut instruments = Vec::with_capacity(symbols.len());
    let mut missing = Vec::new();
    let mut unreadable = Vec::new();
    for symbol in &symbols {
        if let Some(err) = store.load_error(symbol) {
            unreadable.push(serde_json::json!({ "symbol": symbol, "error": err }));
            continue;
        }
        match store.report(symbol) {
            Some(report) => instruments.push(serde_json::json!({
                "symbol": symbol,
                "rows": report.rows,
                "first_date": report.first_date,
                "last_date": report.last_date,
                "invalid_close": report.invalid_close,
                "invalid_volume": report.invalid_volume,
                "duplicates": report.duplicates,
                "out_of_order": report.out_of_order,
            })),
            None => missing.push(symbol.to_string()),
        }
    }
    if !missing.is_empty() {
        tracing::warn!(missing = ?missing, "watchlist symbols without price history");
    }

    Ok(serde_json::json!({
        "status": "ok",
        "mode": "validate",
        "engine": engine_name(),
        "version": engine_version(),
        "data_dir": store.data_dir().display().to_string(),
        "instruments": instruments,
        "missing": missing,
        "unreadable": unreadable,
        "skipped_files": store
            .skipped_files()
            .iter()
            .map(|path| path.display().to_string())
            .collect::<Vec<_>>(),
        "config": to_toml_pretty(config)?,
    }))
}
