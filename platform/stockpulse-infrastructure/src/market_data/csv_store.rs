use super::memory::InMemoryPriceStore;
use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use stockpulse_domain::repositories::price_series::PriceSeriesStore;
use stockpulse_domain::value_objects::instrument::{Instrument, Symbol};
use stockpulse_domain::value_objects::price_point::PricePoint;
use stockpulse_domain::DomainError;

#[derive(Debug, Deserialize)]
struct PriceRecord {
    date: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
}

#[derive(Debug, Deserialize)]
struct InstrumentRecord {
    symbol: String,
    name: Option<String>,
    exchange: Option<String>,
    sector: Option<String>,
}

/// Row-level quality counters for one price file.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SeriesReport {
    pub rows: usize,
    pub duplicates: usize,
    pub out_of_order: usize,
    pub invalid_close: usize,
    pub invalid_volume: usize,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
}

/// Reads `date,open,high,low,close,volume` rows, oldest first.
///
/// Rows with a non-positive close or negative volume are dropped; a repeated date keeps the
/// last row.
pub fn load_series_csv(path: &Path) -> Result<(Vec<PricePoint>, SeriesReport), String> {
    let file = File::open(path)
        .map_err(|err| format!("failed to open price CSV {}: {}", path.display(), err))?;
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(file);

    let mut by_date: BTreeMap<NaiveDate, PricePoint> = BTreeMap::new();
    let mut report = SeriesReport::default();
    let mut last_seen: Option<NaiveDate> = None;

    for result in reader.deserialize::<PriceRecord>() {
        let record = result.map_err(|err| {
            format!("failed to parse CSV row in {}: {}", path.display(), err)
        })?;
        let date = parse_date(&record.date)?;

        if !record.close.is_finite() || record.close <= 0.0 {
            report.invalid_close += 1;
            continue;
        }
        if !record.volume.is_finite() || record.volume < 0.0 {
            report.invalid_volume += 1;
            continue;
        }

        if let Some(prev) = last_seen {
            if date < prev {
                report.out_of_order += 1;
            }
        }
        last_seen = Some(date);

        let point = PricePoint {
            date,
            open: record.open,
            high: record.high,
            low: record.low,
            close: record.close,
            volume: record.volume.round() as u64,
        };
        if by_date.insert(date, point).is_some() {
            report.duplicates += 1;
        }
    }

    report.rows = by_date.len();
    report.first_date = by_date.keys().next().copied();
    report.last_date = by_date.keys().next_back().copied();
    Ok((by_date.into_values().collect(), report))
}

fn parse_date(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|err| format!("invalid date '{value}' (expected YYYY-MM-DD): {err}"))
}

fn load_instruments_csv(path: &Path) -> Result<Vec<Instrument>, String> {
    let file = File::open(path)
        .map_err(|err| format!("failed to open instruments CSV {}: {}", path.display(), err))?;
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(file);
    let mut instruments = Vec::new();
    for result in reader.deserialize::<InstrumentRecord>() {
        let record = result.map_err(|err| {
            format!("failed to parse instruments row in {}: {}", path.display(), err)
        })?;
        let symbol = Symbol::parse(&record.symbol)
            .map_err(|err| format!("invalid instrument symbol '{}': {err}", record.symbol))?;
        instruments.push(Instrument {
            symbol,
            name: record.name.filter(|v| !v.is_empty()),
            exchange: record.exchange.filter(|v| !v.is_empty()),
            sector: record.sector.filter(|v| !v.is_empty()),
        });
    }
    Ok(instruments)
}

/// Directory of `<SYMBOL>.csv` files loaded once into memory.
///
/// A file that cannot be parsed only poisons its own symbol: the instrument stays known and
/// every history read for it returns [`DomainError::Store`].
#[derive(Debug, Clone)]
pub struct CsvPriceStore {
    data_dir: PathBuf,
    inner: InMemoryPriceStore,
    reports: BTreeMap<Symbol, SeriesReport>,
    load_errors: BTreeMap<Symbol, String>,
    skipped_files: Vec<PathBuf>,
}

impl CsvPriceStore {
    pub fn open(data_dir: &Path, instruments_csv: Option<&Path>) -> Result<Self, String> {
        let entries = fs::read_dir(data_dir).map_err(|err| {
            format!("failed to read price directory {}: {}", data_dir.display(), err)
        })?;

        let mut inner = InMemoryPriceStore::new();
        let mut reports = BTreeMap::new();
        let mut load_errors = BTreeMap::new();
        let mut skipped_files = Vec::new();

        if let Some(path) = instruments_csv {
            for instrument in load_instruments_csv(path)? {
                inner.insert_instrument(instrument);
            }
        }

        let mut files: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| is_price_file(path))
            .collect();
        files.sort();

        for path in files {
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let symbol = match Symbol::parse(stem) {
                Ok(symbol) => symbol,
                Err(err) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %err,
                        "skipping price file with invalid symbol name"
                    );
                    skipped_files.push(path);
                    continue;
                }
            };
            let (points, report) = match load_series_csv(&path) {
                Ok(loaded) => loaded,
                Err(err) => {
                    tracing::warn!(symbol = %symbol, error = %err, "price file unreadable");
                    inner.insert_points(&symbol, Vec::new());
                    load_errors.insert(symbol, err);
                    continue;
                }
            };
            if report.invalid_close > 0 || report.invalid_volume > 0 || report.duplicates > 0 {
                tracing::warn!(
                    symbol = %symbol,
                    invalid_close = report.invalid_close,
                    invalid_volume = report.invalid_volume,
                    duplicates = report.duplicates,
                    "price file contained unusable rows"
                );
            }
            inner.insert_points(&symbol, points);
            reports.insert(symbol, report);
        }

        tracing::info!(
            data_dir = %data_dir.display(),
            instruments = reports.len(),
            unreadable = load_errors.len(),
            skipped_files = skipped_files.len(),
            "price store loaded"
        );
        metrics::gauge!("stockpulse.store.instruments").set(reports.len() as f64);
        metrics::gauge!("stockpulse.store.unreadable").set(load_errors.len() as f64);

        Ok(Self {
            data_dir: data_dir.to_path_buf(),
            inner,
            reports,
            load_errors,
            skipped_files,
        })
    }

    /// Parse error of the symbol's price file, if it failed to load.
    pub fn load_error(&self, symbol: &Symbol) -> Option<&str> {
        self.load_errors.get(symbol).map(String::as_str)
    }

    /// Price files whose name is not a valid symbol.
    pub fn skipped_files(&self) -> &[PathBuf] {
        &self.skipped_files
    }

    fn ensure_readable(&self, symbol: &Symbol) -> Result<(), DomainError> {
        match self.load_errors.get(symbol) {
            Some(err) => Err(DomainError::Store(err.clone())),
            None => Ok(()),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn report(&self, symbol: &Symbol) -> Option<&SeriesReport> {
        self.reports.get(symbol)
    }

    pub fn symbols(&self) -> impl Iterator<Item = &Symbol> {
        self.inner.symbols()
    }
}

fn is_price_file(path: &Path) -> bool {
    let is_csv = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
    let is_metadata = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .is_some_and(|stem| stem.eq_ignore_ascii_case("instruments"));
    path.is_file() && is_csv && !is_metadata
}

impl PriceSeriesStore for CsvPriceStore {
    fn lookup(&self, symbol: &Symbol) -> Result<Option<Instrument>, DomainError> {
        self.inner.lookup(symbol)
    }

    fn latest_n(&self, symbol: &Symbol, n: usize) -> Result<Vec<PricePoint>, DomainError> {
        self.ensure_readable(symbol)?;
        self.inner.latest_n(symbol, n)
    }

    fn on_or_after(
        &self,
        symbol: &Symbol,
        from: NaiveDate,
    ) -> Result<Vec<PricePoint>, DomainError> {
        self.ensure_readable(symbol)?;
        self.inner.on_or_after(symbol, from)
    }

    fn on_or_before(
        &self,
        symbol: &Symbol,
        until: NaiveDate,
    ) -> Result<Option<PricePoint>, DomainError> {
        self.ensure_readable(symbol)?;
        self.inner.on_or_before(symbol, until)
    }
}
