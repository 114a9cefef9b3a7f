use chrono::NaiveDate;
use std::collections::BTreeMap;
use stockpulse_domain::repositories::price_series::PriceSeriesStore;
use stockpulse_domain::value_objects::instrument::{Instrument, Symbol};
use stockpulse_domain::value_objects::price_point::PricePoint;
use stockpulse_domain::DomainError;

/// Price history held in memory, one point per date per symbol.
#[derive(Debug, Default, Clone)]
pub struct InMemoryPriceStore {
    instruments: BTreeMap<Symbol, Instrument>,
    series: BTreeMap<Symbol, BTreeMap<NaiveDate, PricePoint>>,
}

impl InMemoryPriceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_instrument(&mut self, instrument: Instrument) {
        self.series.entry(instrument.symbol.clone()).or_default();
        self.instruments.insert(instrument.symbol.clone(), instrument);
    }

    /// Adds points for `symbol`, registering it if unknown. A later point for an existing date
    /// replaces the earlier one.
    pub fn insert_points(&mut self, symbol: &Symbol, points: impl IntoIterator<Item = PricePoint>) {
        self.instruments
            .entry(symbol.clone())
            .or_insert_with(|| Instrument::bare(symbol.clone()));
        let series = self.series.entry(symbol.clone()).or_default();
        for point in points {
            series.insert(point.date, point);
        }
    }

    pub fn with_points(
        mut self,
        symbol: &str,
        points: Vec<PricePoint>,
    ) -> Result<Self, DomainError> {
        let symbol = Symbol::parse(symbol)?;
        self.insert_points(&symbol, points);
        Ok(self)
    }

    pub fn symbols(&self) -> impl Iterator<Item = &Symbol> {
        self.instruments.keys()
    }

    pub fn series_len(&self, symbol: &Symbol) -> usize {
        self.series.get(symbol).map_or(0, BTreeMap::len)
    }

    pub fn first_and_last(&self, symbol: &Symbol) -> Option<(NaiveDate, NaiveDate)> {
        let series = self.series.get(symbol)?;
        let first = *series.keys().next()?;
        let last = *series.keys().next_back()?;
        Some((first, last))
    }

    fn series(&self, symbol: &Symbol) -> Option<&BTreeMap<NaiveDate, PricePoint>> {
        self.series.get(symbol)
    }
}

impl PriceSeriesStore for InMemoryPriceStore {
    fn lookup(&self, symbol: &Symbol) -> Result<Option<Instrument>, DomainError> {
        Ok(self.instruments.get(symbol).cloned())
    }

    fn latest_n(&self, symbol: &Symbol, n: usize) -> Result<Vec<PricePoint>, DomainError> {
        Ok(self
            .series(symbol)
            .map(|series| series.values().rev().take(n).cloned().collect())
            .unwrap_or_default())
    }

    fn on_or_after(
        &self,
        symbol: &Symbol,
        from: NaiveDate,
    ) -> Result<Vec<PricePoint>, DomainError> {
        Ok(self
            .series(symbol)
            .map(|series| series.range(from..).map(|(_, p)| p.clone()).collect())
            .unwrap_or_default())
    }

    fn on_or_before(
        &self,
        symbol: &Symbol,
        until: NaiveDate,
    ) -> Result<Option<PricePoint>, DomainError> {
        Ok(self
            .series(symbol)
            .and_then(|series| series.range(..=until).next_back().map(|(_, p)| p.clone())))
    }
}
