use crate::error::DomainError;
use crate::repositories::price_series::PriceSeriesStore;
use crate::value_objects::instrument::{Instrument, Symbol};
use crate::value_objects::price_point::PricePoint;
use chrono::{Duration, NaiveDate};
use std::collections::HashMap;

pub fn day0() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).expect("valid date")
}

/// Consecutive calendar days from `day0`, oldest first.
pub fn daily_series(closes: &[f64], volumes: &[u64]) -> Vec<PricePoint> {
    closes
        .iter()
        .zip(volumes)
        .enumerate()
        .map(|(i, (close, volume))| {
            PricePoint::flat(day0() + Duration::days(i as i64), *close, *volume)
        })
        .collect()
}

/// Oldest-first series per symbol.
#[derive(Default)]
pub struct VecStore {
    series: HashMap<String, Vec<PricePoint>>,
}

impl VecStore {
    pub fn with_series(mut self, symbol: &str, points: Vec<PricePoint>) -> Self {
        self.series.insert(symbol.to_string(), points);
        self
    }

    fn points(&self, symbol: &Symbol) -> &[PricePoint] {
        self.series
            .get(symbol.as_str())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

impl PriceSeriesStore for VecStore {
    fn lookup(&self, symbol: &Symbol) -> Result<Option<Instrument>, DomainError> {
        Ok(self
            .series
            .contains_key(symbol.as_str())
            .then(|| Instrument::bare(symbol.clone())))
    }

    fn latest_n(&self, symbol: &Symbol, n: usize) -> Result<Vec<PricePoint>, DomainError> {
        Ok(self.points(symbol).iter().rev().take(n).cloned().collect())
    }

    fn on_or_after(
        &self,
        symbol: &Symbol,
        from: NaiveDate,
    ) -> Result<Vec<PricePoint>, DomainError> {
        Ok(self
            .points(symbol)
            .iter()
            .filter(|p| p.date >= from)
            .cloned()
            .collect())
    }

    fn on_or_before(
        &self,
        symbol: &Symbol,
        until: NaiveDate,
    ) -> Result<Option<PricePoint>, DomainError> {
        Ok(self
            .points(symbol)
            .iter()
            .rev()
            .find(|p| p.date <= until)
            .cloned())
    }
}
