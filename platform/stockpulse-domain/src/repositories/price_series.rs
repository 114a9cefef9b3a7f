use crate::error::DomainError;
use crate::value_objects::instrument::{Instrument, Symbol};
use crate::value_objects::price_point::PricePoint;
use chrono::NaiveDate;

/// Read-only access to daily OHLCV history. The core never writes through this port.
///
/// Implementations must be shareable across the fan-out workers.
pub trait PriceSeriesStore: Send + Sync {
    fn lookup(&self, symbol: &Symbol) -> Result<Option<Instrument>, DomainError>;

    /// Most recent `n` points, newest first.
    fn latest_n(&self, symbol: &Symbol, n: usize) -> Result<Vec<PricePoint>, DomainError>;

    /// Every point with `date >= from`, oldest first.
    fn on_or_after(&self, symbol: &Symbol, from: NaiveDate)
        -> Result<Vec<PricePoint>, DomainError>;

    /// The latest point with `date <= until`.
    fn on_or_before(
        &self,
        symbol: &Symbol,
        until: NaiveDate,
    ) -> Result<Option<PricePoint>, DomainError>;

    fn latest(&self, symbol: &Symbol) -> Result<Option<PricePoint>, DomainError> {
        Ok(self.latest_n(symbol, 1)?.into_iter().next())
    }
}
