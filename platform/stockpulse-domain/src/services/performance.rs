use crate::entities::performance::PerformancePoint;
use crate::error::DomainError;
use crate::repositories::price_series::PriceSeriesStore;
use crate::value_objects::instrument::Symbol;
use crate::value_objects::price_point::PricePoint;
use chrono::NaiveDate;

pub struct HistoricalPerformanceProjector<'a> {
    store: &'a dyn PriceSeriesStore,
}

impl<'a> HistoricalPerformanceProjector<'a> {
    pub fn new(store: &'a dyn PriceSeriesStore) -> Self {
        Self { store }
    }

    /// Value curve of `shares` held from the first trading day on or after `start_date`.
    ///
    /// No price data after `start_date` is an empty curve, not an error.
    pub fn historical_performance(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        shares: f64,
    ) -> Result<PerformanceCurve, DomainError> {
        if !shares.is_finite() || shares < 0.0 {
            return Err(DomainError::invalid("shares must be finite and >= 0"));
        }
        let symbol = Symbol::parse(symbol)?;
        if self.store.lookup(&symbol)?.is_none() {
            return Err(DomainError::not_found(format!("stock not found: {symbol}")));
        }
        let points = self.store.on_or_after(&symbol, start_date)?;
        Ok(PerformanceCurve { points, shares })
    }
}

/// Ascending price points plus a share count. Each [`PerformanceCurve::iter`] call walks the
/// series afresh.
#[derive(Debug, Clone)]
pub struct PerformanceCurve {
    points: Vec<PricePoint>,
    shares: f64,
}

impl PerformanceCurve {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn initial_value(&self) -> f64 {
        self.points
            .first()
            .map_or(0.0, |first| self.shares * first.close)
    }

    pub fn iter(&self) -> impl Iterator<Item = PerformancePoint> + '_ {
        let shares = self.shares;
        let initial_value = self.initial_value();
        self.points.iter().map(move |point| {
            let value = shares * point.close;
            let profit_loss = value - initial_value;
            let profit_loss_pct = if initial_value != 0.0 {
                profit_loss / initial_value * 100.0
            } else {
                0.0
            };
            PerformancePoint {
                date: point.date,
                price: point.close,
                value,
                profit_loss,
                profit_loss_pct,
            }
        })
    }

    pub fn to_vec(&self) -> Vec<PerformancePoint> {
        self.iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::HistoricalPerformanceProjector;
    use crate::test_support::{daily_series, day0, VecStore};
    use chrono::Duration;

    fn store() -> VecStore {
        VecStore::default().with_series(
            "ACME",
            daily_series(&[100.0, 110.0, 90.0, 120.0], &[1, 1, 1, 1]),
        )
    }

    #[test]
    fn curve_is_relative_to_first_close() {
        let store = store();
        let curve = HistoricalPerformanceProjector::new(&store)
            .historical_performance("acme", day0(), 2.0)
            .expect("curve");
        let points = curve.to_vec();

        assert_eq!(points.len(), 4);
        assert_eq!(points[0].value, 200.0);
        assert_eq!(points[0].profit_loss, 0.0);
        assert_eq!(points[1].profit_loss, 20.0);
        assert!((points[1].profit_loss_pct - 10.0).abs() < 1e-9);
        assert!((points[2].profit_loss_pct - (-10.0)).abs() < 1e-9);
        assert_eq!(points[3].price, 120.0);
    }

    #[test]
    fn dates_are_ascending_and_start_at_requested_day() {
        let store = store();
        let curve = HistoricalPerformanceProjector::new(&store)
            .historical_performance("ACME", day0() + Duration::days(1), 1.0)
            .expect("curve");
        let dates: Vec<_> = curve.iter().map(|p| p.date).collect();
        assert_eq!(dates.first().copied(), Some(day0() + Duration::days(1)));
        assert!(dates.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(curve.iter().next().map(|p| p.profit_loss), Some(0.0));
    }

    #[test]
    fn curve_is_restartable() {
        let store = store();
        let curve = HistoricalPerformanceProjector::new(&store)
            .historical_performance("ACME", day0(), 3.0)
            .expect("curve");
        assert_eq!(curve.to_vec(), curve.to_vec());
    }

    #[test]
    fn no_data_after_start_is_empty() {
        let store = store();
        let curve = HistoricalPerformanceProjector::new(&store)
            .historical_performance("ACME", day0() + Duration::days(30), 1.0)
            .expect("curve");
        assert!(curve.is_empty());
        assert_eq!(curve.iter().count(), 0);
    }

    #[test]
    fn zero_shares_yield_zero_percentages() {
        let store = store();
        let curve = HistoricalPerformanceProjector::new(&store)
            .historical_performance("ACME", day0(), 0.0)
            .expect("curve");
        assert!(curve.iter().all(|p| p.profit_loss_pct == 0.0));
    }

    #[test]
    fn unknown_symbol_and_negative_shares_are_rejected() {
        let store = store();
        let projector = HistoricalPerformanceProjector::new(&store);
        assert!(projector
            .historical_performance("GHOST", day0(), 1.0)
            .expect_err("unknown")
            .is_not_found());
        assert!(projector
            .historical_performance("ACME", day0(), -1.0)
            .expect_err("negative")
            .is_invalid_argument());
    }
}
