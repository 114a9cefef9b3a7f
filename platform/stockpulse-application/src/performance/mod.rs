use chrono::NaiveDate;
use stockpulse_domain::entities::performance::PerformancePoint;
use stockpulse_domain::repositories::price_series::PriceSeriesStore;
use stockpulse_domain::services::performance::HistoricalPerformanceProjector;
use tracing::info_span;

pub fn run_historical_performance(
    symbol: &str,
    start_date: NaiveDate,
    shares: f64,
    store: &dyn PriceSeriesStore,
) -> Result<Vec<PerformancePoint>, String> {
    let _span = info_span!(
        "historical_performance",
        symbol = %symbol,
        start = %start_date,
        shares
    )
    .entered();

    let curve = HistoricalPerformanceProjector::new(store)
        .historical_performance(symbol, start_date, shares)
        .map_err(|err| err.to_string())?;
    tracing::debug!(points = curve.len(), "performance curve built");
    Ok(curve.to_vec())
}
