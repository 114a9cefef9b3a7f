use chrono::NaiveDate;
use std::time::Instant;
use stockpulse_domain::entities::simulation::{ComparisonResult, SimulationResult};
use stockpulse_domain::repositories::price_series::PriceSeriesStore;
use stockpulse_domain::services::simulator::InvestmentSimulator;
use tracing::info_span;

#[derive(Debug, Clone)]
pub struct SimulationRequest {
    pub amount: f64,
    pub symbol: String,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone)]
pub struct ComparisonRequest {
    pub amount: f64,
    pub symbols: Vec<String>,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
}

fn simulator<'a>(
    store: &'a dyn PriceSeriesStore,
    today: Option<NaiveDate>,
) -> InvestmentSimulator<'a> {
    let simulator = InvestmentSimulator::new(store);
    match today {
        Some(today) => simulator.with_today(today),
        None => simulator,
    }
}

/// `today` overrides the wall-clock date used to reject future start dates.
pub fn run_simulation(
    request: &SimulationRequest,
    store: &dyn PriceSeriesStore,
    today: Option<NaiveDate>,
) -> Result<SimulationResult, String> {
    let _span = info_span!(
        "simulate",
        symbol = %request.symbol,
        amount = request.amount,
        start = %request.start_date
    )
    .entered();

    let result = simulator(store, today)
        .simulate(
            request.amount,
            &request.symbol,
            request.start_date,
            request.end_date,
        )
        .map_err(|err| err.to_string())?;

    tracing::info!(
        symbol = %result.symbol,
        shares = result.shares,
        profit_loss_pct = result.profit_loss_pct,
        days_held = result.days_held,
        "simulation complete"
    );
    Ok(result)
}

pub fn run_comparison(
    request: &ComparisonRequest,
    store: &dyn PriceSeriesStore,
    parallelism: usize,
    today: Option<NaiveDate>,
) -> Result<ComparisonResult, String> {
    let _span = info_span!(
        "compare",
        symbols = request.symbols.len(),
        amount = request.amount,
        start = %request.start_date
    )
    .entered();
    let stage_start = Instant::now();

    let comparison = simulator(store, today)
        .with_parallelism(parallelism)
        .compare_multiple(
            request.amount,
            &request.symbols,
            request.start_date,
            request.end_date,
        )
        .map_err(|err| err.to_string())?;

    metrics::histogram!("stockpulse.compare.duration_ms")
        .record(stage_start.elapsed().as_millis() as f64);
    tracing::info!(
        succeeded = comparison.results.len(),
        failed = comparison.errors.len(),
        "comparison complete"
    );
    Ok(comparison)
}
