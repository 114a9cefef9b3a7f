use crate::entities::simulation::{
    ComparisonResult, ComparisonSummary, SimulationResult, SymbolFailure,
};
use crate::error::DomainError;
use crate::repositories::price_series::PriceSeriesStore;
use crate::services::fanout::fan_out;
use crate::value_objects::instrument::Symbol;
use chrono::{NaiveDate, Utc};

pub const MAX_COMPARE_SYMBOLS: usize = 5;
const DAYS_PER_YEAR: f64 = 365.0;

/// Buy-and-hold "what if" simulation over daily closes.
pub struct InvestmentSimulator<'a> {
    store: &'a dyn PriceSeriesStore,
    today: NaiveDate,
    parallelism: usize,
}

impl<'a> InvestmentSimulator<'a> {
    pub fn new(store: &'a dyn PriceSeriesStore) -> Self {
        Self {
            store,
            today: Utc::now().date_naive(),
            parallelism: 1,
        }
    }

    /// Pins the date used to reject future start dates.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    pub fn with_parallelism(mut self, parallelism: usize) -> Self {
        self.parallelism = parallelism.max(1);
        self
    }

    /// Buys at the first close on or after `start_date` and values at the last close on or
    /// before `end_date` (or the latest close).
    ///
    /// Shares are truncated to two decimals, but the purchase must cover at least one whole
    /// share: an `amount` below the purchase price is rejected as "amount too small", even when
    /// truncation alone would leave a fractional holding.
    pub fn simulate(
        &self,
        amount: f64,
        symbol: &str,
        start_date: NaiveDate,
        end_date: Option<NaiveDate>,
    ) -> Result<SimulationResult, DomainError> {
        validate_amount(amount)?;
        let symbol = Symbol::parse(symbol)?;
        if self.store.lookup(&symbol)?.is_none() {
            return Err(DomainError::not_found(format!("stock not found: {symbol}")));
        }
        if start_date > self.today {
            return Err(DomainError::invalid("start date cannot be in the future"));
        }
        if let Some(end) = end_date {
            if end < start_date {
                return Err(DomainError::invalid(
                    "end date cannot be before start date",
                ));
            }
        }

        let purchase = self
            .store
            .on_or_after(&symbol, start_date)?
            .into_iter()
            .next()
            .ok_or_else(|| DomainError::not_found(format!("no price data from {start_date}")))?;

        let valuation = match end_date {
            Some(end) => self.store.on_or_before(&symbol, end)?.ok_or_else(|| {
                DomainError::not_found(format!("no price data on or before {end}"))
            })?,
            None => self
                .store
                .latest(&symbol)?
                .ok_or_else(|| DomainError::not_found(format!("no price data for {symbol}")))?,
        };
        if valuation.date < purchase.date {
            return Err(DomainError::not_found(format!(
                "no price data between {start_date} and {}",
                valuation.date
            )));
        }

        let purchase_price = purchase.close;
        let valuation_price = valuation.close;
        let shares = truncate_shares(amount / purchase_price);
        if amount < purchase_price || shares <= 0.0 {
            return Err(DomainError::invalid(format!(
                "amount too small; minimum required: {purchase_price}"
            )));
        }

        let invested_amount = shares * purchase_price;
        let current_value = shares * valuation_price;
        let profit_loss = current_value - invested_amount;
        let profit_loss_pct = if invested_amount != 0.0 {
            profit_loss / invested_amount * 100.0
        } else {
            0.0
        };
        let days_held = (valuation.date - purchase.date).num_days();

        Ok(SimulationResult {
            symbol,
            requested_amount: amount,
            invested_amount,
            start_date: purchase.date,
            purchase_price,
            end_date: valuation.date,
            valuation_price,
            shares,
            current_value,
            profit_loss,
            profit_loss_pct,
            days_held,
            annualized_return: annualized_return(invested_amount, current_value, days_held),
        })
    }

    /// Simulates each symbol independently; one symbol failing never aborts the batch.
    ///
    /// Only an empty or oversized symbol list is rejected up front. Every other invalid input,
    /// including a non-positive amount, is reported per symbol in `errors`.
    pub fn compare_multiple(
        &self,
        amount: f64,
        symbols: &[String],
        start_date: NaiveDate,
        end_date: Option<NaiveDate>,
    ) -> Result<ComparisonResult, DomainError> {
        if symbols.is_empty() {
            return Err(DomainError::invalid(
                "at least one stock symbol is required",
            ));
        }
        if symbols.len() > MAX_COMPARE_SYMBOLS {
            return Err(DomainError::invalid(format!(
                "Maximum {MAX_COMPARE_SYMBOLS} stocks can be compared at once"
            )));
        }

        let outcomes = fan_out(symbols, self.parallelism, |symbol| {
            self.simulate(amount, symbol, start_date, end_date)
        });

        let mut results = Vec::with_capacity(symbols.len());
        let mut errors = Vec::new();
        for (symbol, outcome) in symbols.iter().zip(outcomes) {
            match outcome {
                Ok(result) => results.push(result),
                Err(err) => {
                    tracing::warn!(symbol = %symbol, error = %err, "simulation failed");
                    errors.push(SymbolFailure {
                        symbol: symbol.trim().to_uppercase(),
                        message: err.to_string(),
                    });
                }
            }
        }

        results.sort_by(|a, b| {
            b.profit_loss_pct
                .partial_cmp(&a.profit_loss_pct)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        let summary = ComparisonSummary::from_ranked(&results);

        Ok(ComparisonResult {
            results,
            summary,
            errors,
        })
    }
}

fn validate_amount(amount: f64) -> Result<(), DomainError> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(DomainError::invalid("amount must be greater than 0"));
    }
    Ok(())
}

/// Rounds toward zero at two decimal places.
pub fn truncate_shares(raw: f64) -> f64 {
    (raw * 100.0).trunc() / 100.0
}

/// Compound annual growth rate in percent; `0.0` for zero-length holds.
pub fn annualized_return(invested: f64, current_value: f64, days_held: i64) -> f64 {
    let years_held = days_held as f64 / DAYS_PER_YEAR;
    if years_held > 0.0 && invested > 0.0 {
        ((current_value / invested).powf(1.0 / years_held) - 1.0) * 100.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::{annualized_return, truncate_shares, InvestmentSimulator};
    use crate::test_support::{daily_series, day0, VecStore};
    use chrono::Duration;

    fn rising_store() -> VecStore {
        let closes: Vec<f64> = (0..100).map(|i| 80_000.0 + 100.0 * i as f64).collect();
        VecStore::default().with_series("BBCA", daily_series(&closes, &vec![1_000; 100]))
    }

    fn simulator(store: &VecStore) -> InvestmentSimulator<'_> {
        InvestmentSimulator::new(store).with_today(day0() + Duration::days(200))
    }

    #[test]
    fn profitable_hold_on_rising_series() {
        let store = rising_store();
        let result = simulator(&store)
            .simulate(10_000_000.0, "bbca", day0(), None)
            .expect("simulation");

        assert_eq!(result.symbol.as_str(), "BBCA");
        assert_eq!(result.shares, 125.0);
        assert_eq!(result.purchase_price, 80_000.0);
        assert_eq!(result.valuation_price, 89_900.0);
        assert_eq!(result.days_held, 99);
        assert!(result.profit_loss > 0.0);
        assert!(result.profit_loss_pct > 0.0);
        assert!((result.invested_amount - 10_000_000.0).abs() < 1e-6);
        assert!((result.current_value - 125.0 * 89_900.0).abs() < 1e-6);
        assert!(result.annualized_return > result.profit_loss_pct);
    }

    #[test]
    fn shares_are_truncated_to_two_decimals() {
        let store = rising_store();
        let result = simulator(&store)
            .simulate(1_000_000.0 / 3.0 + 80_000.0, "BBCA", day0(), None)
            .expect("simulation");
        assert_eq!(result.shares, 5.16);
        assert!(result.invested_amount <= result.requested_amount);
    }

    #[test]
    fn start_on_non_trading_day_rolls_forward() {
        let points = daily_series(&[10.0, 11.0, 12.0], &[1, 1, 1])
            .into_iter()
            .map(|mut p| {
                p.date += Duration::days(2);
                p
            })
            .collect();
        let store = VecStore::default().with_series("ACME", points);
        let result = simulator(&store)
            .simulate(100.0, "ACME", day0(), None)
            .expect("simulation");
        assert_eq!(result.start_date, day0() + Duration::days(2));
        assert_eq!(result.purchase_price, 10.0);
    }

    #[test]
    fn end_date_picks_latest_point_on_or_before() {
        let store = rising_store();
        let result = simulator(&store)
            .simulate(
                10_000_000.0,
                "BBCA",
                day0(),
                Some(day0() + Duration::days(10)),
            )
            .expect("simulation");
        assert_eq!(result.end_date, day0() + Duration::days(10));
        assert_eq!(result.valuation_price, 81_000.0);
    }

    #[test]
    fn same_day_hold_has_zero_annualized_return() {
        let store = rising_store();
        let result = simulator(&store)
            .simulate(10_000_000.0, "BBCA", day0(), Some(day0()))
            .expect("simulation");
        assert_eq!(result.days_held, 0);
        assert_eq!(result.annualized_return, 0.0);
        assert_eq!(result.profit_loss, 0.0);
    }

    #[test]
    fn rejects_non_positive_amount() {
        let store = rising_store();
        let err = simulator(&store)
            .simulate(0.0, "BBCA", day0(), None)
            .expect_err("zero amount");
        assert!(err.is_invalid_argument());
        assert_eq!(err.to_string(), "amount must be greater than 0");
    }

    #[test]
    fn rejects_unknown_symbol() {
        let store = rising_store();
        let err = simulator(&store)
            .simulate(1_000.0, "NOPE", day0(), None)
            .expect_err("unknown symbol");
        assert!(err.is_not_found());
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn rejects_future_start() {
        let store = rising_store();
        let today = day0() + Duration::days(50);
        let err = InvestmentSimulator::new(&store)
            .with_today(today)
            .simulate(10_000_000.0, "BBCA", today + Duration::days(1), None)
            .expect_err("future start");
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn rejects_amount_below_one_share() {
        let store = rising_store();
        let err = simulator(&store)
            .simulate(1_000.0, "BBCA", day0(), None)
            .expect_err("too small");
        assert!(err.is_invalid_argument());
        assert!(err.to_string().contains("amount too small"));
        assert!(err.to_string().contains("80000"));
    }

    #[test]
    fn start_after_last_point_is_not_found() {
        let store = rising_store();
        let err = simulator(&store)
            .simulate(10_000_000.0, "BBCA", day0() + Duration::days(150), None)
            .expect_err("no data");
        assert!(err.is_not_found());
        assert!(err.to_string().starts_with("no price data from"));
    }

    #[test]
    fn compare_ranks_and_collects_failures() {
        let falling: Vec<f64> = (0..100).map(|i| 90_000.0 - 100.0 * i as f64).collect();
        let store = rising_store().with_series("DOWN", daily_series(&falling, &vec![1; 100]));
        let symbols = vec!["DOWN".to_string(), "BBCA".to_string(), "INVALID".to_string()];

        let comparison = simulator(&store)
            .with_parallelism(3)
            .compare_multiple(10_000_000.0, &symbols, day0(), None)
            .expect("comparison");

        assert_eq!(comparison.results.len(), 2);
        assert_eq!(comparison.results[0].symbol.as_str(), "BBCA");
        assert_eq!(comparison.results[1].symbol.as_str(), "DOWN");
        assert_eq!(comparison.errors.len(), 1);
        assert_eq!(comparison.errors[0].symbol, "INVALID");
        assert!(comparison.errors[0].message.contains("not found"));

        let best = comparison.summary.best_performer.expect("best");
        assert_eq!(best.symbol.as_str(), "BBCA");
        let worst = comparison.summary.worst_performer.expect("worst");
        assert_eq!(worst.symbol.as_str(), "DOWN");
    }

    #[test]
    fn compare_rejects_empty_and_oversized_lists() {
        let store = rising_store();
        let sim = simulator(&store);

        let err = sim
            .compare_multiple(1_000.0, &[], day0(), None)
            .expect_err("empty");
        assert!(err.is_invalid_argument());

        let six: Vec<String> = (0..6).map(|i| format!("S{i}")).collect();
        let err = sim
            .compare_multiple(1_000.0, &six, day0(), None)
            .expect_err("too many");
        assert!(err.is_invalid_argument());
        assert!(err.to_string().contains("Maximum 5"));
    }

    #[test]
    fn compare_reports_bad_amount_per_symbol() {
        let store = rising_store().with_series("DOWN", daily_series(&[100.0, 90.0], &[1, 1]));
        let symbols = vec!["BBCA".to_string(), "down".to_string()];

        let comparison = simulator(&store)
            .compare_multiple(0.0, &symbols, day0(), None)
            .expect("batch stays ok");

        assert!(comparison.results.is_empty());
        let failed: Vec<&str> = comparison.errors.iter().map(|e| e.symbol.as_str()).collect();
        assert_eq!(failed, vec!["BBCA", "DOWN"]);
        assert!(comparison
            .errors
            .iter()
            .all(|e| e.message == "amount must be greater than 0"));
        assert!(comparison.summary.best_performer.is_none());
        assert_eq!(comparison.summary.total_investment, 0.0);
    }

    #[test]
    fn fractional_amount_under_one_share_is_too_small() {
        let store = VecStore::default().with_series("ACME", daily_series(&[80.0], &[1]));
        let err = simulator(&store)
            .simulate(50.0, "ACME", day0(), None)
            .expect_err("below one share");
        assert!(err.is_invalid_argument());
        assert_eq!(err.to_string(), "amount too small; minimum required: 80");
    }

    #[test]
    fn truncation_rounds_toward_zero() {
        assert_eq!(truncate_shares(1.239), 1.23);
        assert_eq!(truncate_shares(0.009), 0.0);
        assert_eq!(truncate_shares(125.0), 125.0);
    }

    #[test]
    fn annualized_return_compounds_over_years() {
        let cagr = annualized_return(100.0, 121.0, 730);
        assert!((cagr - 10.0).abs() < 1e-9);
        assert_eq!(annualized_return(100.0, 150.0, 0), 0.0);
        assert_eq!(annualized_return(0.0, 150.0, 365), 0.0);
    }
}
