use crate::value_objects::instrument::Symbol;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Point-in-time buy-and-hold outcome for one symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    pub symbol: Symbol,
    pub requested_amount: f64,
    /// `shares * purchase_price`; at most `requested_amount` because shares are truncated.
    pub invested_amount: f64,
    /// First trading day on or after the requested start date.
    pub start_date: NaiveDate,
    pub purchase_price: f64,
    pub end_date: NaiveDate,
    pub valuation_price: f64,
    /// `amount / purchase_price` truncated to two decimals; never below one whole share.
    pub shares: f64,
    pub current_value: f64,
    pub profit_loss: f64,
    pub profit_loss_pct: f64,
    pub days_held: i64,
    pub annualized_return: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Performer {
    pub symbol: Symbol,
    pub profit_loss_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonSummary {
    pub total_investment: f64,
    pub total_current_value: f64,
    pub total_profit_loss: f64,
    pub total_profit_loss_pct: f64,
    /// Unweighted mean of each result's `profit_loss_pct`.
    pub average_return_pct: f64,
    pub best_performer: Option<Performer>,
    pub worst_performer: Option<Performer>,
}

/// A symbol that could not be simulated inside a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolFailure {
    pub symbol: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonResult {
    /// Ranked by `profit_loss_pct`, descending.
    pub results: Vec<SimulationResult>,
    pub summary: ComparisonSummary,
    pub errors: Vec<SymbolFailure>,
}

impl ComparisonSummary {
    /// Expects `ranked` already sorted best-first.
    pub fn from_ranked(ranked: &[SimulationResult]) -> Self {
        let total_investment: f64 = ranked.iter().map(|r| r.invested_amount).sum();
        let total_current_value: f64 = ranked.iter().map(|r| r.current_value).sum();
        let total_profit_loss = total_current_value - total_investment;
        let total_profit_loss_pct = if total_investment > 0.0 {
            total_profit_loss / total_investment * 100.0
        } else {
            0.0
        };
        let average_return_pct = if ranked.is_empty() {
            0.0
        } else {
            ranked.iter().map(|r| r.profit_loss_pct).sum::<f64>() / ranked.len() as f64
        };

        let performer = |r: &SimulationResult| Performer {
            symbol: r.symbol.clone(),
            profit_loss_pct: r.profit_loss_pct,
        };

        Self {
            total_investment,
            total_current_value,
            total_profit_loss,
            total_profit_loss_pct,
            average_return_pct,
            best_performer: ranked.first().map(performer),
            worst_performer: ranked.last().map(performer),
        }
    }
}
