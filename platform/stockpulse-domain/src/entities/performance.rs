use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One day of a fixed-share holding's value curve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformancePoint {
    pub date: NaiveDate,
    pub price: f64,
    pub value: f64,
    pub profit_loss: f64,
    pub profit_loss_pct: f64,
}
