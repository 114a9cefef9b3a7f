use crate::value_objects::instrument::Symbol;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyKind {
    VolumeSpike,
    PriceJump,
}

impl AnomalyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnomalyKind::VolumeSpike => "volume_spike",
            AnomalyKind::PriceJump => "price_jump",
        }
    }
}

impl fmt::Display for AnomalyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    pub const HIGH_FLOOR: f64 = 3.0;
    pub const MEDIUM_FLOOR: f64 = 2.5;

    /// Classifies `|z|`. Callers only classify values already past the detector threshold,
    /// so anything below the medium floor is `Low`.
    pub fn classify(z_score: f64) -> Self {
        let magnitude = z_score.abs();
        if magnitude >= Self::HIGH_FLOOR {
            Severity::High
        } else if magnitude >= Self::MEDIUM_FLOOR {
            Severity::Medium
        } else {
            Severity::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output of one detector invocation. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyFinding {
    pub symbol: Symbol,
    pub kind: AnomalyKind,
    pub severity: Severity,
    pub z_score: f64,
    /// Raw volume for volume spikes, day-over-day return (percent) for price jumps.
    pub observed_value: f64,
    pub observed_on: NaiveDate,
    pub message: String,
    pub detected_at: DateTime<Utc>,
}
