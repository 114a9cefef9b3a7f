use crate::entities::anomaly::{AnomalyFinding, AnomalyKind, Severity};
use crate::error::DomainError;
use crate::repositories::price_series::PriceSeriesStore;
use crate::services::statistics::z_score;
use crate::value_objects::instrument::Symbol;
use crate::value_objects::price_point::PricePoint;
use chrono::Utc;

mod returns;

pub use returns::pct_returns_newest_first;

pub const DEFAULT_ROLLING_WINDOW: usize = 30;
pub const DEFAULT_Z_SCORE_THRESHOLD: f64 = 2.0;

/// Fixed per deployment; passed in so tests can vary it per case.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectorConfig {
    pub rolling_window: usize,
    pub z_score_threshold: f64,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            rolling_window: DEFAULT_ROLLING_WINDOW,
            z_score_threshold: DEFAULT_Z_SCORE_THRESHOLD,
        }
    }
}

impl DetectorConfig {
    pub fn new(rolling_window: usize, z_score_threshold: f64) -> Result<Self, DomainError> {
        if rolling_window < 2 {
            return Err(DomainError::invalid("rolling_window must be >= 2"));
        }
        if !z_score_threshold.is_finite() || z_score_threshold <= 0.0 {
            return Err(DomainError::invalid(
                "z_score_threshold must be finite and > 0",
            ));
        }
        Ok(Self {
            rolling_window,
            z_score_threshold,
        })
    }
}

pub struct AnomalyDetector<'a> {
    store: &'a dyn PriceSeriesStore,
    config: DetectorConfig,
}

impl<'a> AnomalyDetector<'a> {
    pub fn new(store: &'a dyn PriceSeriesStore, config: DetectorConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> DetectorConfig {
        self.config
    }

    /// Flags the newest volume against the preceding window. Lookup failures are logged and
    /// reported as "no finding" so a watchlist scan keeps going.
    pub fn detect_volume_anomaly(&self, symbol: &Symbol) -> Option<AnomalyFinding> {
        self.try_detect_volume_anomaly(symbol)
            .unwrap_or_else(|err| log_skipped(symbol, AnomalyKind::VolumeSpike, &err))
    }

    pub fn detect_price_anomaly(&self, symbol: &Symbol) -> Option<AnomalyFinding> {
        self.try_detect_price_anomaly(symbol)
            .unwrap_or_else(|err| log_skipped(symbol, AnomalyKind::PriceJump, &err))
    }

    /// Both detectors for one instrument, volume first.
    pub fn scan(&self, symbol: &Symbol) -> Vec<AnomalyFinding> {
        self.try_scan(symbol).unwrap_or_else(|err| {
            tracing::warn!(symbol = %symbol, error = %err, "anomaly scan skipped");
            Vec::new()
        })
    }

    /// Like [`AnomalyDetector::scan`] but hands lookup and store failures back to the caller.
    pub fn try_scan(&self, symbol: &Symbol) -> Result<Vec<AnomalyFinding>, DomainError> {
        self.ensure_known(symbol)?;
        let window = self.load_window(symbol)?;
        Ok(self
            .volume_finding(symbol, &window)
            .into_iter()
            .chain(self.price_finding(symbol, &window))
            .collect())
    }

    pub fn try_detect_volume_anomaly(
        &self,
        symbol: &Symbol,
    ) -> Result<Option<AnomalyFinding>, DomainError> {
        self.ensure_known(symbol)?;
        let window = self.load_window(symbol)?;
        Ok(self.volume_finding(symbol, &window))
    }

    pub fn try_detect_price_anomaly(
        &self,
        symbol: &Symbol,
    ) -> Result<Option<AnomalyFinding>, DomainError> {
        self.ensure_known(symbol)?;
        let window = self.load_window(symbol)?;
        Ok(self.price_finding(symbol, &window))
    }

    fn ensure_known(&self, symbol: &Symbol) -> Result<(), DomainError> {
        match self.store.lookup(symbol)? {
            Some(_) => Ok(()),
            None => Err(DomainError::not_found(format!("stock not found: {symbol}"))),
        }
    }

    fn load_window(&self, symbol: &Symbol) -> Result<Vec<PricePoint>, DomainError> {
        self.store.latest_n(symbol, self.config.rolling_window + 1)
    }

    fn has_enough_history(&self, window: &[PricePoint]) -> bool {
        window.len() >= self.config.rolling_window
    }

    fn volume_finding(&self, symbol: &Symbol, window: &[PricePoint]) -> Option<AnomalyFinding> {
        if !self.has_enough_history(window) {
            return None;
        }
        let (latest, historical) = window.split_first()?;
        let baseline: Vec<f64> = historical.iter().map(|p| p.volume as f64).collect();
        let z = z_score(&baseline, latest.volume as f64);
        tracing::debug!(symbol = %symbol, volume = latest.volume, z_score = z, "volume z-score");

        if z.abs() < self.config.z_score_threshold {
            return None;
        }
        Some(AnomalyFinding {
            symbol: symbol.clone(),
            kind: AnomalyKind::VolumeSpike,
            severity: Severity::classify(z),
            z_score: z,
            observed_value: latest.volume as f64,
            observed_on: latest.date,
            message: format!(
                "Unusual trading volume for {symbol}: {} (z-score: {z:.2})",
                latest.volume
            ),
            detected_at: Utc::now(),
        })
    }

    fn price_finding(&self, symbol: &Symbol, window: &[PricePoint]) -> Option<AnomalyFinding> {
        if !self.has_enough_history(window) {
            return None;
        }
        let returns = pct_returns_newest_first(window);
        if returns.len() < 2 {
            return None;
        }
        let (latest_return, historical) = returns.split_first()?;
        let z = z_score(historical, *latest_return);
        tracing::debug!(symbol = %symbol, return_pct = latest_return, z_score = z, "return z-score");

        if z.abs() < self.config.z_score_threshold {
            return None;
        }
        Some(AnomalyFinding {
            symbol: symbol.clone(),
            kind: AnomalyKind::PriceJump,
            severity: Severity::classify(z),
            z_score: z,
            observed_value: *latest_return,
            observed_on: window[0].date,
            message: format!(
                "Unusual price movement for {symbol}: {latest_return:+.2}% (z-score: {z:.2})"
            ),
            detected_at: Utc::now(),
        })
    }
}

fn log_skipped(symbol: &Symbol, kind: AnomalyKind, err: &DomainError) -> Option<AnomalyFinding> {
    tracing::warn!(symbol = %symbol, kind = %kind, error = %err, "anomaly detection skipped");
    None
}
