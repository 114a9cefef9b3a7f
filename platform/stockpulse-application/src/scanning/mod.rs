use serde::Serialize;
use std::time::Instant;
use stockpulse_domain::entities::anomaly::AnomalyFinding;
use stockpulse_domain::repositories::alerts::AlertSink;
use stockpulse_domain::repositories::price_series::PriceSeriesStore;
use stockpulse_domain::services::anomaly::{AnomalyDetector, DetectorConfig};
use stockpulse_domain::services::fanout::fan_out;
use stockpulse_domain::value_objects::instrument::Symbol;
use tracing::info_span;

#[derive(Debug, Clone, Copy)]
pub struct ScanOptions {
    pub detector: DetectorConfig,
    pub parallelism: usize,
    pub record_alerts: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            detector: DetectorConfig::default(),
            parallelism: 1,
            record_alerts: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanFailure {
    pub symbol: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ScanReport {
    pub scanned: usize,
    /// Watchlist order; volume spike before price jump within one symbol.
    pub findings: Vec<AnomalyFinding>,
    pub failures: Vec<ScanFailure>,
    pub alerts_recorded: usize,
    pub alerts_failed: usize,
}

impl ScanReport {
    pub fn is_quiet(&self) -> bool {
        self.findings.is_empty()
    }
}

/// Runs both detectors over every symbol on a bounded worker pool.
///
/// A symbol that cannot be scanned lands in `failures`; the rest of the watchlist still runs.
/// Findings are handed to `sink` (when given and `record_alerts` is set) after the fan-out.
pub fn scan_watchlist(
    symbols: &[Symbol],
    options: &ScanOptions,
    store: &dyn PriceSeriesStore,
    sink: Option<&dyn AlertSink>,
) -> Result<ScanReport, String> {
    if symbols.is_empty() {
        return Err("watchlist is empty; nothing to scan".to_string());
    }

    let _span = info_span!(
        "scan_watchlist",
        instruments = symbols.len(),
        rolling_window = options.detector.rolling_window,
        threshold = options.detector.z_score_threshold
    )
    .entered();
    let stage_start = Instant::now();

    let detector = AnomalyDetector::new(store, options.detector);
    let outcomes = fan_out(symbols, options.parallelism, |symbol| {
        detector.try_scan(symbol)
    });

    let mut report = ScanReport {
        scanned: symbols.len(),
        ..ScanReport::default()
    };
    for (symbol, outcome) in symbols.iter().zip(outcomes) {
        match outcome {
            Ok(findings) => {
                for finding in &findings {
                    tracing::info!(
                        symbol = %finding.symbol,
                        kind = %finding.kind,
                        severity = %finding.severity,
                        z_score = finding.z_score,
                        "anomaly detected"
                    );
                }
                report.findings.extend(findings);
            }
            Err(err) => {
                tracing::warn!(symbol = %symbol, error = %err, "instrument scan failed");
                report.failures.push(ScanFailure {
                    symbol: symbol.to_string(),
                    message: err.to_string(),
                });
            }
        }
    }

    if options.record_alerts {
        if let Some(sink) = sink {
            for finding in &report.findings {
                match sink.record(finding) {
                    Ok(()) => report.alerts_recorded += 1,
                    Err(err) => {
                        report.alerts_failed += 1;
                        tracing::warn!(
                            symbol = %finding.symbol,
                            kind = %finding.kind,
                            error = %err,
                            "failed to record alert"
                        );
                    }
                }
            }
        }
    }

    metrics::counter!("stockpulse.scan.instruments").increment(report.scanned as u64);
    metrics::counter!("stockpulse.scan.findings").increment(report.findings.len() as u64);
    metrics::counter!("stockpulse.scan.failures").increment(report.failures.len() as u64);
    metrics::counter!("stockpulse.alerts.recorded").increment(report.alerts_recorded as u64);
    metrics::counter!("stockpulse.alerts.failed").increment(report.alerts_failed as u64);
    metrics::histogram!("stockpulse.scan.duration_ms")
        .record(stage_start.elapsed().as_millis() as f64);

    Ok(report)
}
