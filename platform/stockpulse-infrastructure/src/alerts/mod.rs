use chrono::{NaiveDate, SecondsFormat};
use parking_lot::Mutex;
use serde::Serialize;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;
use stockpulse_domain::entities::anomaly::AnomalyFinding;
use stockpulse_domain::repositories::alerts::AlertSink;
use stockpulse_domain::DomainError;

fn record_write_metrics(sink: &'static str, start: Instant, ok: bool) {
    let result_label = if ok { "ok" } else { "err" };
    metrics::counter!(
        "stockpulse.infra.alerts.write.calls_total",
        "sink" => sink,
        "result" => result_label
    )
    .increment(1);
    metrics::histogram!("stockpulse.infra.alerts.write_ms", "sink" => sink, "result" => result_label)
        .record(start.elapsed().as_secs_f64() * 1000.0);
}

/// One line of the alert log.
#[derive(Debug, Serialize)]
struct AlertLine<'a> {
    symbol: &'a str,
    kind: &'static str,
    severity: &'static str,
    z_score: f64,
    observed_value: f64,
    observed_on: NaiveDate,
    message: &'a str,
    detected_at: String,
}

impl<'a> From<&'a AnomalyFinding> for AlertLine<'a> {
    fn from(finding: &'a AnomalyFinding) -> Self {
        Self {
            symbol: finding.symbol.as_str(),
            kind: finding.kind.as_str(),
            severity: finding.severity.as_str(),
            z_score: finding.z_score,
            observed_value: finding.observed_value,
            observed_on: finding.observed_on,
            message: &finding.message,
            detected_at: finding
                .detected_at
                .to_rfc3339_opts(SecondsFormat::Secs, true),
        }
    }
}

/// Appends one JSON object per finding. Safe to share across scan workers.
pub struct JsonlAlertSink {
    path: PathBuf,
    writer: Mutex<BufWriter<File>>,
}

impl JsonlAlertSink {
    pub fn open(path: &Path) -> Result<Self, String> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|err| format!("failed to create dir {}: {}", parent.display(), err))?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|err| format!("failed to open alert log {}: {}", path.display(), err))?;
        Ok(Self {
            path: path.to_path_buf(),
            writer: Mutex::new(BufWriter::new(file)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl AlertSink for JsonlAlertSink {
    fn record(&self, finding: &AnomalyFinding) -> Result<(), DomainError> {
        let start = Instant::now();
        let line = serde_json::to_string(&AlertLine::from(finding))
            .map_err(|err| DomainError::Store(format!("failed to encode alert: {err}")))?;
        let result = {
            let mut writer = self.writer.lock();
            writeln!(writer, "{line}").and_then(|_| writer.flush())
        };
        record_write_metrics("jsonl", start, result.is_ok());
        result.map_err(|err| {
            DomainError::Store(format!(
                "failed to append alert to {}: {}",
                self.path.display(),
                err
            ))
        })
    }
}

/// Emits findings as structured log events.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogAlertSink;

impl AlertSink for LogAlertSink {
    fn record(&self, finding: &AnomalyFinding) -> Result<(), DomainError> {
        tracing::warn!(
            symbol = %finding.symbol,
            kind = finding.kind.as_str(),
            severity = finding.severity.as_str(),
            z_score = finding.z_score,
            observed_on = %finding.observed_on,
            "{}",
            finding.message
        );
        Ok(())
    }
}

/// Keeps findings in memory; used by tests and dry runs.
#[derive(Debug, Default)]
pub struct RecordingAlertSink {
    findings: Mutex<Vec<AnomalyFinding>>,
}

impl RecordingAlertSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn findings(&self) -> Vec<AnomalyFinding> {
        self.findings.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.findings.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.findings.lock().is_empty()
    }
}

impl AlertSink for RecordingAlertSink {
    fn record(&self, finding: &AnomalyFinding) -> Result<(), DomainError> {
        self.findings.lock().push(finding.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{JsonlAlertSink, LogAlertSink, RecordingAlertSink};
    use chrono::{NaiveDate, TimeZone, Utc};
    use std::fs;
    use stockpulse_domain::entities::anomaly::{AnomalyFinding, AnomalyKind, Severity};
    use stockpulse_domain::repositories::alerts::AlertSink;
    use stockpulse_domain::value_objects::instrument::Symbol;

    fn finding(symbol: &str, z: f64) -> AnomalyFinding {
        AnomalyFinding {
            symbol: Symbol::parse(symbol).expect("symbol"),
            kind: AnomalyKind::VolumeSpike,
            severity: Severity::classify(z),
            z_score: z,
            observed_value: 5_000.0,
            observed_on: NaiveDate::from_ymd_opt(2024, 2, 1).expect("date"),
            message: format!("Unusual trading volume for {symbol}: 5000 (z-score: {z:.2})"),
            detected_at: Utc.with_ymd_and_hms(2024, 2, 1, 9, 30, 0).unwrap(),
        }
    }

    #[test]
    fn jsonl_sink_appends_one_line_per_finding() {
        let dir = std::env::temp_dir().join(format!(
            "stockpulse_alerts_{}_{}",
            std::process::id(),
            Utc::now().timestamp_nanos_opt().unwrap_or_default()
        ));
        let path = dir.join("nested").join("alerts.jsonl");

        {
            let sink = JsonlAlertSink::open(&path).expect("open sink");
            sink.record(&finding("BBCA", 3.4)).expect("record");
        }
        {
            let sink = JsonlAlertSink::open(&path).expect("reopen sink");
            sink.record(&finding("TLKM", 2.6)).expect("record");
        }

        let contents = fs::read_to_string(&path).expect("read log");
        let lines: Vec<serde_json::Value> = contents
            .lines()
            .map(|line| serde_json::from_str(line).expect("json line"))
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["symbol"], "BBCA");
        assert_eq!(lines[0]["kind"], "volume_spike");
        assert_eq!(lines[0]["severity"], "high");
        assert_eq!(lines[0]["detected_at"], "2024-02-01T09:30:00Z");
        assert_eq!(lines[1]["severity"], "medium");
        assert_eq!(lines[1]["observed_on"], "2024-02-01");

        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn recording_sink_keeps_order() {
        let sink = RecordingAlertSink::new();
        assert!(sink.is_empty());
        sink.record(&finding("AAA", 2.1)).expect("record");
        sink.record(&finding("BBB", 2.2)).expect("record");
        let symbols: Vec<String> = sink
            .findings()
            .iter()
            .map(|f| f.symbol.to_string())
            .collect();
        assert_eq!(symbols, vec!["AAA", "BBB"]);
        assert_eq!(sink.len(), 2);
    }

    #[test]
    fn log_sink_never_fails() {
        assert!(LogAlertSink.record(&finding("AAA", 4.0)).is_ok());
    }
}
