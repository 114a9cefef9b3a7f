use std::path::{Path, PathBuf};
use stockpulse_application::config::{AlertsKind, Config};
use stockpulse_domain::repositories::alerts::AlertSink;
use stockpulse_infrastructure::alerts::{JsonlAlertSink, LogAlertSink};
use stockpulse_infrastructure::market_data::CsvPriceStore;

/// Relative paths in the config resolve against the config file's directory.
pub fn resolve_path(config_path: &Path, raw: &str) -> PathBuf {
    let path = PathBuf::from(raw);
    if path.is_absolute() {
        return path;
    }
    config_path
        .parent()
        .map(|base| base.join(&path))
        .unwrap_or(path)
}

pub fn build_price_store(config: &Config, config_path: &Path) -> Result<CsvPriceStore, String> {
    let data_dir = resolve_path(config_path, &config.store.data_dir);
    let instruments = config
        .store
        .instruments_csv
        .as_deref()
        .map(|raw| resolve_path(config_path, raw));
    CsvPriceStore::open(&data_dir, instruments.as_deref())
}

pub fn build_alert_sink(
    config: &Config,
    config_path: &Path,
) -> Result<Option<Box<dyn AlertSink>>, String> {
    match config.alerts_kind() {
        AlertsKind::None => Ok(None),
        AlertsKind::Log => Ok(Some(Box::new(LogAlertSink))),
        AlertsKind::Jsonl => {
            let raw = config
                .alerts
                .as_ref()
                .and_then(|alerts| alerts.path.as_deref())
                .ok_or_else(|| "alerts.path is required for the jsonl sink".to_string())?;
            let sink = JsonlAlertSink::open(&resolve_path(config_path, raw))?;
            Ok(Some(Box::new(sink)))
        }
    }
}
