use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use stockpulse_domain::services::anomaly::{
    DetectorConfig, DEFAULT_ROLLING_WINDOW, DEFAULT_Z_SCORE_THRESHOLD,
};
use stockpulse_domain::services::fanout::normalize_parallelism;
use stockpulse_domain::value_objects::instrument::Symbol;

pub const DEFAULT_SCAN_PARALLELISM: usize = 4;

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AlertsKind {
    Jsonl,
    Log,
    None,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub store: StoreConfig,
    pub detector: Option<DetectorSection>,
    pub scan: Option<ScanConfig>,
    pub alerts: Option<AlertsConfig>,
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct StoreConfig {
    /// Directory holding one `<SYMBOL>.csv` per instrument.
    pub data_dir: String,
    /// Optional `symbol,name,exchange,sector` metadata file.
    pub instruments_csv: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct DetectorSection {
    pub rolling_window: Option<usize>,
    pub z_score_threshold: Option<f64>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct ScanConfig {
    pub parallelism: Option<usize>,
    pub record_alerts: Option<bool>,
    #[serde(default)]
    pub watchlist: Vec<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct AlertsConfig {
    pub kind: AlertsKind,
    pub path: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    pub level: Option<String>,
    pub format: Option<LogFormat>,
}

impl Config {
    pub fn detector_config(&self) -> Result<DetectorConfig, String> {
        let section = self.detector.as_ref();
        let rolling_window = section
            .and_then(|d| d.rolling_window)
            .unwrap_or(DEFAULT_ROLLING_WINDOW);
        let z_score_threshold = section
            .and_then(|d| d.z_score_threshold)
            .unwrap_or(DEFAULT_Z_SCORE_THRESHOLD);
        DetectorConfig::new(rolling_window, z_score_threshold)
            .map_err(|err| format!("invalid [detector] config: {err}"))
    }

    pub fn scan_parallelism(&self) -> usize {
        normalize_parallelism(Some(
            self.scan
                .as_ref()
                .and_then(|scan| scan.parallelism)
                .unwrap_or(DEFAULT_SCAN_PARALLELISM),
        ))
    }

    pub fn record_alerts(&self) -> bool {
        self.scan
            .as_ref()
            .and_then(|scan| scan.record_alerts)
            .unwrap_or(true)
    }

    pub fn alerts_kind(&self) -> AlertsKind {
        self.alerts
            .as_ref()
            .map(|alerts| alerts.kind)
            .unwrap_or(AlertsKind::Log)
    }

    pub fn watchlist(&self) -> Result<Vec<Symbol>, String> {
        let raw = self
            .scan
            .as_ref()
            .map(|scan| scan.watchlist.as_slice())
            .unwrap_or(&[]);
        let mut symbols: Vec<Symbol> = Vec::with_capacity(raw.len());
        for value in raw {
            let symbol = Symbol::parse(value)
                .map_err(|err| format!("invalid watchlist entry '{value}': {err}"))?;
            if !symbols.contains(&symbol) {
                symbols.push(symbol);
            }
        }
        Ok(symbols)
    }

    pub fn log_level(&self) -> &str {
        self.logging
            .as_ref()
            .and_then(|logging| logging.level.as_deref())
            .unwrap_or("info")
    }

    pub fn log_format(&self) -> LogFormat {
        self.logging
            .as_ref()
            .and_then(|logging| logging.format)
            .unwrap_or(LogFormat::Text)
    }

    /// Cross-field checks that serde cannot express.
    pub fn validate(&self) -> Result<(), String> {
        if self.store.data_dir.trim().is_empty() {
            return Err("store.data_dir must not be empty".to_string());
        }
        self.detector_config()?;
        self.watchlist()?;
        if let Some(alerts) = &self.alerts {
            if alerts.kind == AlertsKind::Jsonl
                && alerts.path.as_deref().map_or(true, |p| p.trim().is_empty())
            {
                return Err("alerts.path is required when alerts.kind = \"jsonl\"".to_string());
            }
        }
        Ok(())
    }
}

pub fn load_config(path: &Path) -> Result<Config, String> {
    let (config, _source) = load_config_with_source(path)?;
    Ok(config)
}

pub fn load_config_with_source(path: &Path) -> Result<(Config, String), String> {
    let contents = fs::read_to_string(path)
        .map_err(|err| format!("failed to read config {}: {}", path.display(), err))?;
    let config: Config = toml::from_str(&contents)
        .map_err(|err| format!("failed to parse TOML {}: {}", path.display(), err))?;
    config.validate()?;
    Ok((config, contents))
}

pub fn to_toml_pretty(config: &Config) -> Result<String, String> {
    toml::to_string_pretty(config)
        .map_err(|err| format!("failed to serialize config as TOML: {err}"))
}
